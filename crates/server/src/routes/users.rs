use axum::{extract::State, Json};
use tracing::info;

use common::types::ApiResponse;
use service::{auth::domain::AuthUser, user_service::{self, CreateUserInput}};

use super::{auth::ServerState, ApiResult};

#[utoipa::path(get, path = "/api/v1/users", tag = "users", responses((status = 200, description = "All users")))]
pub async fn list(State(state): State<ServerState>) -> ApiResult<Vec<AuthUser>> {
    let users = user_service::list_users(&state.db).await?;
    Ok(Json(ApiResponse::success(users)))
}

#[utoipa::path(
    post, path = "/api/v1/users", tag = "users",
    request_body = crate::openapi::CreateUserRequest,
    responses((status = 200, description = "Created"), (status = 400, description = "Validation Error"))
)]
pub async fn create(State(state): State<ServerState>, Json(input): Json<CreateUserInput>) -> ApiResult<AuthUser> {
    let user = user_service::create_user(&state.db, input).await?;
    info!(user_id = %user.id, email = %user.email, "user created");
    Ok(Json(ApiResponse::with_message("用户创建成功", user)))
}
