use axum::{extract::{Path, Query, State}, Extension, Json};

use common::types::{ApiResponse, Page};
use service::{context::Operator, email_service::{self, EmailInput, EmailQuery, EmailView}};

use super::{auth::ServerState, ApiResult};

#[utoipa::path(
    get, path = "/api/v1/emails", tag = "emails",
    params(
        ("search" = Option<String>, Query, description = "address, internal id, source or remarks"),
        ("category" = Option<String>, Query, description = "normal, primary or secondary"),
        ("status" = Option<String>, Query, description = "mailbox status"),
        ("label" = Option<String>, Query, description = "label"),
        ("sort_by" = Option<String>, Query, description = "sort column"),
        ("sort_order" = Option<String>, Query, description = "asc or desc"),
    ),
    responses((status = 200, description = "Page of mailboxes"))
)]
pub async fn list(State(state): State<ServerState>, Query(q): Query<EmailQuery>) -> ApiResult<Page<EmailView>> {
    Ok(Json(ApiResponse::success(email_service::list(&state.db, &q).await?)))
}

#[utoipa::path(
    get, path = "/api/v1/emails/{email_internal_id}", tag = "emails",
    params(("email_internal_id" = String, Path, description = "email_yyyyMMdd_NNN")),
    responses((status = 200, description = "Mailbox"), (status = 404, description = "Not Found"))
)]
pub async fn get(State(state): State<ServerState>, Path(id): Path<String>) -> ApiResult<EmailView> {
    Ok(Json(ApiResponse::success(email_service::get(&state.db, &id).await?)))
}

#[utoipa::path(
    post, path = "/api/v1/emails", tag = "emails",
    request_body = crate::openapi::EmailRequest,
    responses((status = 200, description = "Created"), (status = 400, description = "Validation Error"), (status = 409, description = "Conflict"))
)]
pub async fn create(State(state): State<ServerState>, Extension(op): Extension<Operator>, Json(input): Json<EmailInput>) -> ApiResult<EmailView> {
    let created = email_service::create(&state.db, &op, input).await?;
    Ok(Json(ApiResponse::with_message("邮箱创建成功", created)))
}

#[utoipa::path(
    put, path = "/api/v1/emails/{email_internal_id}", tag = "emails",
    params(("email_internal_id" = String, Path, description = "email_yyyyMMdd_NNN")),
    request_body = crate::openapi::EmailRequest,
    responses((status = 200, description = "Updated"), (status = 404, description = "Not Found"))
)]
pub async fn update(
    State(state): State<ServerState>,
    Extension(op): Extension<Operator>,
    Path(id): Path<String>,
    Json(input): Json<EmailInput>,
) -> ApiResult<EmailView> {
    let updated = email_service::update(&state.db, &op, &id, input).await?;
    Ok(Json(ApiResponse::with_message("邮箱更新成功", updated)))
}
