use axum::{extract::{Query, State}, Json};

use common::types::{ApiResponse, Page};
use models::operation_log;
use service::operation_log_service::{self, OperationLogQuery};

use super::{auth::ServerState, ApiResult};

#[utoipa::path(
    get, path = "/api/v1/operation-logs", tag = "operation-logs",
    params(
        ("operator" = Option<String>, Query, description = "operator email or name"),
        ("target_type" = Option<String>, Query, description = "entity kind"),
        ("action" = Option<String>, Query, description = "CREATE, UPDATE or DELETE"),
        ("search" = Option<String>, Query, description = "description contains"),
        ("sort_order" = Option<String>, Query, description = "asc or desc"),
    ),
    responses((status = 200, description = "Page of operation logs"))
)]
pub async fn list(State(state): State<ServerState>, Query(q): Query<OperationLogQuery>) -> ApiResult<Page<operation_log::Model>> {
    Ok(Json(ApiResponse::success(operation_log_service::list(&state.db, &q).await?)))
}
