use axum::{extract::{Path, Query, State}, Extension, Json};

use common::types::{ApiResponse, Page};
use service::{context::Operator, payer_service::{self, PayerInput, PayerQuery, PayerView}};

use super::{auth::ServerState, ApiResult};

#[utoipa::path(
    get, path = "/api/v1/payers", tag = "payers",
    params(
        ("page" = Option<u32>, Query, description = "1-based page"),
        ("page_size" = Option<u32>, Query, description = "1..=100"),
        ("search" = Option<String>, Query, description = "name, payer id, internal id or contact email"),
        ("label" = Option<String>, Query, description = "label of a linked account"),
        ("sort_by" = Option<String>, Query, description = "created_at, payer_name or payer_id"),
        ("sort_order" = Option<String>, Query, description = "asc or desc"),
    ),
    responses((status = 200, description = "Page of payers"))
)]
pub async fn list(State(state): State<ServerState>, Query(q): Query<PayerQuery>) -> ApiResult<Page<PayerView>> {
    Ok(Json(ApiResponse::success(payer_service::list(&state.db, &q).await?)))
}

#[utoipa::path(
    get, path = "/api/v1/payers/{payer_internal_id}", tag = "payers",
    params(("payer_internal_id" = String, Path, description = "payer_yyyyMMdd_NNN")),
    responses((status = 200, description = "Payer"), (status = 404, description = "Not Found"))
)]
pub async fn get(State(state): State<ServerState>, Path(payer_internal_id): Path<String>) -> ApiResult<PayerView> {
    Ok(Json(ApiResponse::success(payer_service::get(&state.db, &payer_internal_id).await?)))
}

#[utoipa::path(
    post, path = "/api/v1/payers", tag = "payers",
    request_body = crate::openapi::PayerRequest,
    responses((status = 200, description = "Created"), (status = 400, description = "Validation Error"), (status = 409, description = "Conflict"))
)]
pub async fn create(State(state): State<ServerState>, Extension(op): Extension<Operator>, Json(input): Json<PayerInput>) -> ApiResult<PayerView> {
    let created = payer_service::create(&state.db, &op, input).await?;
    Ok(Json(ApiResponse::with_message("Payer 创建成功", created)))
}

#[utoipa::path(
    put, path = "/api/v1/payers/{payer_internal_id}", tag = "payers",
    params(("payer_internal_id" = String, Path, description = "payer_yyyyMMdd_NNN")),
    request_body = crate::openapi::PayerRequest,
    responses((status = 200, description = "Updated"), (status = 404, description = "Not Found"))
)]
pub async fn update(
    State(state): State<ServerState>,
    Extension(op): Extension<Operator>,
    Path(payer_internal_id): Path<String>,
    Json(input): Json<PayerInput>,
) -> ApiResult<PayerView> {
    let updated = payer_service::update(&state.db, &op, &payer_internal_id, input).await?;
    Ok(Json(ApiResponse::with_message("Payer 更新成功", updated)))
}
