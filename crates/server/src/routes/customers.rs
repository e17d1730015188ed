use axum::{extract::{Path, Query, State}, Extension, Json};

use common::types::{ApiResponse, Page};
use service::{context::Operator, customer_service::{self, CustomerInput, CustomerQuery, CustomerView}};

use super::{auth::ServerState, ApiResult};

#[utoipa::path(
    get, path = "/api/v1/customers", tag = "customers",
    params(
        ("search" = Option<String>, Query, description = "name, email, internal id or company"),
        ("status" = Option<String>, Query, description = "active, inactive or pending"),
        ("label" = Option<String>, Query, description = "label"),
        ("sort_by" = Option<String>, Query, description = "sort column"),
        ("sort_order" = Option<String>, Query, description = "asc or desc"),
    ),
    responses((status = 200, description = "Page of customers"))
)]
pub async fn list(State(state): State<ServerState>, Query(q): Query<CustomerQuery>) -> ApiResult<Page<CustomerView>> {
    Ok(Json(ApiResponse::success(customer_service::list(&state.db, &q).await?)))
}

#[utoipa::path(
    get, path = "/api/v1/customers/{customer_internal_id}", tag = "customers",
    params(("customer_internal_id" = String, Path, description = "cus_yyyyMMdd_NNN")),
    responses((status = 200, description = "Customer"), (status = 404, description = "Not Found"))
)]
pub async fn get(State(state): State<ServerState>, Path(id): Path<String>) -> ApiResult<CustomerView> {
    Ok(Json(ApiResponse::success(customer_service::get(&state.db, &id).await?)))
}

#[utoipa::path(
    post, path = "/api/v1/customers", tag = "customers",
    request_body = crate::openapi::CustomerRequest,
    responses((status = 200, description = "Created"), (status = 400, description = "Validation Error"), (status = 409, description = "Conflict"))
)]
pub async fn create(State(state): State<ServerState>, Extension(op): Extension<Operator>, Json(input): Json<CustomerInput>) -> ApiResult<CustomerView> {
    let created = customer_service::create(&state.db, &op, input).await?;
    Ok(Json(ApiResponse::with_message("客户创建成功", created)))
}

#[utoipa::path(
    put, path = "/api/v1/customers/{customer_internal_id}", tag = "customers",
    params(("customer_internal_id" = String, Path, description = "cus_yyyyMMdd_NNN")),
    request_body = crate::openapi::CustomerRequest,
    responses((status = 200, description = "Updated"), (status = 404, description = "Not Found"))
)]
pub async fn update(
    State(state): State<ServerState>,
    Extension(op): Extension<Operator>,
    Path(id): Path<String>,
    Json(input): Json<CustomerInput>,
) -> ApiResult<CustomerView> {
    let updated = customer_service::update(&state.db, &op, &id, input).await?;
    Ok(Json(ApiResponse::with_message("客户更新成功", updated)))
}
