use axum::{extract::{Path, Query, State}, Extension, Json};
use serde::Serialize;
use uuid::Uuid;

use common::types::{ApiResponse, Page};
use service::context::Operator;
use service::invoice::{self, DeleteInvoices, InvoiceInput, InvoiceQuery, InvoiceView};

use super::{auth::ServerState, ApiResult};

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub deleted: u64,
}

#[utoipa::path(
    get, path = "/api/v1/invoices", tag = "invoices",
    params(
        ("search" = Option<String>, Query, description = "invoice number or customer name"),
        ("status" = Option<String>, Query, description = "DRAFT, POSTED or PAID"),
        ("sort_by" = Option<String>, Query, description = "sort column"),
        ("sort_order" = Option<String>, Query, description = "asc or desc"),
    ),
    responses((status = 200, description = "Page of invoices"))
)]
pub async fn list(State(state): State<ServerState>, Query(q): Query<InvoiceQuery>) -> ApiResult<Page<InvoiceView>> {
    Ok(Json(ApiResponse::success(invoice::list(&state.db, &q).await?)))
}

#[utoipa::path(
    get, path = "/api/v1/invoices/{id}", tag = "invoices",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    responses((status = 200, description = "Invoice with items"), (status = 404, description = "Not Found"))
)]
pub async fn get(State(state): State<ServerState>, Path(id): Path<Uuid>) -> ApiResult<InvoiceView> {
    Ok(Json(ApiResponse::success(invoice::get(&state.db, id).await?)))
}

#[utoipa::path(
    post, path = "/api/v1/invoices", tag = "invoices",
    request_body = crate::openapi::InvoiceRequest,
    responses((status = 200, description = "Created"), (status = 400, description = "Validation Error"), (status = 404, description = "Bill not found"))
)]
pub async fn create(State(state): State<ServerState>, Extension(op): Extension<Operator>, Json(input): Json<InvoiceInput>) -> ApiResult<InvoiceView> {
    let created = invoice::create(&state.db, &op, input).await?;
    Ok(Json(ApiResponse::with_message("发票创建成功", created)))
}

#[utoipa::path(
    put, path = "/api/v1/invoices/{id}", tag = "invoices",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    request_body = crate::openapi::InvoiceRequest,
    responses((status = 200, description = "Updated"), (status = 404, description = "Not Found"))
)]
pub async fn update(
    State(state): State<ServerState>,
    Extension(op): Extension<Operator>,
    Path(id): Path<Uuid>,
    Json(input): Json<InvoiceInput>,
) -> ApiResult<InvoiceView> {
    let updated = invoice::update(&state.db, &op, id, input).await?;
    Ok(Json(ApiResponse::with_message("发票更新成功", updated)))
}

#[utoipa::path(
    delete, path = "/api/v1/invoices", tag = "invoices",
    request_body = crate::openapi::DeleteInvoicesRequest,
    responses((status = 200, description = "Deleted"), (status = 400, description = "Empty ids"))
)]
pub async fn delete(State(state): State<ServerState>, Extension(op): Extension<Operator>, Json(input): Json<DeleteInvoices>) -> ApiResult<Deleted> {
    let deleted = invoice::delete(&state.db, &op, &input.ids).await?;
    Ok(Json(ApiResponse::with_message("发票删除成功", Deleted { deleted })))
}

#[utoipa::path(
    post, path = "/api/v1/invoices/{id}/post", tag = "invoices",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    responses((status = 200, description = "Posted"), (status = 404, description = "Not Found"), (status = 409, description = "Not a draft"))
)]
pub async fn post(State(state): State<ServerState>, Extension(op): Extension<Operator>, Path(id): Path<Uuid>) -> ApiResult<InvoiceView> {
    let posted = invoice::post(&state.db, &op, id).await?;
    Ok(Json(ApiResponse::with_message("发票已过账", posted)))
}
