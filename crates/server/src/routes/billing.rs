//! Customer monthly bills and their per-customer invoice view.

use axum::{extract::{Path, Query, State}, Json};
use uuid::Uuid;

use common::types::{ApiResponse, Page};
use models::customer_monthly_bill as bill;
use service::billing::{
    customer_invoice::{self, CustomerInvoice, CustomerInvoiceQuery},
    monthly_bill_service::{self, BillQuery, BillRow, BillUpdate},
};

use super::{auth::ServerState, ApiResult};

#[utoipa::path(
    get, path = "/api/v1/customer-monthly-bills", tag = "billing",
    params(
        ("page" = Option<u32>, Query, description = "1-based page"),
        ("page_size" = Option<u32>, Query, description = "1..=100"),
        ("customer_name" = Option<String>, Query, description = "customer name contains"),
        ("linked_account_uid" = Option<String>, Query, description = "account uid contains"),
        ("month" = Option<String>, Query, description = "yyyy-MM, defaults to the current month"),
        ("sort_order" = Option<String>, Query, description = "by total bill, asc or desc"),
    ),
    responses((status = 200, description = "Page of bills"), (status = 400, description = "Invalid month"))
)]
pub async fn list_bills(State(state): State<ServerState>, Query(q): Query<BillQuery>) -> ApiResult<Page<BillRow>> {
    Ok(Json(ApiResponse::success(monthly_bill_service::list(&state.db, &q).await?)))
}

#[utoipa::path(
    put, path = "/api/v1/customer-monthly-bills/{id}", tag = "billing",
    params(("id" = Uuid, Path, description = "Bill ID")),
    request_body = crate::openapi::BillUpdateRequest,
    responses((status = 200, description = "Updated"), (status = 404, description = "Not Found"))
)]
pub async fn update_bill(State(state): State<ServerState>, Path(id): Path<Uuid>, Json(input): Json<BillUpdate>) -> ApiResult<bill::Model> {
    let updated = monthly_bill_service::update(&state.db, id, input).await?;
    Ok(Json(ApiResponse::with_message("账单更新成功", updated)))
}

#[utoipa::path(
    get, path = "/api/v1/customer-invoices", tag = "billing",
    params(
        ("page" = Option<u32>, Query, description = "1-based page"),
        ("page_size" = Option<u32>, Query, description = "1..=100"),
        ("customer_name" = Option<String>, Query, description = "customer name contains"),
        ("linked_account_uid" = Option<String>, Query, description = "account uid contains"),
        ("cloud_vendor" = Option<String>, Query, description = "vendor"),
        ("month" = Option<String>, Query, description = "yyyy-MM"),
        ("sort_order" = Option<String>, Query, description = "by total bill, asc or desc"),
    ),
    responses((status = 200, description = "Bills grouped per customer"))
)]
pub async fn list_customer_invoices(State(state): State<ServerState>, Query(q): Query<CustomerInvoiceQuery>) -> ApiResult<Page<CustomerInvoice>> {
    Ok(Json(ApiResponse::success(customer_invoice::list(&state.db, &q).await?)))
}
