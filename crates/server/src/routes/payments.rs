use axum::{extract::{Query, State}, Json};

use common::types::ApiResponse;
use models::monthly_payment;
use service::payment_service::{self, PaymentOverview, PaymentQuery, PaymentRecord};

use super::{auth::ServerState, ApiResult};

#[utoipa::path(
    get, path = "/api/v1/finance/monthly-payments", tag = "finance",
    params(
        ("month" = String, Query, description = "yyyy-MM"),
        ("customer_name" = Option<String>, Query, description = "customer name contains"),
        ("status" = Option<String>, Query, description = "payment status"),
    ),
    responses((status = 200, description = "Receivables per customer"), (status = 400, description = "Missing or invalid month"))
)]
pub async fn overview(State(state): State<ServerState>, Query(q): Query<PaymentQuery>) -> ApiResult<PaymentOverview> {
    Ok(Json(ApiResponse::success(payment_service::overview(&state.db, &q).await?)))
}

#[utoipa::path(
    post, path = "/api/v1/finance/monthly-payments/record", tag = "finance",
    request_body = crate::openapi::PaymentRecordRequest,
    responses((status = 200, description = "Recorded"), (status = 400, description = "Validation Error"))
)]
pub async fn record(State(state): State<ServerState>, Json(input): Json<PaymentRecord>) -> ApiResult<monthly_payment::Model> {
    let saved = payment_service::record(&state.db, input).await?;
    Ok(Json(ApiResponse::with_message("回款记录已保存", saved)))
}
