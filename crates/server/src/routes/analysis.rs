use axum::{extract::{Query, State}, Json};
use serde::Deserialize;

use common::types::ApiResponse;
use service::analysis::{self, MonthlyAnalysis, YearlyAnalysis};

use super::{auth::ServerState, ApiResult};

#[derive(Debug, Deserialize)]
pub struct MonthlyQuery {
    pub month: Option<String>,
    pub cloud_provider: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct YearlyQuery {
    pub year: Option<i32>,
}

#[utoipa::path(
    get, path = "/api/v1/analysis/monthly", tag = "analysis",
    params(
        ("month" = Option<String>, Query, description = "yyyy-MM, defaults to the current month"),
        ("cloud_provider" = Option<String>, Query, description = "vendor; All or 全部 for every vendor"),
    ),
    responses((status = 200, description = "Monthly analysis"), (status = 400, description = "Invalid month"))
)]
pub async fn monthly(State(state): State<ServerState>, Query(q): Query<MonthlyQuery>) -> ApiResult<MonthlyAnalysis> {
    let report = analysis::monthly(&state.db, q.month.as_deref(), q.cloud_provider.as_deref()).await?;
    Ok(Json(ApiResponse::success(report)))
}

#[utoipa::path(
    get, path = "/api/v1/analysis/yearly", tag = "analysis",
    params(("year" = Option<i32>, Query, description = "defaults to the current year")),
    responses((status = 200, description = "Yearly analysis"))
)]
pub async fn yearly(State(state): State<ServerState>, Query(q): Query<YearlyQuery>) -> ApiResult<YearlyAnalysis> {
    Ok(Json(ApiResponse::success(analysis::yearly(&state.db, q.year).await?)))
}
