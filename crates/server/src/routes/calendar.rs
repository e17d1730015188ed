use axum::{extract::{Path, Query, State}, Json};
use uuid::Uuid;

use common::types::ApiResponse;
use models::schedule;
use service::schedule_service::{self, ScheduleInput, ScheduleRange};

use super::{auth::ServerState, ApiResult};

#[utoipa::path(
    get, path = "/api/v1/calendar/schedules", tag = "calendar",
    params(
        ("start" = Option<String>, Query, description = "RFC 3339 lower bound of start_time"),
        ("end" = Option<String>, Query, description = "RFC 3339 upper bound of start_time"),
    ),
    responses((status = 200, description = "Schedules in range"))
)]
pub async fn list(State(state): State<ServerState>, Query(range): Query<ScheduleRange>) -> ApiResult<Vec<schedule::Model>> {
    Ok(Json(ApiResponse::success(schedule_service::list(&state.db, &range).await?)))
}

#[utoipa::path(
    post, path = "/api/v1/calendar/schedules", tag = "calendar",
    request_body = crate::openapi::ScheduleRequest,
    responses((status = 200, description = "Created"), (status = 400, description = "Validation Error"))
)]
pub async fn create(State(state): State<ServerState>, Json(input): Json<ScheduleInput>) -> ApiResult<schedule::Model> {
    Ok(Json(ApiResponse::success(schedule_service::create(&state.db, input).await?)))
}

#[utoipa::path(
    put, path = "/api/v1/calendar/schedules/{id}", tag = "calendar",
    params(("id" = Uuid, Path, description = "Schedule ID")),
    request_body = crate::openapi::ScheduleRequest,
    responses((status = 200, description = "Updated"), (status = 404, description = "Not Found"))
)]
pub async fn update(State(state): State<ServerState>, Path(id): Path<Uuid>, Json(input): Json<ScheduleInput>) -> ApiResult<schedule::Model> {
    Ok(Json(ApiResponse::success(schedule_service::update(&state.db, id, input).await?)))
}

#[utoipa::path(
    delete, path = "/api/v1/calendar/schedules/{id}", tag = "calendar",
    params(("id" = Uuid, Path, description = "Schedule ID")),
    responses((status = 200, description = "Deleted"), (status = 404, description = "Not Found"))
)]
pub async fn delete(State(state): State<ServerState>, Path(id): Path<Uuid>) -> ApiResult<()> {
    schedule_service::delete(&state.db, id).await?;
    Ok(Json(ApiResponse::ok("删除成功")))
}
