//! Cloud providers, partner BDs and credit cards under `/api/v1/basic-data`.

use axum::{extract::{Path, State}, Extension, Json};
use uuid::Uuid;

use common::types::ApiResponse;
use models::{cloud_provider, partner_bd};
use service::basic_data_service::{self as basic, CloudProviderInput, CreditCardInput, CreditCardView, PartnerBdInput};
use service::context::Operator;

use super::{auth::ServerState, ApiResult};

#[utoipa::path(get, path = "/api/v1/basic-data/cloud-providers", tag = "basic-data", responses((status = 200, description = "Cloud providers")))]
pub async fn list_cloud_providers(State(state): State<ServerState>) -> ApiResult<Vec<cloud_provider::Model>> {
    Ok(Json(ApiResponse::success(basic::list_cloud_providers(&state.db).await?)))
}

#[utoipa::path(
    post, path = "/api/v1/basic-data/cloud-providers", tag = "basic-data",
    request_body = crate::openapi::CloudProviderRequest,
    responses((status = 200, description = "Created"), (status = 409, description = "Conflict"))
)]
pub async fn create_cloud_provider(State(state): State<ServerState>, Extension(op): Extension<Operator>, Json(input): Json<CloudProviderInput>) -> ApiResult<cloud_provider::Model> {
    Ok(Json(ApiResponse::success(basic::create_cloud_provider(&state.db, &op, input).await?)))
}

#[utoipa::path(
    put, path = "/api/v1/basic-data/cloud-providers/{id}", tag = "basic-data",
    params(("id" = Uuid, Path, description = "Cloud provider ID")),
    request_body = crate::openapi::CloudProviderRequest,
    responses((status = 200, description = "Updated"), (status = 404, description = "Not Found"))
)]
pub async fn update_cloud_provider(
    State(state): State<ServerState>,
    Extension(op): Extension<Operator>,
    Path(id): Path<Uuid>,
    Json(input): Json<CloudProviderInput>,
) -> ApiResult<cloud_provider::Model> {
    Ok(Json(ApiResponse::success(basic::update_cloud_provider(&state.db, &op, id, input).await?)))
}

#[utoipa::path(
    delete, path = "/api/v1/basic-data/cloud-providers/{id}", tag = "basic-data",
    params(("id" = Uuid, Path, description = "Cloud provider ID")),
    responses((status = 200, description = "Deleted"), (status = 404, description = "Not Found"))
)]
pub async fn delete_cloud_provider(State(state): State<ServerState>, Extension(op): Extension<Operator>, Path(id): Path<Uuid>) -> ApiResult<()> {
    basic::delete_cloud_provider(&state.db, &op, id).await?;
    Ok(Json(ApiResponse::ok("删除成功")))
}

#[utoipa::path(get, path = "/api/v1/basic-data/partner-bds", tag = "basic-data", responses((status = 200, description = "Partner BDs")))]
pub async fn list_partner_bds(State(state): State<ServerState>) -> ApiResult<Vec<partner_bd::Model>> {
    Ok(Json(ApiResponse::success(basic::list_partner_bds(&state.db).await?)))
}

#[utoipa::path(
    post, path = "/api/v1/basic-data/partner-bds", tag = "basic-data",
    request_body = crate::openapi::PartnerBdRequest,
    responses((status = 200, description = "Created"))
)]
pub async fn create_partner_bd(State(state): State<ServerState>, Extension(op): Extension<Operator>, Json(input): Json<PartnerBdInput>) -> ApiResult<partner_bd::Model> {
    Ok(Json(ApiResponse::success(basic::create_partner_bd(&state.db, &op, input).await?)))
}

#[utoipa::path(
    put, path = "/api/v1/basic-data/partner-bds/{id}", tag = "basic-data",
    params(("id" = Uuid, Path, description = "Partner BD ID")),
    request_body = crate::openapi::PartnerBdRequest,
    responses((status = 200, description = "Updated"), (status = 404, description = "Not Found"))
)]
pub async fn update_partner_bd(
    State(state): State<ServerState>,
    Extension(op): Extension<Operator>,
    Path(id): Path<Uuid>,
    Json(input): Json<PartnerBdInput>,
) -> ApiResult<partner_bd::Model> {
    Ok(Json(ApiResponse::success(basic::update_partner_bd(&state.db, &op, id, input).await?)))
}

#[utoipa::path(
    delete, path = "/api/v1/basic-data/partner-bds/{id}", tag = "basic-data",
    params(("id" = Uuid, Path, description = "Partner BD ID")),
    responses((status = 200, description = "Deleted"), (status = 404, description = "Not Found"))
)]
pub async fn delete_partner_bd(State(state): State<ServerState>, Extension(op): Extension<Operator>, Path(id): Path<Uuid>) -> ApiResult<()> {
    basic::delete_partner_bd(&state.db, &op, id).await?;
    Ok(Json(ApiResponse::ok("删除成功")))
}

#[utoipa::path(get, path = "/api/v1/basic-data/credit-cards", tag = "basic-data", responses((status = 200, description = "Credit cards with linked account counts")))]
pub async fn list_credit_cards(State(state): State<ServerState>) -> ApiResult<Vec<CreditCardView>> {
    Ok(Json(ApiResponse::success(basic::list_credit_cards(&state.db).await?)))
}

#[utoipa::path(
    post, path = "/api/v1/basic-data/credit-cards", tag = "basic-data",
    request_body = crate::openapi::CreditCardRequest,
    responses((status = 200, description = "Created"), (status = 400, description = "Validation Error"))
)]
pub async fn create_credit_card(State(state): State<ServerState>, Extension(op): Extension<Operator>, Json(input): Json<CreditCardInput>) -> ApiResult<CreditCardView> {
    Ok(Json(ApiResponse::success(basic::create_credit_card(&state.db, &op, input).await?)))
}

#[utoipa::path(
    put, path = "/api/v1/basic-data/credit-cards/{id}", tag = "basic-data",
    params(("id" = Uuid, Path, description = "Credit card ID")),
    request_body = crate::openapi::CreditCardRequest,
    responses((status = 200, description = "Updated"), (status = 404, description = "Not Found"))
)]
pub async fn update_credit_card(
    State(state): State<ServerState>,
    Extension(op): Extension<Operator>,
    Path(id): Path<Uuid>,
    Json(input): Json<CreditCardInput>,
) -> ApiResult<CreditCardView> {
    Ok(Json(ApiResponse::success(basic::update_credit_card(&state.db, &op, id, input).await?)))
}

#[utoipa::path(
    delete, path = "/api/v1/basic-data/credit-cards/{id}", tag = "basic-data",
    params(("id" = Uuid, Path, description = "Credit card ID")),
    responses((status = 200, description = "Deleted"), (status = 404, description = "Not Found"))
)]
pub async fn delete_credit_card(State(state): State<ServerState>, Extension(op): Extension<Operator>, Path(id): Path<Uuid>) -> ApiResult<()> {
    basic::delete_credit_card(&state.db, &op, id).await?;
    Ok(Json(ApiResponse::ok("删除成功")))
}
