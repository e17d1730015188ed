use axum::{extract::{Path, Query, State}, Extension, Json};
use serde::Deserialize;

use common::types::{ApiResponse, Page};
use service::account::{self, AccountCreated, AccountDetail, AccountInput, AccountQuery, AccountRow};
use service::context::Operator;

use super::{auth::ServerState, ApiResult};

#[derive(Debug, Deserialize)]
pub struct DetailQuery {
    pub account_id: Option<String>,
    pub uid: Option<String>,
}

#[utoipa::path(
    get, path = "/api/v1/account", tag = "accounts",
    params(
        ("page" = Option<u32>, Query, description = "1-based page"),
        ("page_size" = Option<u32>, Query, description = "1..=100"),
        ("search" = Option<String>, Query, description = "uid, name, internal id or bound email"),
        ("vendor" = Option<String>, Query, description = "cloud vendor"),
        ("account_type" = Option<String>, Query, description = "account category"),
        ("account_category" = Option<String>, Query, description = "alias of account_type"),
        ("account_source" = Option<String>, Query, description = "account source"),
        ("label" = Option<String>, Query, description = "label"),
        ("sort_by" = Option<String>, Query, description = "sort column"),
        ("sort_order" = Option<String>, Query, description = "asc or desc"),
    ),
    responses((status = 200, description = "Page of accounts"))
)]
pub async fn list(State(state): State<ServerState>, Query(q): Query<AccountQuery>) -> ApiResult<Page<AccountRow>> {
    Ok(Json(ApiResponse::success(account::list(&state.db, &q).await?)))
}

#[utoipa::path(get, path = "/api/v1/account/sp-list", tag = "accounts", responses((status = 200, description = "Page of SP accounts")))]
pub async fn sp_list(State(state): State<ServerState>, Query(q): Query<AccountQuery>) -> ApiResult<Page<AccountRow>> {
    Ok(Json(ApiResponse::success(account::sp_list(&state.db, &q).await?)))
}

#[utoipa::path(
    get, path = "/api/v1/account/detail", tag = "accounts",
    params(
        ("account_id" = Option<String>, Query, description = "acc_yyyyMMdd_NNN"),
        ("uid" = Option<String>, Query, description = "vendor uid"),
    ),
    responses((status = 200, description = "Account detail"), (status = 404, description = "Not Found"))
)]
pub async fn detail(State(state): State<ServerState>, Query(q): Query<DetailQuery>) -> ApiResult<AccountDetail> {
    let d = account::detail(&state.db, q.account_id.as_deref(), q.uid.as_deref()).await?;
    Ok(Json(ApiResponse::success(d)))
}

#[utoipa::path(
    post, path = "/api/v1/account/addAccount", tag = "accounts",
    request_body = crate::openapi::AccountRequest,
    responses(
        (status = 200, description = "Created"),
        (status = 400, description = "Validation Error"),
        (status = 403, description = "Missing ACCOUNT_MANAGE"),
        (status = 404, description = "Payer not found"),
        (status = 409, description = "Uid exists or email unavailable"),
        (status = 422, description = "Customer unavailable")
    )
)]
pub async fn add(State(state): State<ServerState>, Extension(op): Extension<Operator>, Json(input): Json<AccountInput>) -> ApiResult<AccountCreated> {
    let created = account::add_account(&state.db, &state.cipher, &op, input).await?;
    Ok(Json(ApiResponse::with_message("账号创建成功", created)))
}

#[utoipa::path(
    put, path = "/api/v1/account/{uid}", tag = "accounts",
    params(("uid" = String, Path, description = "vendor uid")),
    request_body = crate::openapi::AccountRequest,
    responses((status = 200, description = "Updated"), (status = 404, description = "Not Found"))
)]
pub async fn update(
    State(state): State<ServerState>,
    Extension(op): Extension<Operator>,
    Path(uid): Path<String>,
    Json(input): Json<AccountInput>,
) -> ApiResult<AccountDetail> {
    let updated = account::update_account(&state.db, &state.cipher, &op, &uid, input).await?;
    Ok(Json(ApiResponse::with_message("账号更新成功", updated)))
}
