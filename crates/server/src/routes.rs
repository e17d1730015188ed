use axum::{
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::{ApiResponse, Health};

use crate::errors::JsonApiError;
use crate::openapi::ApiDoc;

pub mod accounts;
pub mod analysis;
pub mod auth;
pub mod basic_data;
pub mod billing;
pub mod calendar;
pub mod customers;
pub mod emails;
pub mod invoices;
pub mod knowledge;
pub mod operation_logs;
pub mod payers;
pub mod payments;
pub mod users;

use auth::ServerState;

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, JsonApiError>;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Monthly bill routes, mounted under the canonical path and its aliases.
fn bill_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(billing::list_bills))
        .route("/:id", put(billing::update_bill))
}

fn api_v1() -> Router<ServerState> {
    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/users", get(users::list).post(users::create))
        .route("/payers", get(payers::list).post(payers::create))
        .route("/payers/:payer_internal_id", get(payers::get).put(payers::update))
        .route("/account", get(accounts::list))
        .route("/account/sp-list", get(accounts::sp_list))
        .route("/account/detail", get(accounts::detail))
        .route("/account/addAccount", post(accounts::add))
        .route("/account/:uid", put(accounts::update))
        .route("/customers", get(customers::list).post(customers::create))
        .route("/customers/:customer_internal_id", get(customers::get).put(customers::update))
        .route("/emails", get(emails::list).post(emails::create))
        .route("/emails/:email_internal_id", get(emails::get).put(emails::update))
        .route("/basic-data/cloud-providers", get(basic_data::list_cloud_providers).post(basic_data::create_cloud_provider))
        .route("/basic-data/cloud-providers/:id", put(basic_data::update_cloud_provider).delete(basic_data::delete_cloud_provider))
        .route("/basic-data/partner-bds", get(basic_data::list_partner_bds).post(basic_data::create_partner_bd))
        .route("/basic-data/partner-bds/:id", put(basic_data::update_partner_bd).delete(basic_data::delete_partner_bd))
        .route("/basic-data/credit-cards", get(basic_data::list_credit_cards).post(basic_data::create_credit_card))
        .route("/basic-data/credit-cards/:id", put(basic_data::update_credit_card).delete(basic_data::delete_credit_card))
        .route("/operation-logs", get(operation_logs::list))
        .nest("/customer-monthly-bills", bill_routes())
        .nest("/customerMonthlyBills", bill_routes())
        .nest("/billing/customer/monthly", bill_routes())
        .route("/customer-invoices", get(billing::list_customer_invoices))
        .route("/invoices", get(invoices::list).post(invoices::create).delete(invoices::delete))
        .route("/invoices/:id", get(invoices::get).put(invoices::update).patch(invoices::update))
        .route("/invoices/:id/post", post(invoices::post))
        .route("/analysis/monthly", get(analysis::monthly))
        .route("/analysis/yearly", get(analysis::yearly))
        .route("/finance/monthly-payments", get(payments::overview))
        .route("/finance/monthly-payments/record", post(payments::record))
        .route("/knowledge/articles", get(knowledge::list).post(knowledge::create))
        .route("/knowledge/articles/:id", get(knowledge::get).put(knowledge::update).delete(knowledge::delete))
        .route("/calendar/schedules", get(calendar::list).post(calendar::create))
        .route("/calendar/schedules/:id", put(calendar::update).delete(calendar::delete))
}

/// Build the full application router: health, docs and the authenticated `/api/v1` tree.
pub fn build_router(cors: CorsLayer, state: ServerState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_v1())
        .layer(middleware::from_fn_with_state(state.clone(), auth::require_auth))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法和路径等，日志级别为 INFO
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // 响应返回时打点，包含状态码与耗时
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 失败（5xx 等）时以 ERROR 记录
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
