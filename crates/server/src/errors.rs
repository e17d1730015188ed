use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use service::auth::errors::AuthError;
use service::errors::ServiceError;

/// Error body: `{"code": <business code>, "message": "<title>", "detail": "<detail>"}`.
#[derive(Debug, Serialize)]
pub struct JsonApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, message: impl Into<String>, detail: Option<String>) -> Self {
        Self { status, code: status.as_u16(), message: message.into(), detail }
    }

    pub fn unauthorized() -> Self { Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", None) }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Validation Error", Some(detail.into()))
    }
}

/// HTTP status for a business code.
pub fn status_for(code: u16) -> StatusCode {
    match code {
        400 => StatusCode::BAD_REQUEST,
        401 => StatusCode::UNAUTHORIZED,
        404 | 1002 => StatusCode::NOT_FOUND,
        409 | 1001 | 1004 => StatusCode::CONFLICT,
        1003 => StatusCode::UNPROCESSABLE_ENTITY,
        1005 => StatusCode::FORBIDDEN,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn title_for(code: u16) -> &'static str {
    match code {
        400 => "Validation Error",
        401 => "Unauthorized",
        404 => "Not Found",
        409 => "Conflict",
        1001 => "Account Exists",
        1002 => "Payer Not Found",
        1003 => "Customer Unavailable",
        1004 => "Email Unavailable",
        1005 => "Forbidden",
        _ => "Internal Error",
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        let code = e.code();
        let status = status_for(code);
        if status.is_server_error() {
            error!(err = %e, code, "request failed");
        } else {
            warn!(err = %e, code, "request rejected");
        }
        Self { status, code, message: title_for(code).to_string(), detail: Some(e.to_string()) }
    }
}

impl From<AuthError> for JsonApiError {
    fn from(e: AuthError) -> Self { ServiceError::from(e).into() }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("seeding failed: {0}")]
    Seed(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

impl From<ServiceError> for StartupError {
    fn from(e: ServiceError) -> Self { StartupError::Seed(e.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_codes_map_to_statuses() {
        assert_eq!(status_for(1001), StatusCode::CONFLICT);
        assert_eq!(status_for(1002), StatusCode::NOT_FOUND);
        assert_eq!(status_for(1003), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status_for(1004), StatusCode::CONFLICT);
        assert_eq!(status_for(1005), StatusCode::FORBIDDEN);
        assert_eq!(status_for(500), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn service_error_keeps_business_code() {
        let e: JsonApiError = ServiceError::CustomerUnavailable("关联的 Customer 状态异常".into()).into();
        assert_eq!(e.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(e.code, 1003);
        let body = serde_json::to_value(&e).unwrap();
        assert_eq!(body["code"], 1003);
        assert!(body["detail"].as_str().unwrap().contains("状态异常"));
    }

    #[test]
    fn unauthorized_body_has_no_detail() {
        let body = serde_json::to_value(JsonApiError::unauthorized()).unwrap();
        assert_eq!(body, serde_json::json!({"code": 401, "message": "Unauthorized"}));
    }
}
