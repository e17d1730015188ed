use thiserror::Error;

use models::errors::ModelError;

use crate::auth::errors::AuthError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("account uid already exists: {0}")]
    UidExists(String),
    #[error("payer not found: {0}")]
    PayerNotFound(String),
    #[error("customer unavailable: {0}")]
    CustomerUnavailable(String),
    #[error("email unavailable: {0}")]
    EmailUnavailable(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("crypto error: {0}")]
    Crypto(String),
    #[error("database error: {0}")]
    Db(String),
    #[error("model error: {0}")]
    Model(#[from] ModelError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    pub fn required(field: &str) -> Self { Self::Validation(format!("{field} 必填")) }

    /// Map a driver error, surfacing unique violations as conflicts.
    pub fn from_db(e: sea_orm::DbErr) -> Self {
        match ModelError::from_db(e) {
            ModelError::Conflict(m) => Self::Conflict(m),
            other => Self::Db(other.to_string()),
        }
    }

    /// Stable business code carried in error bodies.
    pub fn code(&self) -> u16 {
        match self {
            ServiceError::Validation(_) => 400,
            ServiceError::NotFound(_) => 404,
            ServiceError::Conflict(_) => 409,
            ServiceError::UidExists(_) => 1001,
            ServiceError::PayerNotFound(_) => 1002,
            ServiceError::CustomerUnavailable(_) => 1003,
            ServiceError::EmailUnavailable(_) => 1004,
            ServiceError::Forbidden(_) => 1005,
            ServiceError::Crypto(_) | ServiceError::Db(_) => 500,
            ServiceError::Model(ModelError::Validation(_)) => 400,
            ServiceError::Model(ModelError::Conflict(_)) => 409,
            ServiceError::Model(ModelError::Db(_)) => 500,
            ServiceError::Auth(e) => e.code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ServiceError::UidExists("x".into()).code(), 1001);
        assert_eq!(ServiceError::PayerNotFound("x".into()).code(), 1002);
        assert_eq!(ServiceError::CustomerUnavailable("x".into()).code(), 1003);
        assert_eq!(ServiceError::EmailUnavailable("x".into()).code(), 1004);
        assert_eq!(ServiceError::Forbidden("x".into()).code(), 1005);
        assert_eq!(ServiceError::from(ModelError::Validation("v".into())).code(), 400);
    }

    #[test]
    fn required_message_names_field() {
        assert_eq!(ServiceError::required("uid").to_string(), "validation error: uid 必填");
    }
}
