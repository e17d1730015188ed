use thiserror::Error;

/// Business errors for auth workflows
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("该邮箱已被注册")]
    Conflict,
    #[error("user not found")]
    NotFound,
    #[error("用户名或密码错误")]
    Unauthorized,
    #[error("user is disabled")]
    Inactive,
    #[error("hashing error: {0}")]
    HashError(String),
    #[error("token error: {0}")]
    TokenError(String),
    #[error("repository error: {0}")]
    Repository(String),
}

impl AuthError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            AuthError::Validation(_) => 400,
            AuthError::Conflict => 409,
            AuthError::NotFound => 404,
            AuthError::Unauthorized | AuthError::Inactive | AuthError::TokenError(_) => 401,
            AuthError::HashError(_) | AuthError::Repository(_) => 500,
        }
    }
}
