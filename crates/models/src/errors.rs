use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Db(String),
}

impl ModelError {
    /// Map a driver error, surfacing unique violations as [`ModelError::Conflict`].
    pub fn from_db(e: sea_orm::DbErr) -> Self {
        let msg = e.to_string();
        if msg.contains("duplicate key value violates unique constraint") {
            ModelError::Conflict(msg)
        } else {
            ModelError::Db(msg)
        }
    }
}
