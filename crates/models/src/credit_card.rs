use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "credit_card")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// 8-digit random reference shown to operators.
    #[sea_orm(unique)]
    pub card_id: String,
    pub bank_name: String,
    pub holder_name: Option<String>,
    pub first_four_digits: String,
    pub last_four_digits: String,
    pub expiration_date: Option<String>,
    pub status: String,
    pub description: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_four_digits(field: &str, v: &str) -> Result<(), ModelError> {
    if v.len() != 4 || !v.chars().all(|c| c.is_ascii_digit()) {
        return Err(ModelError::Validation(format!("{field} must be 4 digits")));
    }
    Ok(())
}
