use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

pub const STATUS_ENABLED: &str = "Enabled";
pub const STATUS_DISABLED: &str = "Disabled";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cloud_provider")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    #[sea_orm(unique)]
    pub code: String,
    pub status: String,
    pub description: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// `Enabled`/`Disabled`, case-insensitive; blank means enabled.
pub fn normalize_status(raw: Option<&str>) -> Result<String, ModelError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(STATUS_ENABLED.into()),
        Some(s) if s.eq_ignore_ascii_case(STATUS_ENABLED) => Ok(STATUS_ENABLED.into()),
        Some(s) if s.eq_ignore_ascii_case(STATUS_DISABLED) => Ok(STATUS_DISABLED.into()),
        Some(s) => Err(ModelError::Validation(format!("status must be Enabled or Disabled, got {s}"))),
    }
}
