use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "schedule")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub start_time: DateTimeWithTimeZone,
    pub end_time: Option<DateTimeWithTimeZone>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// `work`, `personal` or `other`; blank defaults to `work`.
pub fn normalize_category(raw: Option<&str>) -> Result<String, ModelError> {
    let c = raw.map(|s| s.trim().to_ascii_lowercase()).unwrap_or_default();
    match c.as_str() {
        "" => Ok("work".into()),
        "work" | "personal" | "other" => Ok(c.clone()),
        other => Err(ModelError::Validation(format!("unknown schedule category: {other}"))),
    }
}
