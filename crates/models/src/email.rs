use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

pub const CATEGORY_NORMAL: &str = "normal";
pub const CATEGORY_PRIMARY: &str = "primary";
pub const CATEGORY_SECONDARY: &str = "secondary";
pub const STATUS_ACTIVE: &str = "active";
/// Source recorded on mailboxes created implicitly while adding accounts.
pub const SOURCE_API_CREATION: &str = "API Creation";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "email")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email_internal_id: String,
    #[sea_orm(unique)]
    pub email_address: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub source: Option<String>,
    pub category: String,
    pub parent_email_id: Option<Uuid>,
    pub credit_card_last4: Option<String>,
    pub is_sp_account: bool,
    pub payer_id: Option<Uuid>,
    pub linked_account_name: Option<String>,
    pub linked_account_uid: Option<String>,
    pub enable_forwarding: bool,
    pub status: String,
    pub labels: Vec<String>,
    pub remarks: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Payer }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Payer => Entity::belongs_to(crate::payer::Entity)
                .from(Column::PayerId)
                .to(crate::payer::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Active and not a secondary alias: may be bound to an account.
    pub fn is_bindable(&self) -> bool {
        self.status.eq_ignore_ascii_case(STATUS_ACTIVE) && !self.category.eq_ignore_ascii_case(CATEGORY_SECONDARY)
    }
}

/// Lower-cased category, defaulting to `normal`.
pub fn normalize_category(raw: Option<&str>) -> Result<String, ModelError> {
    let c = raw.map(|s| s.trim().to_ascii_lowercase()).unwrap_or_default();
    match c.as_str() {
        "" => Ok(CATEGORY_NORMAL.to_string()),
        CATEGORY_NORMAL | CATEGORY_PRIMARY | CATEGORY_SECONDARY => Ok(c.clone()),
        other => Err(ModelError::Validation(format!("unknown email category: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_defaults_and_validates() {
        assert_eq!(normalize_category(None).unwrap(), CATEGORY_NORMAL);
        assert_eq!(normalize_category(Some(" Primary ")).unwrap(), CATEGORY_PRIMARY);
        assert!(normalize_category(Some("other")).is_err());
    }
}
