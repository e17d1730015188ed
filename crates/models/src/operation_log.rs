use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

pub const ACTION_CREATE: &str = "CREATE";
pub const ACTION_UPDATE: &str = "UPDATE";
pub const ACTION_DELETE: &str = "DELETE";

const MAX_DESCRIPTION: usize = 1024;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "operation_log")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub operator_email: Option<String>,
    pub operator_name: Option<String>,
    pub action: String,
    pub target_type: String,
    pub target_id: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Append one audit row. The description is cut at 1024 characters.
pub async fn insert<C: ConnectionTrait>(
    db: &C,
    operator_email: Option<&str>,
    operator_name: Option<&str>,
    action: &str,
    target_type: &str,
    target_id: Option<&str>,
    description: Option<&str>,
) -> Result<Model, ModelError> {
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        operator_email: Set(operator_email.map(str::to_string)),
        operator_name: Set(operator_name.map(str::to_string)),
        action: Set(action.to_string()),
        target_type: Set(target_type.to_string()),
        target_id: Set(target_id.map(str::to_string)),
        description: Set(description.map(|d| truncate_chars(d, MAX_DESCRIPTION))),
        created_at: Set(Utc::now().into()),
    };
    am.insert(db).await.map_err(ModelError::from_db)
}

#[cfg(test)]
mod tests {
    use super::truncate_chars;

    #[test]
    fn truncates_on_char_boundary() {
        let s = "新增账号".repeat(300);
        let t = truncate_chars(&s, 1024);
        assert_eq!(t.chars().count(), 1024);
    }
}
