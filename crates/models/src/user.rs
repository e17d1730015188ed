use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";
pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_INACTIVE: &str = "inactive";

pub const PERM_ACCOUNT_MANAGE: &str = "ACCOUNT_MANAGE";
pub const PERM_USER_VIEW: &str = "USER_VIEW";
pub const PERM_USER_EDIT: &str = "USER_EDIT";
pub const PERM_SYSTEM_MANAGE: &str = "SYSTEM_MANAGE";
pub const PERM_LOG_VIEW: &str = "LOG_VIEW";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub name: String,
    pub status: String,
    pub role: String,
    pub permissions: Vec<String>,
    pub avatar: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_active(&self) -> bool { self.status == STATUS_ACTIVE }
}

pub fn validate_name(name: &str) -> Result<(), errors::ModelError> {
    if name.trim().is_empty() { return Err(errors::ModelError::Validation("name required".into())); }
    if name.chars().count() > 128 { return Err(errors::ModelError::Validation("name too long (<=128)".into())); }
    Ok(())
}

/// Map UI status labels onto stored values; unknown labels count as active.
pub fn normalize_status(raw: Option<&str>) -> &'static str {
    match raw.map(str::trim) {
        Some("禁用") | Some("inactive") | Some("banned") => STATUS_INACTIVE,
        _ => STATUS_ACTIVE,
    }
}

pub fn normalize_role(raw: Option<&str>) -> &'static str {
    match raw.map(str::trim) {
        Some("管理员") => ROLE_ADMIN,
        Some(r) if r.eq_ignore_ascii_case("admin") => ROLE_ADMIN,
        _ => ROLE_USER,
    }
}

/// Map UI permission names onto permission codes; unknown names pass through.
pub fn normalize_permissions(raw: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for p in raw {
        let code = match p.trim() {
            "查看用户" => PERM_USER_VIEW.to_string(),
            "编辑用户" => PERM_USER_EDIT.to_string(),
            "系统管理" => PERM_SYSTEM_MANAGE.to_string(),
            "查看日志" => PERM_LOG_VIEW.to_string(),
            "" => continue,
            other => other.to_string(),
        };
        if !out.contains(&code) { out.push(code); }
    }
    out
}

pub async fn create<C: ConnectionTrait>(
    db: &C,
    email: &str,
    name: &str,
    role: &str,
    status: &str,
    permissions: Vec<String>,
) -> Result<Model, errors::ModelError> {
    crate::validation::validate_email(email)?;
    validate_name(name)?;
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.trim().to_string()),
        name: Set(name.trim().to_string()),
        status: Set(status.to_string()),
        role: Set(role.to_string()),
        permissions: Set(permissions),
        avatar: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    am.insert(db).await.map_err(errors::ModelError::from_db)
}
