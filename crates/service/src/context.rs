use serde::{Deserialize, Serialize};
use uuid::Uuid;

use models::user::{PERM_ACCOUNT_MANAGE, ROLE_ADMIN};

/// The authenticated operator performing a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operator {
    pub user_id: Option<Uuid>,
    pub email: String,
    pub name: String,
    pub role: String,
    pub permissions: Vec<String>,
}

impl Operator {
    pub fn is_admin(&self) -> bool { self.role.eq_ignore_ascii_case(ROLE_ADMIN) }

    pub fn has_permission(&self, perm: &str) -> bool {
        self.is_admin() || self.permissions.iter().any(|p| p == perm)
    }

    pub fn can_manage_accounts(&self) -> bool { self.has_permission(PERM_ACCOUNT_MANAGE) }

    /// Operator used for startup maintenance writes.
    pub fn system() -> Self {
        Self { user_id: None, email: "system".into(), name: "system".into(), role: ROLE_ADMIN.into(), permissions: vec![] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(role: &str, perms: &[&str]) -> Operator {
        Operator { user_id: None, email: "a@b.c".into(), name: "a".into(), role: role.into(), permissions: perms.iter().map(|s| s.to_string()).collect() }
    }

    #[test]
    fn admin_implies_account_manage() {
        assert!(op("admin", &[]).can_manage_accounts());
        assert!(op("user", &["ACCOUNT_MANAGE"]).can_manage_accounts());
        assert!(!op("user", &["LOG_VIEW"]).can_manage_accounts());
    }
}
