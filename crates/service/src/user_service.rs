use std::sync::Arc;

use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};
use serde::Deserialize;
use tracing::info;

use models::user::{self, PERM_ACCOUNT_MANAGE, PERM_LOG_VIEW, PERM_SYSTEM_MANAGE, PERM_USER_EDIT, PERM_USER_VIEW, ROLE_ADMIN, STATUS_ACTIVE};
use crate::auth::{domain::{AuthUser, RegisterInput}, errors::AuthError, repo::SeaOrmAuthRepository, AuthConfig, AuthService};
use crate::errors::ServiceError;

/// Body of the create-user form; labels may be the UI's display strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateUserInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// All users, newest first.
pub async fn list_users(db: &DatabaseConnection) -> Result<Vec<AuthUser>, ServiceError> {
    let users = user::Entity::find()
        .order_by_desc(user::Column::CreatedAt)
        .all(db)
        .await
        .map_err(ServiceError::from_db)?;
    Ok(users.into_iter().map(AuthUser::from).collect())
}

fn auth_service(db: &DatabaseConnection) -> AuthService<SeaOrmAuthRepository> {
    AuthService::new(Arc::new(SeaOrmAuthRepository::new(db.clone())), AuthConfig::default())
}

/// Create a user from the admin form.
pub async fn create_user(db: &DatabaseConnection, input: CreateUserInput) -> Result<AuthUser, ServiceError> {
    let reg = RegisterInput {
        email: input.email.trim().to_string(),
        name: input.name.trim().to_string(),
        password: input.password,
        role: user::normalize_role(input.role.as_deref()).to_string(),
        status: user::normalize_status(input.status.as_deref()).to_string(),
        permissions: user::normalize_permissions(&input.permissions),
    };
    // duplicates are reported to the form as a validation failure
    auth_service(db).register(reg).await.map_err(|e| match e {
        AuthError::Conflict => ServiceError::Validation(AuthError::Conflict.to_string()),
        other => other.into(),
    })
}

/// Make sure the bootstrap administrator exists.
pub async fn seed_admin(db: &DatabaseConnection, email: &str, password: &str) -> Result<AuthUser, ServiceError> {
    let reg = RegisterInput {
        email: email.to_string(),
        name: "Administrator".into(),
        password: password.to_string(),
        role: ROLE_ADMIN.into(),
        status: STATUS_ACTIVE.into(),
        permissions: [PERM_ACCOUNT_MANAGE, PERM_USER_VIEW, PERM_USER_EDIT, PERM_SYSTEM_MANAGE, PERM_LOG_VIEW]
            .iter()
            .map(|p| p.to_string())
            .collect(),
    };
    let admin = auth_service(db).ensure_user(reg).await?;
    info!(user_id = %admin.id, email = %admin.email, "admin account ready");
    Ok(admin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{get_db, tag};

    #[tokio::test]
    async fn create_maps_ui_labels() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let email = format!("svc_{}@example.com", tag());
        let input = CreateUserInput {
            name: "Svc User".into(),
            email: email.clone(),
            password: "123456".into(),
            role: Some("管理员".into()),
            status: Some("禁用".into()),
            permissions: vec!["查看日志".into(), "查看用户".into()],
        };
        let u = create_user(&db, input.clone()).await?;
        assert_eq!(u.role, "admin");
        assert_eq!(u.status, "inactive");
        assert_eq!(u.permissions, vec!["LOG_VIEW".to_string(), "USER_VIEW".to_string()]);

        let dup = create_user(&db, input).await.unwrap_err();
        assert!(matches!(&dup, ServiceError::Validation(m) if m == "该邮箱已被注册"));
        assert!(list_users(&db).await?.iter().any(|x| x.email == email));

        user::Entity::delete_by_id(u.id).exec(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn seed_admin_twice() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let email = format!("admin_{}@example.com", tag());
        let a = seed_admin(&db, &email, "123456").await?;
        let b = seed_admin(&db, &email, "123456").await?;
        assert_eq!(a.id, b.id);
        assert!(a.permissions.contains(&PERM_ACCOUNT_MANAGE.to_string()));
        user::Entity::delete_by_id(a.id).exec(&db).await?;
        Ok(())
    }
}
