//! Resolution of the payer, customer and mailbox an account points at.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use tracing::info;
use uuid::Uuid;

use models::{account, customer, email, payer};
use crate::auth::password::hash_password;
use crate::crypto::random_secret;
use crate::errors::ServiceError;
use crate::internal_id::{next_internal_id, IdKind};
use crate::payer_service;
use crate::query::eq_ci;

pub async fn require_payer<C: ConnectionTrait>(db: &C, key: &str) -> Result<payer::Model, ServiceError> {
    payer_service::resolve(db, key)
        .await?
        .ok_or_else(|| ServiceError::PayerNotFound("关联的 Payer 不存在".into()))
}

/// Customer by internal id; it must exist and be active.
pub async fn require_active_customer<C: ConnectionTrait>(db: &C, internal_id: &str) -> Result<customer::Model, ServiceError> {
    let c = customer::Entity::find()
        .filter(customer::Column::CustomerInternalId.eq(internal_id.trim()))
        .one(db)
        .await
        .map_err(ServiceError::from_db)?
        .ok_or_else(|| ServiceError::CustomerUnavailable("关联的 Customer 不存在".into()))?;
    if !c.is_active() {
        return Err(ServiceError::CustomerUnavailable("关联的 Customer 状态异常".into()));
    }
    Ok(c)
}

fn ensure_usable(e: &email::Model) -> Result<(), ServiceError> {
    if !e.status.eq_ignore_ascii_case(email::STATUS_ACTIVE) {
        return Err(ServiceError::EmailUnavailable("关联的 Email 状态异常".into()));
    }
    if e.category.eq_ignore_ascii_case(email::CATEGORY_SECONDARY) {
        return Err(ServiceError::EmailUnavailable("关联的 Email 类型不支持（secondary）".into()));
    }
    Ok(())
}

/// Fails when another account (other than `current_uid`) already links the mailbox.
async fn ensure_unbound<C: ConnectionTrait>(db: &C, e: &email::Model, current_uid: Option<&str>) -> Result<(), ServiceError> {
    let mut find = account::Entity::find().filter(account::Column::LinkedEmailId.eq(e.id));
    if let Some(uid) = current_uid {
        find = find.filter(account::Column::Uid.ne(uid));
    }
    if find.count(db).await.map_err(ServiceError::from_db)? > 0 {
        return Err(ServiceError::EmailUnavailable("该邮箱已被其他账号绑定".into()));
    }
    Ok(())
}

pub async fn find_email_by_address<C: ConnectionTrait>(db: &C, address: &str) -> Result<Option<email::Model>, ServiceError> {
    email::Entity::find()
        .filter(eq_ci((email::Entity, email::Column::EmailAddress), address))
        .one(db)
        .await
        .map_err(ServiceError::from_db)
}

async fn create_api_email<C: ConnectionTrait>(db: &C, address: &str, payer_id: Option<Uuid>, uid: &str) -> Result<email::Model, ServiceError> {
    let internal_id = next_internal_id::<email::Entity, _>(db, email::Column::EmailInternalId, IdKind::Email).await?;
    let now = Utc::now().into();
    let created = email::ActiveModel {
        id: Set(Uuid::new_v4()),
        email_internal_id: Set(internal_id),
        email_address: Set(address.to_string()),
        password_hash: Set(Some(hash_password(&random_secret())?)),
        source: Set(Some(email::SOURCE_API_CREATION.into())),
        category: Set(email::CATEGORY_NORMAL.into()),
        parent_email_id: Set(None),
        credit_card_last4: Set(None),
        is_sp_account: Set(false),
        payer_id: Set(payer_id),
        linked_account_name: Set(None),
        linked_account_uid: Set(Some(uid.to_string())),
        enable_forwarding: Set(false),
        status: Set(email::STATUS_ACTIVE.into()),
        labels: Set(vec![]),
        remarks: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .map_err(ServiceError::from_db)?;
    info!(email_internal_id = %created.email_internal_id, "mailbox created for account");
    Ok(created)
}

/// Pick the mailbox for an account.
///
/// An explicit `email_id` must exist. Otherwise `address` is looked up
/// case-insensitively and created when unknown. Existing mailboxes must be
/// active, not secondary and not linked to a different account.
pub async fn resolve_email<C: ConnectionTrait>(
    db: &C,
    email_id: Option<&str>,
    address: Option<&str>,
    payer_id: Option<Uuid>,
    uid: &str,
    current_uid: Option<&str>,
) -> Result<Option<email::Model>, ServiceError> {
    if let Some(eid) = email_id.map(str::trim).filter(|s| !s.is_empty()) {
        let e = email::Entity::find()
            .filter(email::Column::EmailInternalId.eq(eid))
            .one(db)
            .await
            .map_err(ServiceError::from_db)?
            .ok_or_else(|| ServiceError::EmailUnavailable("关联的 Email 不存在".into()))?;
        ensure_usable(&e)?;
        ensure_unbound(db, &e, current_uid).await?;
        return Ok(Some(e));
    }
    let Some(address) = address.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    match find_email_by_address(db, address).await? {
        Some(e) => {
            ensure_usable(&e)?;
            ensure_unbound(db, &e, current_uid).await?;
            Ok(Some(e))
        }
        None => create_api_email(db, address, payer_id, uid).await.map(Some),
    }
}

/// Point the mailbox back at the account it now serves.
pub async fn link_email_to_account<C: ConnectionTrait>(db: &C, e: email::Model, acc: &account::Model) -> Result<email::Model, ServiceError> {
    let mut am: email::ActiveModel = e.into();
    am.linked_account_name = Set(Some(acc.account_name.clone()));
    am.linked_account_uid = Set(Some(acc.uid.clone()));
    am.updated_at = Set(Utc::now().into());
    am.update(db).await.map_err(ServiceError::from_db)
}
