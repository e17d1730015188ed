//! Mailboxes used to register and monitor vendor accounts.

use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    sea_query::Condition, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use common::types::Page;
use models::{credit_card::validate_four_digits, email, operation_log::{ACTION_CREATE, ACTION_UPDATE}, validation};
use crate::account::links::find_email_by_address;
use crate::auth::password::hash_password;
use crate::internal_id::{next_internal_id, IdKind};
use crate::query::{array_contains, contains_ci, eq_ci, filled};
use crate::{context::Operator, errors::ServiceError, operation_log_service, pagination::{Pagination, SortOrder}, payer_service};

#[derive(Debug, Default, Clone, Deserialize)]
pub struct EmailQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub search: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub label: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct EmailInput {
    pub email_address: Option<String>,
    pub password: Option<String>,
    pub source: Option<String>,
    pub category: Option<String>,
    pub parent_email_id: Option<Uuid>,
    pub parent_email_address: Option<String>,
    pub credit_card_last4: Option<String>,
    pub is_sp_account: Option<bool>,
    pub payer_id: Option<String>,
    pub enable_forwarding: Option<bool>,
    pub status: Option<String>,
    pub labels: Option<Vec<String>>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmailView {
    pub id: Uuid,
    pub email_internal_id: String,
    pub email_address: String,
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
    pub has_password: bool,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl From<email::Model> for EmailView {
    fn from(e: email::Model) -> Self {
        Self {
            has_password: e.password_hash.is_some(),
            id: e.id,
            email_internal_id: e.email_internal_id,
            email_address: e.email_address,
            source: e.source,
            category: e.category,
            parent_email_id: e.parent_email_id,
            credit_card_last4: e.credit_card_last4,
            is_sp_account: e.is_sp_account,
            payer_id: e.payer_id,
            linked_account_name: e.linked_account_name,
            linked_account_uid: e.linked_account_uid,
            enable_forwarding: e.enable_forwarding,
            status: e.status,
            labels: e.labels,
            remarks: e.remarks,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}

#[instrument(skip(db))]
pub async fn list(db: &DatabaseConnection, q: &EmailQuery) -> Result<Page<EmailView>, ServiceError> {
    let mut cond = Condition::all();
    if let Some(s) = filled(&q.search) {
        cond = cond.add(
            Condition::any()
                .add(contains_ci((email::Entity, email::Column::EmailAddress), s))
                .add(contains_ci((email::Entity, email::Column::EmailInternalId), s))
                .add(contains_ci((email::Entity, email::Column::Source), s))
                .add(contains_ci((email::Entity, email::Column::Remarks), s)),
        );
    }
    if let Some(c) = filled(&q.category) {
        cond = cond.add(eq_ci((email::Entity, email::Column::Category), c));
    }
    if let Some(s) = filled(&q.status) {
        cond = cond.add(eq_ci((email::Entity, email::Column::Status), s));
    }
    if let Some(label) = filled(&q.label) {
        cond = cond.add(array_contains("\"email\".\"labels\"", label));
    }
    let sort_col = match q.sort_by.as_deref().map(str::trim) {
        Some("email_address") => email::Column::EmailAddress,
        Some("email_internal_id") => email::Column::EmailInternalId,
        Some("updated_at") => email::Column::UpdatedAt,
        _ => email::Column::CreatedAt,
    };
    let order = SortOrder::parse(q.sort_order.as_deref(), SortOrder::Desc);
    let pg = Pagination::new(q.page, q.page_size);
    let (idx, per) = pg.normalize();
    let paginator = email::Entity::find()
        .filter(cond)
        .order_by(sort_col, order.order())
        .order_by_asc(email::Column::Id)
        .paginate(db, per);
    let total = paginator.num_items().await.map_err(ServiceError::from_db)?;
    let rows = paginator.fetch_page(idx).await.map_err(ServiceError::from_db)?;
    Ok(pg.page_of(total, rows.into_iter().map(EmailView::from).collect()))
}

async fn find_by_internal_id<C: ConnectionTrait>(db: &C, internal_id: &str) -> Result<email::Model, ServiceError> {
    email::Entity::find()
        .filter(email::Column::EmailInternalId.eq(internal_id.trim()))
        .one(db)
        .await
        .map_err(ServiceError::from_db)?
        .ok_or_else(|| ServiceError::not_found("email"))
}

pub async fn get(db: &DatabaseConnection, internal_id: &str) -> Result<EmailView, ServiceError> {
    find_by_internal_id(db, internal_id).await.map(EmailView::from)
}

/// Secondary mailboxes hang off a primary one.
async fn resolve_parent<C: ConnectionTrait>(db: &C, input: &EmailInput) -> Result<email::Model, ServiceError> {
    let parent = match (input.parent_email_id, validation::non_blank(input.parent_email_address.as_deref())) {
        (Some(id), _) => email::Entity::find_by_id(id).one(db).await.map_err(ServiceError::from_db)?,
        (None, Some(addr)) => find_email_by_address(db, &addr).await?,
        (None, None) => {
            return Err(ServiceError::Validation("secondary 邮箱需要指定 parent_email_id 或 parent_email_address".into()))
        }
    };
    match parent {
        Some(p) if p.category.eq_ignore_ascii_case(email::CATEGORY_PRIMARY) => Ok(p),
        Some(_) => Err(ServiceError::Validation("父邮箱必须是 primary 类型".into())),
        None => Err(ServiceError::Validation("父邮箱不存在".into())),
    }
}

fn check_last4(v: &Option<String>) -> Result<Option<String>, ServiceError> {
    match validation::non_blank(v.as_deref()) {
        Some(d) => {
            validate_four_digits("credit_card_last4", &d)?;
            Ok(Some(d))
        }
        None => Ok(None),
    }
}

#[instrument(skip(db, op, input), fields(operator = %op.email))]
pub async fn create(db: &DatabaseConnection, op: &Operator, input: EmailInput) -> Result<EmailView, ServiceError> {
    let address = validation::non_blank(input.email_address.as_deref()).ok_or_else(|| ServiceError::required("email_address"))?;
    validation::validate_email(&address)?;
    let category = email::normalize_category(input.category.as_deref())?;
    let last4 = check_last4(&input.credit_card_last4)?;
    let password_hash = match validation::non_blank(input.password.as_deref()) {
        Some(p) => Some(hash_password(&p)?),
        None => None,
    };

    let txn = db.begin().await.map_err(ServiceError::from_db)?;
    if find_email_by_address(&txn, &address).await?.is_some() {
        return Err(ServiceError::Conflict(format!("邮箱已存在: {address}")));
    }
    let parent_email_id = if category == email::CATEGORY_SECONDARY {
        Some(resolve_parent(&txn, &input).await?.id)
    } else {
        None
    };
    let payer_id = match validation::non_blank(input.payer_id.as_deref()) {
        Some(k) => Some(
            payer_service::resolve(&txn, &k)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("Payer not found: {k}")))?
                .id,
        ),
        None => None,
    };
    let internal_id = next_internal_id::<email::Entity, _>(&txn, email::Column::EmailInternalId, IdKind::Email).await?;
    let now = Utc::now().into();
    let saved = email::ActiveModel {
        id: Set(Uuid::new_v4()),
        email_internal_id: Set(internal_id),
        email_address: Set(address),
        password_hash: Set(password_hash),
        source: Set(validation::non_blank(input.source.as_deref())),
        category: Set(category),
        parent_email_id: Set(parent_email_id),
        credit_card_last4: Set(last4),
        is_sp_account: Set(input.is_sp_account.unwrap_or(false)),
        payer_id: Set(payer_id),
        linked_account_name: Set(None),
        linked_account_uid: Set(None),
        enable_forwarding: Set(input.enable_forwarding.unwrap_or(false)),
        status: Set(validation::non_blank(input.status.as_deref()).unwrap_or_else(|| email::STATUS_ACTIVE.into())),
        labels: Set(input.labels.unwrap_or_default()),
        remarks: Set(validation::non_blank(input.remarks.as_deref())),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await
    .map_err(ServiceError::from_db)?;
    operation_log_service::record(&txn, op, ACTION_CREATE, "email", &saved.email_internal_id, &format!("新增邮箱: {}", saved.email_address)).await?;
    txn.commit().await.map_err(ServiceError::from_db)?;
    info!(email_internal_id = %saved.email_internal_id, "email created");
    Ok(saved.into())
}

/// Partial update of the mutable mailbox attributes.
#[instrument(skip(db, op, input), fields(operator = %op.email))]
pub async fn update(db: &DatabaseConnection, op: &Operator, internal_id: &str, input: EmailInput) -> Result<EmailView, ServiceError> {
    let last4 = check_last4(&input.credit_card_last4)?;
    let txn = db.begin().await.map_err(ServiceError::from_db)?;
    let existing = find_by_internal_id(&txn, internal_id).await?;
    let mut am: email::ActiveModel = existing.into();
    if let Some(v) = validation::non_blank(input.status.as_deref()) { am.status = Set(v); }
    if let Some(v) = input.remarks { am.remarks = Set(validation::non_blank(Some(&v))); }
    if let Some(v) = input.labels { am.labels = Set(v); }
    if let Some(v) = input.enable_forwarding { am.enable_forwarding = Set(v); }
    if let Some(v) = validation::non_blank(input.source.as_deref()) { am.source = Set(Some(v)); }
    if let Some(v) = last4 { am.credit_card_last4 = Set(Some(v)); }
    if let Some(v) = input.is_sp_account { am.is_sp_account = Set(v); }
    if let Some(p) = validation::non_blank(input.password.as_deref()) { am.password_hash = Set(Some(hash_password(&p)?)); }
    am.updated_at = Set(Utc::now().into());
    let saved = am.update(&txn).await.map_err(ServiceError::from_db)?;
    operation_log_service::record(&txn, op, ACTION_UPDATE, "email", &saved.email_internal_id, &format!("更新邮箱: {}", saved.email_address)).await?;
    txn.commit().await.map_err(ServiceError::from_db)?;
    Ok(saved.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{admin, get_db, tag};

    #[tokio::test]
    async fn secondary_needs_primary_parent() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let op = admin();
        let t = tag();

        let normal = create(&db, &op, EmailInput { email_address: Some(format!("n_{t}@example.com")), ..Default::default() }).await?;
        assert_eq!(normal.category, "normal");
        assert_eq!(normal.status, "active");
        assert!(normal.email_internal_id.starts_with("email_"));

        let dup = create(&db, &op, EmailInput { email_address: Some(format!("N_{t}@EXAMPLE.com")), ..Default::default() }).await;
        assert_eq!(dup.unwrap_err().code(), 409);

        let orphan = EmailInput { email_address: Some(format!("s_{t}@example.com")), category: Some("secondary".into()), ..Default::default() };
        assert_eq!(create(&db, &op, orphan.clone()).await.unwrap_err().code(), 400);
        let wrong_parent = EmailInput { parent_email_id: Some(normal.id), ..orphan.clone() };
        assert_eq!(create(&db, &op, wrong_parent).await.unwrap_err().code(), 400);

        let primary = create(&db, &op, EmailInput {
            email_address: Some(format!("p_{t}@example.com")),
            category: Some("PRIMARY".into()),
            password: Some("mailbox-pass".into()),
            ..Default::default()
        })
        .await?;
        assert!(primary.has_password);
        let child = create(&db, &op, EmailInput { parent_email_address: Some(primary.email_address.clone()), ..orphan }).await?;
        assert_eq!(child.parent_email_id, Some(primary.id));

        let upd = update(&db, &op, &normal.email_internal_id, EmailInput { status: Some("inactive".into()), credit_card_last4: Some("1234".into()), ..Default::default() }).await?;
        assert_eq!(upd.status, "inactive");
        assert_eq!(upd.credit_card_last4.as_deref(), Some("1234"));

        let page = list(&db, &EmailQuery { search: Some(format!("_{t}@")), category: Some("secondary".into()), ..Default::default() }).await?;
        assert_eq!(page.total, 1);

        email::Entity::delete_many().filter(email::Column::Id.is_in([normal.id, primary.id, child.id])).exec(&db).await?;
        Ok(())
    }
}
