//! Payers: the billing accounts that settle cloud vendor invoices.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    sea_query::{Condition, Query},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use common::types::Page;
use models::{account, operation_log::{ACTION_CREATE, ACTION_UPDATE}, payer, validation};
use crate::auth::password::hash_password;
use crate::internal_id::{next_internal_id, IdKind};
use crate::query::{array_contains, contains_ci, filled};
use crate::{context::Operator, errors::ServiceError, operation_log_service, pagination::{Pagination, SortOrder}};

#[derive(Debug, Default, Clone, Deserialize)]
pub struct PayerQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub search: Option<String>,
    pub label: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct PayerInput {
    pub payer_name: Option<String>,
    pub payer_id: Option<String>,
    pub signin_url: Option<String>,
    pub iam_username: Option<String>,
    pub password: Option<String>,
    pub contact_email: Option<String>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PayerAccount {
    pub account_id: String,
    pub account_name: String,
    pub uid: String,
    pub bound_email: Option<String>,
    pub monitor_email: Option<String>,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PayerView {
    pub id: Uuid,
    pub payer_internal_id: String,
    pub payer_name: String,
    pub payer_id: String,
    pub signin_url: Option<String>,
    pub iam_username: Option<String>,
    pub contact_email: Option<String>,
    pub remarks: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    pub accounts: Vec<PayerAccount>,
}

impl PayerView {
    fn build(p: payer::Model, accounts: Vec<account::Model>) -> Self {
        Self {
            id: p.id,
            payer_internal_id: p.payer_internal_id,
            payer_name: p.payer_name,
            payer_id: p.payer_id,
            signin_url: p.signin_url,
            iam_username: p.iam_username,
            contact_email: p.contact_email,
            remarks: p.remarks,
            created_at: p.created_at,
            updated_at: p.updated_at,
            accounts: accounts
                .into_iter()
                .map(|a| PayerAccount {
                    account_id: a.account_internal_id,
                    account_name: a.account_name,
                    uid: a.uid,
                    bound_email: a.bound_email,
                    monitor_email: a.monitor_email,
                    labels: a.labels,
                })
                .collect(),
        }
    }
}

/// Compact payer reference embedded in other views.
#[derive(Debug, Clone, Serialize)]
pub struct PayerSummary {
    pub id: Uuid,
    pub payer_internal_id: String,
    pub payer_id: String,
    pub payer_name: String,
}

impl From<&payer::Model> for PayerSummary {
    fn from(p: &payer::Model) -> Self {
        Self { id: p.id, payer_internal_id: p.payer_internal_id.clone(), payer_id: p.payer_id.clone(), payer_name: p.payer_name.clone() }
    }
}

/// Look a payer up by internal id first, then by vendor payer id.
pub async fn resolve<C: ConnectionTrait>(db: &C, key: &str) -> Result<Option<payer::Model>, ServiceError> {
    let key = key.trim();
    if key.is_empty() {
        return Ok(None);
    }
    if let Some(p) = payer::Entity::find()
        .filter(payer::Column::PayerInternalId.eq(key))
        .one(db)
        .await
        .map_err(ServiceError::from_db)?
    {
        return Ok(Some(p));
    }
    payer::Entity::find()
        .filter(payer::Column::PayerId.eq(key))
        .one(db)
        .await
        .map_err(ServiceError::from_db)
}

fn accounts_where(cond: Condition) -> sea_orm::sea_query::SelectStatement {
    Query::select()
        .column(account::Column::PayerId)
        .from(account::Entity)
        .cond_where(cond)
        .to_owned()
}

async fn accounts_by_payer<C: ConnectionTrait>(db: &C, ids: Vec<Uuid>) -> Result<HashMap<Uuid, Vec<account::Model>>, ServiceError> {
    let mut out: HashMap<Uuid, Vec<account::Model>> = HashMap::new();
    if ids.is_empty() {
        return Ok(out);
    }
    let rows = account::Entity::find()
        .filter(account::Column::PayerId.is_in(ids))
        .order_by_asc(account::Column::CreatedAt)
        .all(db)
        .await
        .map_err(ServiceError::from_db)?;
    for a in rows {
        if let Some(pid) = a.payer_id {
            out.entry(pid).or_default().push(a);
        }
    }
    Ok(out)
}

#[instrument(skip(db))]
pub async fn list(db: &DatabaseConnection, q: &PayerQuery) -> Result<Page<PayerView>, ServiceError> {
    let mut cond = Condition::all();
    if let Some(s) = filled(&q.search) {
        let linked = Condition::any()
            .add(contains_ci((account::Entity, account::Column::AccountName), s))
            .add(contains_ci((account::Entity, account::Column::BoundEmail), s))
            .add(contains_ci((account::Entity, account::Column::MonitorEmail), s));
        cond = cond.add(
            Condition::any()
                .add(contains_ci((payer::Entity, payer::Column::PayerName), s))
                .add(contains_ci((payer::Entity, payer::Column::PayerId), s))
                .add(contains_ci((payer::Entity, payer::Column::ContactEmail), s))
                .add(payer::Column::Id.in_subquery(accounts_where(linked))),
        );
    }
    if let Some(label) = filled(&q.label) {
        let labelled = Condition::all().add(array_contains("\"account\".\"labels\"", label));
        cond = cond.add(payer::Column::Id.in_subquery(accounts_where(labelled)));
    }
    let sort_col = match q.sort_by.as_deref().map(str::trim) {
        Some("payer_name") => payer::Column::PayerName,
        Some("payer_id") => payer::Column::PayerId,
        Some("payer_internal_id") => payer::Column::PayerInternalId,
        _ => payer::Column::CreatedAt,
    };
    let order = SortOrder::parse(q.sort_order.as_deref(), SortOrder::Asc);
    let pg = Pagination::new(q.page, q.page_size);
    let (idx, per) = pg.normalize();
    let paginator = payer::Entity::find()
        .filter(cond)
        .order_by(sort_col, order.order())
        .order_by_asc(payer::Column::Id)
        .paginate(db, per);
    let total = paginator.num_items().await.map_err(ServiceError::from_db)?;
    let payers = paginator.fetch_page(idx).await.map_err(ServiceError::from_db)?;

    let mut grouped = accounts_by_payer(db, payers.iter().map(|p| p.id).collect()).await?;
    let list = payers
        .into_iter()
        .map(|p| {
            let accounts = grouped.remove(&p.id).unwrap_or_default();
            PayerView::build(p, accounts)
        })
        .collect();
    Ok(pg.page_of(total, list))
}

pub async fn get(db: &DatabaseConnection, payer_internal_id: &str) -> Result<PayerView, ServiceError> {
    let p = payer::Entity::find()
        .filter(payer::Column::PayerInternalId.eq(payer_internal_id.trim()))
        .one(db)
        .await
        .map_err(ServiceError::from_db)?
        .ok_or_else(|| ServiceError::not_found("payer"))?;
    let mut grouped = accounts_by_payer(db, vec![p.id]).await?;
    let accounts = grouped.remove(&p.id).unwrap_or_default();
    Ok(PayerView::build(p, accounts))
}

fn checked_signin_url(raw: Option<&str>) -> Result<Option<String>, ServiceError> {
    match validation::non_blank(raw) {
        Some(url) => {
            let url = validation::sanitize_url(&url);
            validation::validate_signin_url(&url)?;
            Ok(Some(url))
        }
        None => Ok(None),
    }
}

async fn ensure_payer_id_free<C: ConnectionTrait>(db: &C, payer_id: &str, except: Option<Uuid>) -> Result<(), ServiceError> {
    let mut find = payer::Entity::find().filter(payer::Column::PayerId.eq(payer_id));
    if let Some(id) = except {
        find = find.filter(payer::Column::Id.ne(id));
    }
    if find.count(db).await.map_err(ServiceError::from_db)? > 0 {
        return Err(ServiceError::Conflict(format!("payer_id {payer_id} 已存在")));
    }
    Ok(())
}

#[instrument(skip(db, op, input), fields(operator = %op.email))]
pub async fn create(db: &DatabaseConnection, op: &Operator, input: PayerInput) -> Result<PayerView, ServiceError> {
    let payer_name = validation::non_blank(input.payer_name.as_deref()).ok_or_else(|| ServiceError::required("payer_name"))?;
    let payer_id = validation::non_blank(input.payer_id.as_deref()).ok_or_else(|| ServiceError::required("payer_id"))?;
    let signin_url = checked_signin_url(input.signin_url.as_deref())?;
    if let Some(e) = validation::non_blank(input.contact_email.as_deref()) {
        validation::validate_email(&e)?;
    }
    let password_hash = match validation::non_blank(input.password.as_deref()) {
        Some(p) => Some(hash_password(&p)?),
        None => None,
    };

    let txn = db.begin().await.map_err(ServiceError::from_db)?;
    ensure_payer_id_free(&txn, &payer_id, None).await?;
    let internal_id = next_internal_id::<payer::Entity, _>(&txn, payer::Column::PayerInternalId, IdKind::Payer).await?;
    let now = Utc::now().into();
    let created = payer::ActiveModel {
        id: Set(Uuid::new_v4()),
        payer_internal_id: Set(internal_id),
        payer_name: Set(payer_name),
        payer_id: Set(payer_id),
        signin_url: Set(signin_url),
        iam_username: Set(validation::non_blank(input.iam_username.as_deref())),
        password_hash: Set(password_hash),
        contact_email: Set(validation::non_blank(input.contact_email.as_deref())),
        remarks: Set(validation::non_blank(input.remarks.as_deref())),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await
    .map_err(ServiceError::from_db)?;
    operation_log_service::record(
        &txn,
        op,
        ACTION_CREATE,
        "payer",
        &created.payer_internal_id,
        &format!("新增 Payer {} ({})", created.payer_name, created.payer_id),
    )
    .await?;
    txn.commit().await.map_err(ServiceError::from_db)?;
    info!(payer_internal_id = %created.payer_internal_id, "payer created");
    Ok(PayerView::build(created, vec![]))
}

#[instrument(skip(db, op, input), fields(operator = %op.email))]
pub async fn update(db: &DatabaseConnection, op: &Operator, payer_internal_id: &str, input: PayerInput) -> Result<PayerView, ServiceError> {
    let txn = db.begin().await.map_err(ServiceError::from_db)?;
    let existing = payer::Entity::find()
        .filter(payer::Column::PayerInternalId.eq(payer_internal_id.trim()))
        .one(&txn)
        .await
        .map_err(ServiceError::from_db)?
        .ok_or_else(|| ServiceError::not_found("payer"))?;
    let id = existing.id;
    let mut am: payer::ActiveModel = existing.into();
    let mut changed = Vec::new();

    if let Some(name) = validation::non_blank(input.payer_name.as_deref()) {
        am.payer_name = Set(name);
        changed.push("payer_name");
    }
    if let Some(pid) = validation::non_blank(input.payer_id.as_deref()) {
        ensure_payer_id_free(&txn, &pid, Some(id)).await?;
        am.payer_id = Set(pid);
        changed.push("payer_id");
    }
    if let Some(url) = checked_signin_url(input.signin_url.as_deref())? {
        am.signin_url = Set(Some(url));
        changed.push("signin_url");
    }
    if let Some(v) = validation::non_blank(input.iam_username.as_deref()) {
        am.iam_username = Set(Some(v));
        changed.push("iam_username");
    }
    if let Some(p) = validation::non_blank(input.password.as_deref()) {
        am.password_hash = Set(Some(hash_password(&p)?));
        changed.push("password");
    }
    if let Some(e) = validation::non_blank(input.contact_email.as_deref()) {
        validation::validate_email(&e)?;
        am.contact_email = Set(Some(e));
        changed.push("contact_email");
    }
    if let Some(r) = input.remarks {
        am.remarks = Set(validation::non_blank(Some(&r)));
        changed.push("remarks");
    }
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(&txn).await.map_err(ServiceError::from_db)?;
    operation_log_service::record(
        &txn,
        op,
        ACTION_UPDATE,
        "payer",
        &updated.payer_internal_id,
        &format!("更新 Payer 字段: {}", changed.join(", ")),
    )
    .await?;
    txn.commit().await.map_err(ServiceError::from_db)?;
    get(db, &updated.payer_internal_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{admin, get_db, tag};

    fn input(name: &str, payer_id: &str) -> PayerInput {
        PayerInput { payer_name: Some(name.into()), payer_id: Some(payer_id.into()), ..Default::default() }
    }

    #[test]
    fn signin_url_is_sanitized_then_checked() {
        let ok = checked_signin_url(Some(" `https://123456789012.signin.aws.amazon.com/console` ")).unwrap();
        assert_eq!(ok.as_deref(), Some("https://123456789012.signin.aws.amazon.com/console"));
        assert!(checked_signin_url(Some("https://evil.example.com")).is_err());
        assert_eq!(checked_signin_url(Some("  ")).unwrap(), None);
    }

    #[tokio::test]
    async fn create_list_update() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let t = tag();
        let op = admin();

        let missing = create(&db, &op, PayerInput { payer_name: Some("x".into()), ..Default::default() }).await.unwrap_err();
        assert_eq!(missing.code(), 400);

        let p = create(&db, &op, PayerInput { password: Some("pw".into()), ..input(&format!("Payer {t}"), &format!("P{t}")) }).await?;
        assert!(p.payer_internal_id.starts_with("payer_"));
        let dup = create(&db, &op, input("other", &format!("P{t}"))).await.unwrap_err();
        assert_eq!(dup.code(), 409);

        let page = list(&db, &PayerQuery { search: Some(t.to_uppercase()), ..Default::default() }).await?;
        assert_eq!(page.total, 1);
        assert_eq!(page.list[0].payer_id, format!("P{t}"));

        let by_vendor_id = resolve(&db, &format!("P{t}")).await?.map(|x| x.id);
        assert_eq!(by_vendor_id, Some(p.id));

        let upd = update(&db, &op, &p.payer_internal_id, PayerInput { remarks: Some("note".into()), ..Default::default() }).await?;
        assert_eq!(upd.remarks.as_deref(), Some("note"));
        assert_eq!(upd.payer_name, format!("Payer {t}"));

        payer::Entity::delete_by_id(p.id).exec(&db).await?;
        Ok(())
    }
}
