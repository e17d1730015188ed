//! Customers and the vendor uids they own.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    sea_query::{Condition, Expr},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use common::types::Page;
use models::{account, customer, customer_uid, operation_log::{ACTION_CREATE, ACTION_UPDATE}, payer, validation};
use crate::internal_id::{next_internal_id, IdKind};
use crate::payer_service::{self, PayerSummary};
use crate::query::{array_contains, contains_ci, eq_ci, filled};
use crate::{context::Operator, errors::ServiceError, operation_log_service, pagination::{Pagination, SortOrder}};

#[derive(Debug, Default, Clone, Deserialize)]
pub struct CustomerQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub label: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize, PartialEq)]
pub struct UidInput {
    pub uid: Option<String>,
    pub uid_type: Option<String>,
    pub is_primary: Option<bool>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct CustomerInput {
    pub customer_name: Option<String>,
    pub email: Option<String>,
    pub payer_id: Option<String>,
    pub permissions: Option<Vec<String>>,
    pub original_billing_percentage: Option<f64>,
    pub products_used: Option<Vec<String>>,
    pub delivery_time: Option<String>,
    pub company: Option<String>,
    pub status: Option<String>,
    pub labels: Option<Vec<String>>,
    pub remarks: Option<String>,
    pub uids: Option<Vec<UidInput>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UidView {
    pub uid: String,
    pub uid_type: String,
    pub is_primary: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerView {
    pub id: Uuid,
    pub customer_internal_id: String,
    pub customer_name: String,
    pub email: String,
    pub permissions: Vec<String>,
    pub original_billing_percentage: Option<f64>,
    pub products_used: Vec<String>,
    pub delivery_time: Option<String>,
    pub company: Option<String>,
    pub status: String,
    pub labels: Vec<String>,
    pub remarks: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    pub payer: Option<PayerSummary>,
    pub uids: Vec<UidView>,
    pub account_count: u64,
}

/// A validated uid row ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanUid {
    pub uid: String,
    pub uid_type: String,
    pub is_primary: bool,
    pub description: Option<String>,
}

/// Every uid needs `uid` and `uid_type`; `uid_type:uid` pairs must be unique.
pub fn validate_uids(uids: &[UidInput]) -> Result<Vec<CleanUid>, ServiceError> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(uids.len());
    for u in uids {
        let uid = validation::non_blank(u.uid.as_deref()).ok_or_else(|| ServiceError::required("uids.uid"))?;
        let uid_type = validation::non_blank(u.uid_type.as_deref()).ok_or_else(|| ServiceError::required("uids.uid_type"))?;
        let key = format!("{uid_type}:{uid}");
        if !seen.insert(key.clone()) {
            return Err(ServiceError::Validation(format!("uids 存在重复: {key}")));
        }
        out.push(CleanUid { uid, uid_type, is_primary: u.is_primary.unwrap_or(false), description: validation::non_blank(u.description.as_deref()) });
    }
    Ok(out)
}

fn check_percentage(v: Option<f64>) -> Result<(), ServiceError> {
    if let Some(p) = v {
        validation::validate_percentage("original_billing_percentage", p)?;
    }
    Ok(())
}

async fn ensure_unique<C: ConnectionTrait>(db: &C, column: customer::Column, field: &str, value: &str, except: Option<Uuid>) -> Result<(), ServiceError> {
    let mut find = customer::Entity::find().filter(eq_ci((customer::Entity, column), value));
    if let Some(id) = except {
        find = find.filter(customer::Column::Id.ne(id));
    }
    if find.count(db).await.map_err(ServiceError::from_db)? > 0 {
        return Err(ServiceError::Conflict(format!("{field} 已存在: {value}")));
    }
    Ok(())
}

async fn require_payer_opt<C: ConnectionTrait>(db: &C, key: Option<&str>) -> Result<Option<payer::Model>, ServiceError> {
    match validation::non_blank(key) {
        Some(k) => payer_service::resolve(db, &k)
            .await?
            .map(Some)
            .ok_or_else(|| ServiceError::NotFound(format!("Payer not found: {k}"))),
        None => Ok(None),
    }
}

async fn replace_uids<C: ConnectionTrait>(db: &C, customer_id: Uuid, uids: Vec<CleanUid>) -> Result<(), ServiceError> {
    customer_uid::Entity::delete_many()
        .filter(customer_uid::Column::CustomerId.eq(customer_id))
        .exec(db)
        .await
        .map_err(ServiceError::from_db)?;
    if uids.is_empty() {
        return Ok(());
    }
    let now: DateTime<FixedOffset> = Utc::now().into();
    let rows = uids.into_iter().map(|u| customer_uid::ActiveModel {
        id: Set(Uuid::new_v4()),
        customer_id: Set(customer_id),
        uid: Set(u.uid),
        uid_type: Set(u.uid_type),
        is_primary: Set(u.is_primary),
        description: Set(u.description),
        created_at: Set(now),
    });
    customer_uid::Entity::insert_many(rows).exec(db).await.map_err(ServiceError::from_db)?;
    Ok(())
}

async fn build_views<C: ConnectionTrait>(db: &C, customers: Vec<customer::Model>) -> Result<Vec<CustomerView>, ServiceError> {
    let ids: Vec<Uuid> = customers.iter().map(|c| c.id).collect();
    let payer_ids: Vec<Uuid> = customers.iter().filter_map(|c| c.payer_id).collect();

    let mut uids: HashMap<Uuid, Vec<UidView>> = HashMap::new();
    for u in customer_uid::Entity::find()
        .filter(customer_uid::Column::CustomerId.is_in(ids.clone()))
        .order_by_asc(customer_uid::Column::CreatedAt)
        .all(db)
        .await
        .map_err(ServiceError::from_db)?
    {
        uids.entry(u.customer_id).or_default().push(UidView { uid: u.uid, uid_type: u.uid_type, is_primary: u.is_primary, description: u.description });
    }
    let payers: HashMap<Uuid, payer::Model> = payer::Entity::find()
        .filter(payer::Column::Id.is_in(payer_ids))
        .all(db)
        .await
        .map_err(ServiceError::from_db)?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();
    let counts: HashMap<Uuid, i64> = account::Entity::find()
        .select_only()
        .column(account::Column::CustomerId)
        .column_as(Expr::col(account::Column::Id).count(), "n")
        .filter(account::Column::CustomerId.is_in(ids))
        .group_by(account::Column::CustomerId)
        .into_tuple::<(Option<Uuid>, i64)>()
        .all(db)
        .await
        .map_err(ServiceError::from_db)?
        .into_iter()
        .filter_map(|(id, n)| id.map(|id| (id, n)))
        .collect();

    Ok(customers
        .into_iter()
        .map(|c| CustomerView {
            payer: c.payer_id.and_then(|id| payers.get(&id)).map(PayerSummary::from),
            uids: uids.remove(&c.id).unwrap_or_default(),
            account_count: counts.get(&c.id).copied().unwrap_or(0).max(0) as u64,
            id: c.id,
            customer_internal_id: c.customer_internal_id,
            customer_name: c.customer_name,
            email: c.email,
            permissions: c.permissions,
            original_billing_percentage: c.original_billing_percentage,
            products_used: c.products_used,
            delivery_time: c.delivery_time,
            company: c.company,
            status: c.status,
            labels: c.labels,
            remarks: c.remarks,
            created_at: c.created_at,
            updated_at: c.updated_at,
        })
        .collect())
}

#[instrument(skip(db))]
pub async fn list(db: &DatabaseConnection, q: &CustomerQuery) -> Result<Page<CustomerView>, ServiceError> {
    let mut cond = Condition::all();
    if let Some(s) = filled(&q.search) {
        cond = cond.add(
            Condition::any()
                .add(contains_ci((customer::Entity, customer::Column::CustomerName), s))
                .add(contains_ci((customer::Entity, customer::Column::Email), s))
                .add(contains_ci((customer::Entity, customer::Column::CustomerInternalId), s))
                .add(contains_ci((customer::Entity, customer::Column::Company), s)),
        );
    }
    if let Some(status) = filled(&q.status) {
        cond = cond.add(eq_ci((customer::Entity, customer::Column::Status), status));
    }
    if let Some(label) = filled(&q.label) {
        cond = cond.add(array_contains("\"customer\".\"labels\"", label));
    }
    let sort_col = match q.sort_by.as_deref().map(str::trim) {
        Some("customer_name") => customer::Column::CustomerName,
        Some("customer_internal_id") => customer::Column::CustomerInternalId,
        Some("email") => customer::Column::Email,
        Some("updated_at") => customer::Column::UpdatedAt,
        _ => customer::Column::CreatedAt,
    };
    let order = SortOrder::parse(q.sort_order.as_deref(), SortOrder::Asc);
    let pg = Pagination::new(q.page, q.page_size);
    let (idx, per) = pg.normalize();
    let paginator = customer::Entity::find()
        .filter(cond)
        .order_by(sort_col, order.order())
        .order_by_asc(customer::Column::Id)
        .paginate(db, per);
    let total = paginator.num_items().await.map_err(ServiceError::from_db)?;
    let rows = paginator.fetch_page(idx).await.map_err(ServiceError::from_db)?;
    Ok(pg.page_of(total, build_views(db, rows).await?))
}

async fn find_by_internal_id<C: ConnectionTrait>(db: &C, internal_id: &str) -> Result<customer::Model, ServiceError> {
    customer::Entity::find()
        .filter(customer::Column::CustomerInternalId.eq(internal_id.trim()))
        .one(db)
        .await
        .map_err(ServiceError::from_db)?
        .ok_or_else(|| ServiceError::not_found("customer"))
}

pub async fn get(db: &DatabaseConnection, internal_id: &str) -> Result<CustomerView, ServiceError> {
    let c = find_by_internal_id(db, internal_id).await?;
    build_views(db, vec![c]).await?.pop().ok_or_else(|| ServiceError::not_found("customer"))
}

#[instrument(skip(db, op, input), fields(operator = %op.email))]
pub async fn create(db: &DatabaseConnection, op: &Operator, input: CustomerInput) -> Result<CustomerView, ServiceError> {
    let name = validation::non_blank(input.customer_name.as_deref()).ok_or_else(|| ServiceError::required("customer_name"))?;
    let email = validation::non_blank(input.email.as_deref()).ok_or_else(|| ServiceError::required("email"))?;
    validation::validate_email(&email)?;
    check_percentage(input.original_billing_percentage)?;
    let uids = validate_uids(input.uids.as_deref().unwrap_or_default())?;

    let txn = db.begin().await.map_err(ServiceError::from_db)?;
    ensure_unique(&txn, customer::Column::Email, "email", &email, None).await?;
    ensure_unique(&txn, customer::Column::CustomerName, "customer_name", &name, None).await?;
    let payer = require_payer_opt(&txn, input.payer_id.as_deref()).await?;
    let internal_id = next_internal_id::<customer::Entity, _>(&txn, customer::Column::CustomerInternalId, IdKind::Customer).await?;
    let now = Utc::now().into();
    let saved = customer::ActiveModel {
        id: Set(Uuid::new_v4()),
        customer_internal_id: Set(internal_id),
        customer_name: Set(name),
        email: Set(email),
        payer_id: Set(payer.map(|p| p.id)),
        permissions: Set(input.permissions.unwrap_or_default()),
        original_billing_percentage: Set(input.original_billing_percentage),
        products_used: Set(input.products_used.unwrap_or_default()),
        delivery_time: Set(validation::non_blank(input.delivery_time.as_deref())),
        company: Set(validation::non_blank(input.company.as_deref())),
        status: Set(validation::non_blank(input.status.as_deref()).unwrap_or_else(|| customer::STATUS_ACTIVE.into())),
        labels: Set(input.labels.unwrap_or_default()),
        remarks: Set(validation::non_blank(input.remarks.as_deref())),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await
    .map_err(ServiceError::from_db)?;
    replace_uids(&txn, saved.id, uids).await?;
    operation_log_service::record(&txn, op, ACTION_CREATE, "customer", &saved.customer_internal_id, &format!("创建客户: {}", saved.customer_name)).await?;
    txn.commit().await.map_err(ServiceError::from_db)?;
    info!(customer_internal_id = %saved.customer_internal_id, "customer created");
    get(db, &saved.customer_internal_id).await
}

#[instrument(skip(db, op, input), fields(operator = %op.email))]
pub async fn update(db: &DatabaseConnection, op: &Operator, internal_id: &str, input: CustomerInput) -> Result<CustomerView, ServiceError> {
    check_percentage(input.original_billing_percentage)?;
    let uids = match &input.uids {
        Some(list) => Some(validate_uids(list)?),
        None => None,
    };
    let txn = db.begin().await.map_err(ServiceError::from_db)?;
    let existing = find_by_internal_id(&txn, internal_id).await?;
    let id = existing.id;
    let mut am: customer::ActiveModel = existing.into();

    if let Some(name) = validation::non_blank(input.customer_name.as_deref()) {
        ensure_unique(&txn, customer::Column::CustomerName, "customer_name", &name, Some(id)).await?;
        am.customer_name = Set(name);
    }
    if let Some(email) = validation::non_blank(input.email.as_deref()) {
        validation::validate_email(&email)?;
        ensure_unique(&txn, customer::Column::Email, "email", &email, Some(id)).await?;
        am.email = Set(email);
    }
    if let Some(p) = require_payer_opt(&txn, input.payer_id.as_deref()).await? {
        am.payer_id = Set(Some(p.id));
    }
    if let Some(v) = input.permissions { am.permissions = Set(v); }
    if let Some(v) = input.original_billing_percentage { am.original_billing_percentage = Set(Some(v)); }
    if let Some(v) = input.products_used { am.products_used = Set(v); }
    if let Some(v) = validation::non_blank(input.delivery_time.as_deref()) { am.delivery_time = Set(Some(v)); }
    if let Some(v) = validation::non_blank(input.company.as_deref()) { am.company = Set(Some(v)); }
    if let Some(v) = validation::non_blank(input.status.as_deref()) { am.status = Set(v); }
    if let Some(v) = input.labels { am.labels = Set(v); }
    if let Some(v) = input.remarks { am.remarks = Set(validation::non_blank(Some(&v))); }
    am.updated_at = Set(Utc::now().into());
    let saved = am.update(&txn).await.map_err(ServiceError::from_db)?;
    if let Some(uids) = uids {
        replace_uids(&txn, saved.id, uids).await?;
    }
    operation_log_service::record(&txn, op, ACTION_UPDATE, "customer", &saved.customer_internal_id, &format!("更新客户: {}", saved.customer_name)).await?;
    txn.commit().await.map_err(ServiceError::from_db)?;
    get(db, &saved.customer_internal_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{admin, get_db, tag};

    fn uid(u: &str, t: &str) -> UidInput {
        UidInput { uid: Some(u.into()), uid_type: Some(t.into()), is_primary: None, description: None }
    }

    #[test]
    fn uid_validation() {
        assert_eq!(validate_uids(&[uid("1", "AWS"), uid("1", "AZURE")]).unwrap().len(), 2);
        let dup = validate_uids(&[uid("1", "AWS"), uid(" 1 ", "AWS")]).unwrap_err();
        assert!(dup.to_string().contains("AWS:1"));
        assert_eq!(validate_uids(&[uid("", "AWS")]).unwrap_err().to_string(), "validation error: uids.uid 必填");
        assert!(validate_uids(&[UidInput { uid: Some("1".into()), ..Default::default() }]).is_err());
    }

    #[tokio::test]
    async fn create_search_update() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let op = admin();
        let t = tag();
        let input = CustomerInput {
            customer_name: Some(format!("Cust {t}")),
            email: Some(format!("cust_{t}@example.com")),
            original_billing_percentage: Some(95.0),
            company: Some(format!("Company {t}")),
            uids: Some(vec![uid("123456789012", "AWS")]),
            ..Default::default()
        };
        let c = create(&db, &op, input.clone()).await?;
        assert!(c.customer_internal_id.starts_with("cus_"));
        assert_eq!(c.status, "active");
        assert_eq!(c.uids.len(), 1);

        let mut same_email = input.clone();
        same_email.customer_name = Some(format!("Other {t}"));
        same_email.email = Some(format!("CUST_{t}@EXAMPLE.COM"));
        assert_eq!(create(&db, &op, same_email).await.unwrap_err().code(), 409);

        let mut bad_payer = input.clone();
        bad_payer.customer_name = Some(format!("Third {t}"));
        bad_payer.email = Some(format!("third_{t}@example.com"));
        bad_payer.payer_id = Some("payer_missing".into());
        assert_eq!(create(&db, &op, bad_payer).await.unwrap_err().code(), 404);

        let page = list(&db, &CustomerQuery { search: Some(format!("company {t}")), ..Default::default() }).await?;
        assert_eq!(page.total, 1);

        let upd = update(&db, &op, &c.customer_internal_id, CustomerInput { uids: Some(vec![]), status: Some("inactive".into()), ..Default::default() }).await?;
        assert!(upd.uids.is_empty());
        assert_eq!(upd.status, "inactive");

        customer::Entity::delete_by_id(c.id).exec(&db).await?;
        Ok(())
    }
}
