//! Per-account monthly bill rows and the month sync that creates them.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    sea_query::{Condition, OnConflict},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use common::types::Page;
use models::{account, customer, customer_monthly_bill as bill, invoice::InvoiceStatus, validation};
use crate::{errors::ServiceError, pagination::{Pagination, SortOrder}};
use super::{normalize_vendor, previous_month, ratio_change, resolve_month, Financials};

#[derive(Debug, Default, Clone, Deserialize)]
pub struct BillQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub customer_name: Option<String>,
    pub linked_account_uid: Option<String>,
    pub month: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct BillUpdate {
    pub total_bill: Option<f64>,
    pub undiscounted_bill: Option<f64>,
    pub customer_payable_bill: Option<f64>,
    pub supplier_payable_bill: Option<f64>,
    pub profit: Option<f64>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BillRow {
    pub index: u64,
    pub id: Uuid,
    pub month: String,
    pub cloud_vendor: String,
    pub customer_name: String,
    pub linked_account_uid: String,
    pub original_billing_percentage: Option<f64>,
    pub total_bill: Option<f64>,
    pub undiscounted_bill: Option<f64>,
    pub cost_discount_percentage: Option<f64>,
    #[serde(flatten)]
    pub financials: Financials,
    pub remarks: Option<String>,
    pub is_invoiced: bool,
    pub invoice_status: String,
    pub invoice_id: Option<Uuid>,
    pub last_month_usage: Option<f64>,
    pub last_month_profit: Option<f64>,
    pub usage_mom: Option<f64>,
    pub profit_mom: Option<f64>,
}

/// Vendor recorded on a bill for this account.
pub(crate) fn vendor_for(acc: &account::Model) -> &'static str {
    let (vendor, category) = acc.display_vendor_category();
    match validation::non_blank(vendor.as_deref()) {
        Some(v) => normalize_vendor(Some(&v)),
        None => normalize_vendor(category.as_deref()),
    }
}

fn customer_name_for(acc: &account::Model, cust: Option<&customer::Model>) -> String {
    cust.and_then(|c| validation::non_blank(Some(&c.customer_name))).unwrap_or_else(|| acc.account_name.clone())
}

/// Make sure every account has a bill for `month`, refreshing the links of
/// bills that are still editable.
#[instrument(skip(db))]
pub async fn ensure_month_records<C: ConnectionTrait>(db: &C, month: &str) -> Result<(), ServiceError> {
    let accounts = account::Entity::find().all(db).await.map_err(ServiceError::from_db)?;
    let customers: HashMap<Uuid, customer::Model> = customer::Entity::find()
        .filter(customer::Column::Id.is_in(accounts.iter().filter_map(|a| a.customer_id).collect::<Vec<_>>()))
        .all(db)
        .await
        .map_err(ServiceError::from_db)?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();
    let mut existing: HashMap<String, bill::Model> = bill::Entity::find()
        .filter(bill::Column::Month.eq(month))
        .all(db)
        .await
        .map_err(ServiceError::from_db)?
        .into_iter()
        .map(|b| (b.linked_account_uid.clone(), b))
        .collect();

    let (mut created, mut refreshed) = (0usize, 0usize);
    for acc in &accounts {
        let cust = acc.customer_id.and_then(|id| customers.get(&id));
        let vendor = vendor_for(acc);
        let name = customer_name_for(acc, cust);
        let now: DateTime<FixedOffset> = Utc::now().into();

        match existing.remove(&acc.uid) {
            Some(b) => {
                let stale_vendor = b.cloud_vendor == account::LEGACY_CUSTOMER_ACCOUNT;
                if b.is_invoiced && !stale_vendor {
                    continue;
                }
                let cust_id = cust.map(|c| c.id);
                let changed = b.cloud_vendor != vendor
                    || b.customer_name != name
                    || b.account_id.is_none()
                    || b.customer_id != cust_id;
                if !changed {
                    continue;
                }
                let mut am: bill::ActiveModel = b.into();
                am.cloud_vendor = Set(vendor.to_string());
                am.customer_name = Set(name);
                am.account_id = Set(Some(acc.id));
                am.customer_id = Set(cust_id);
                am.updated_at = Set(now);
                am.update(db).await.map_err(ServiceError::from_db)?;
                refreshed += 1;
            }
            None => {
                let am = bill::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    month: Set(month.to_string()),
                    cloud_vendor: Set(vendor.to_string()),
                    customer_name: Set(name),
                    linked_account_uid: Set(acc.uid.clone()),
                    original_billing_percentage: Set(cust.and_then(|c| c.original_billing_percentage)),
                    total_bill: Set(None),
                    undiscounted_bill: Set(None),
                    cost_discount_percentage: Set(acc.cost_discount),
                    customer_payable_bill: Set(None),
                    supplier_payable_bill: Set(None),
                    profit: Set(None),
                    remarks: Set(None),
                    is_invoiced: Set(false),
                    invoice_status: Set(InvoiceStatus::Draft.to_string()),
                    invoice_id: Set(None),
                    account_id: Set(Some(acc.id)),
                    customer_id: Set(cust.map(|c| c.id)),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                // a concurrent sync may have inserted the same (month, uid)
                bill::Entity::insert(am)
                    .on_conflict(OnConflict::columns([bill::Column::Month, bill::Column::LinkedAccountUid]).do_nothing().to_owned())
                    .exec_without_returning(db)
                    .await
                    .map_err(ServiceError::from_db)?;
                created += 1;
            }
        }
    }
    if created + refreshed > 0 {
        info!(month, created, refreshed, "monthly bills synced");
    } else {
        debug!(month, "monthly bills already in sync");
    }
    Ok(())
}

/// Bills of one month after syncing it, filtered like the overview pages.
pub async fn bills_for_month<C: ConnectionTrait>(
    db: &C,
    month: &str,
    customer_name: Option<&str>,
    linked_account_uid: Option<&str>,
    cloud_vendor: Option<&str>,
) -> Result<Vec<bill::Model>, ServiceError> {
    ensure_month_records(db, month).await?;
    bill::Entity::find()
        .filter(filter_condition(month, customer_name, linked_account_uid, cloud_vendor))
        .order_by_asc(bill::Column::CreatedAt)
        .order_by_asc(bill::Column::Id)
        .all(db)
        .await
        .map_err(ServiceError::from_db)
}

fn filter_condition(month: &str, customer_name: Option<&str>, uid: Option<&str>, vendor: Option<&str>) -> Condition {
    let mut cond = Condition::all().add(bill::Column::Month.eq(month));
    if let Some(n) = customer_name.map(str::trim).filter(|s| !s.is_empty()) {
        cond = cond.add(bill::Column::CustomerName.contains(n));
    }
    if let Some(u) = uid.map(str::trim).filter(|s| !s.is_empty()) {
        cond = cond.add(bill::Column::LinkedAccountUid.eq(u));
    }
    if let Some(v) = vendor.map(str::trim).filter(|s| !s.is_empty()) {
        cond = cond.add(bill::Column::CloudVendor.eq(v));
    }
    cond
}

/// Bills whose `month` starts with `yyyy-`.
pub async fn bills_for_year<C: ConnectionTrait>(db: &C, year: i32) -> Result<Vec<bill::Model>, ServiceError> {
    bill::Entity::find()
        .filter(bill::Column::Month.like(format!("{year}-%")))
        .all(db)
        .await
        .map_err(ServiceError::from_db)
}

fn to_row(index: u64, b: bill::Model, prev: Option<&bill::Model>) -> BillRow {
    let financials = Financials::of(&b);
    let last_month_usage = prev.and_then(|p| p.undiscounted_bill);
    let last_month_profit = prev.and_then(|p| Financials::of(p).profit);
    BillRow {
        index,
        usage_mom: ratio_change(b.undiscounted_bill, last_month_usage),
        profit_mom: ratio_change(financials.profit, last_month_profit),
        last_month_usage,
        last_month_profit,
        financials,
        id: b.id,
        month: b.month,
        cloud_vendor: b.cloud_vendor,
        customer_name: b.customer_name,
        linked_account_uid: b.linked_account_uid,
        original_billing_percentage: b.original_billing_percentage,
        total_bill: b.total_bill,
        undiscounted_bill: b.undiscounted_bill,
        cost_discount_percentage: b.cost_discount_percentage,
        remarks: b.remarks,
        is_invoiced: b.is_invoiced,
        invoice_status: b.invoice_status,
        invoice_id: b.invoice_id,
    }
}

/// One page of bills for a month, with last-month comparison.
#[instrument(skip(db))]
pub async fn list(db: &DatabaseConnection, q: &BillQuery) -> Result<Page<BillRow>, ServiceError> {
    let month = resolve_month(q.month.as_deref())?;
    ensure_month_records(db, &month).await?;

    let cond = filter_condition(&month, q.customer_name.as_deref(), q.linked_account_uid.as_deref(), None)
        .add(bill::Column::AccountId.is_not_null())
        .add(bill::Column::AccountId.in_subquery(
            sea_orm::sea_query::Query::select().column(account::Column::Id).from(account::Entity).to_owned(),
        ));
    let order = SortOrder::parse(q.sort_order.as_deref(), SortOrder::Desc);
    let pg = Pagination::new(q.page, q.page_size);
    let (idx, per) = pg.normalize();
    let paginator = bill::Entity::find()
        .filter(cond)
        .order_by(bill::Column::TotalBill, order.order())
        .order_by_asc(bill::Column::Id)
        .paginate(db, per);
    let total = paginator.num_items().await.map_err(ServiceError::from_db)?;
    let rows = paginator.fetch_page(idx).await.map_err(ServiceError::from_db)?;

    let prev_month = previous_month(&month)?;
    let uids: Vec<String> = rows.iter().map(|b| b.linked_account_uid.clone()).collect();
    let prev: HashMap<String, bill::Model> = bill::Entity::find()
        .filter(bill::Column::Month.eq(prev_month))
        .filter(bill::Column::LinkedAccountUid.is_in(uids))
        .all(db)
        .await
        .map_err(ServiceError::from_db)?
        .into_iter()
        .map(|b| (b.linked_account_uid.clone(), b))
        .collect();

    let offset = pg.offset();
    let list = rows
        .into_iter()
        .enumerate()
        .map(|(i, b)| {
            let p = prev.get(&b.linked_account_uid);
            to_row(offset + i as u64 + 1, b, p)
        })
        .collect();
    Ok(pg.page_of(total, list))
}

/// Partial update of the editable amounts.
#[instrument(skip(db, input))]
pub async fn update(db: &DatabaseConnection, id: Uuid, input: BillUpdate) -> Result<bill::Model, ServiceError> {
    let existing = bill::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(ServiceError::from_db)?
        .ok_or_else(|| ServiceError::not_found("customer monthly bill"))?;
    let mut am: bill::ActiveModel = existing.into();
    if let Some(v) = input.total_bill { am.total_bill = Set(Some(v)); }
    if let Some(v) = input.undiscounted_bill { am.undiscounted_bill = Set(Some(v)); }
    if let Some(v) = input.customer_payable_bill { am.customer_payable_bill = Set(Some(v)); }
    if let Some(v) = input.supplier_payable_bill { am.supplier_payable_bill = Set(Some(v)); }
    if let Some(v) = input.profit { am.profit = Set(Some(v)); }
    if let Some(v) = input.remarks { am.remarks = Set(validation::non_blank(Some(&v))); }
    am.updated_at = Set(Utc::now().into());
    am.update(db).await.map_err(ServiceError::from_db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{aws_uid, get_db, insert_account, insert_customer};

    #[tokio::test]
    async fn sync_creates_one_bill_per_account() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let uid = aws_uid();
        let acc = insert_account(&db, &uid, Some("Aliyun"), Some(10.0), None).await?;

        let month = "2031-07";
        ensure_month_records(&db, month).await?;
        ensure_month_records(&db, month).await?;
        let bills = bills_for_month(&db, month, None, Some(&uid), None).await?;
        assert_eq!(bills.len(), 1);
        let b = &bills[0];
        assert_eq!(b.cloud_vendor, "Ali");
        assert_eq!(b.invoice_status, "DRAFT");
        assert_eq!(b.cost_discount_percentage, Some(10.0));

        let upd = update(&db, b.id, BillUpdate { undiscounted_bill: Some(200.0), total_bill: Some(180.0), ..Default::default() }).await?;
        assert_eq!(upd.undiscounted_bill, Some(200.0));
        assert_eq!(Financials::of(&upd).supplier_payable_bill, Some(180.0));

        let page = list(&db, &BillQuery { month: Some(month.into()), linked_account_uid: Some(uid.clone()), ..Default::default() }).await?;
        assert_eq!(page.total, 1);
        assert_eq!(page.list[0].index, 1);
        assert_eq!(page.list[0].last_month_usage, None);

        assert_eq!(update(&db, Uuid::new_v4(), BillUpdate::default()).await.unwrap_err().code(), 404);
        assert_eq!(list(&db, &BillQuery { month: Some("2031-7".into()), ..Default::default() }).await.unwrap_err().code(), 400);

        bill::Entity::delete_many().filter(bill::Column::LinkedAccountUid.eq(uid)).exec(&db).await?;
        account::Entity::delete_by_id(acc.id).exec(&db).await?;
        Ok(())
    }

    async fn only_bill(db: &DatabaseConnection, month: &str, uid: &str) -> Result<bill::Model, anyhow::Error> {
        ensure_month_records(db, month).await?;
        let mut bills = bill::Entity::find()
            .filter(bill::Column::Month.eq(month))
            .filter(bill::Column::LinkedAccountUid.eq(uid))
            .all(db)
            .await?;
        assert_eq!(bills.len(), 1);
        Ok(bills.remove(0))
    }

    async fn mark_invoiced(db: &DatabaseConnection, b: bill::Model, vendor: &str) -> Result<(), anyhow::Error> {
        let mut am: bill::ActiveModel = b.into();
        am.is_invoiced = Set(true);
        am.invoice_status = Set(InvoiceStatus::Posted.to_string());
        am.cloud_vendor = Set(vendor.to_string());
        am.update(db).await?;
        Ok(())
    }

    async fn relink(db: &DatabaseConnection, acc: &account::Model, vendor: &str, customer_id: Option<Uuid>) -> Result<account::Model, anyhow::Error> {
        let mut am: account::ActiveModel = acc.clone().into();
        am.vendor = Set(Some(vendor.to_string()));
        am.customer_id = Set(customer_id);
        Ok(am.update(db).await?)
    }

    async fn cleanup(db: &DatabaseConnection, uid: &str, acc: Uuid, customers: &[Uuid]) -> Result<(), anyhow::Error> {
        bill::Entity::delete_many().filter(bill::Column::LinkedAccountUid.eq(uid)).exec(db).await?;
        account::Entity::delete_by_id(acc).exec(db).await?;
        customer::Entity::delete_many().filter(customer::Column::Id.is_in(customers.to_vec())).exec(db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn invoiced_bill_keeps_its_links() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let first = insert_customer(&db, "Before").await?;
        let second = insert_customer(&db, "After").await?;
        let uid = aws_uid();
        let acc = insert_account(&db, &uid, Some("AWS"), None, Some(first.id)).await?;
        let month = "2031-08";

        let b = only_bill(&db, month, &uid).await?;
        assert_eq!(b.customer_name, first.customer_name);
        mark_invoiced(&db, b, "AWS").await?;

        relink(&db, &acc, "Aliyun", Some(second.id)).await?;
        let b = only_bill(&db, month, &uid).await?;
        assert_eq!(b.cloud_vendor, "AWS");
        assert_eq!(b.customer_name, first.customer_name);
        assert_eq!(b.customer_id, Some(first.id));

        cleanup(&db, &uid, acc.id, &[first.id, second.id]).await
    }

    #[tokio::test]
    async fn invoiced_bill_with_legacy_vendor_is_refreshed() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let cust = insert_customer(&db, "Legacy").await?;
        let uid = aws_uid();
        let acc = insert_account(&db, &uid, Some(account::LEGACY_CUSTOMER_ACCOUNT), None, Some(cust.id)).await?;
        let month = "2031-09";

        let b = only_bill(&db, month, &uid).await?;
        mark_invoiced(&db, b, account::LEGACY_CUSTOMER_ACCOUNT).await?;

        let b = only_bill(&db, month, &uid).await?;
        assert_eq!(b.cloud_vendor, "AWS");
        assert_eq!(b.customer_name, cust.customer_name);
        assert!(b.is_invoiced);
        assert_eq!(b.invoice_status, "POSTED");

        cleanup(&db, &uid, acc.id, &[cust.id]).await
    }

    #[tokio::test]
    async fn editable_bill_follows_account_changes() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let first = insert_customer(&db, "Old").await?;
        let second = insert_customer(&db, "New").await?;
        let uid = aws_uid();
        let acc = insert_account(&db, &uid, Some("AWS"), None, Some(first.id)).await?;
        let month = "2031-10";

        let b = only_bill(&db, month, &uid).await?;
        assert_eq!(b.customer_id, Some(first.id));

        let acc = relink(&db, &acc, "Aliyun", Some(second.id)).await?;
        let b = only_bill(&db, month, &uid).await?;
        assert_eq!(b.cloud_vendor, "Ali");
        assert_eq!(b.customer_name, second.customer_name);
        assert_eq!(b.customer_id, Some(second.id));
        assert_eq!(b.account_id, Some(acc.id));

        // unlinked accounts bill under their own name
        relink(&db, &acc, "Aliyun", None).await?;
        let b = only_bill(&db, month, &uid).await?;
        assert_eq!(b.customer_name, acc.account_name);
        assert_eq!(b.customer_id, None);

        cleanup(&db, &uid, acc.id, &[first.id, second.id]).await
    }
}
