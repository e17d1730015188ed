use std::collections::HashMap;

use chrono::{Days, Local, NaiveDate, Utc};
use sea_orm::{
    sea_query::{Condition, Expr},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use common::types::Page;
use models::{
    customer_monthly_bill as bill, invoice::{self, InvoiceStatus}, invoice_line_item as line,
    operation_log::{ACTION_CREATE, ACTION_DELETE, ACTION_UPDATE}, validation,
};
use crate::internal_id::{invoice_number_prefix, next_id, payment_reference_prefix};
use crate::query::{contains_ci, filled};
use crate::{context::Operator, errors::ServiceError, operation_log_service, pagination::{Pagination, SortOrder}};
use super::line_items::{totals, PricedLine};
use super::{InvoiceInput, InvoiceQuery, InvoiceView};

pub const DEFAULT_CURRENCY: &str = "CNY";
const DUE_AFTER_DAYS: u64 = 30;

async fn load_items<C: ConnectionTrait>(db: &C, ids: Vec<Uuid>) -> Result<HashMap<Uuid, Vec<line::Model>>, ServiceError> {
    let mut out: HashMap<Uuid, Vec<line::Model>> = HashMap::new();
    for l in line::Entity::find()
        .filter(line::Column::InvoiceId.is_in(ids))
        .order_by_asc(line::Column::Position)
        .all(db)
        .await
        .map_err(ServiceError::from_db)?
    {
        out.entry(l.invoice_id).or_default().push(l);
    }
    Ok(out)
}

async fn find<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<invoice::Model, ServiceError> {
    invoice::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(ServiceError::from_db)?
        .ok_or_else(|| ServiceError::not_found("invoice"))
}

async fn view<C: ConnectionTrait>(db: &C, i: invoice::Model) -> Result<InvoiceView, ServiceError> {
    let items = load_items(db, vec![i.id]).await?.remove(&i.id).unwrap_or_default();
    Ok(InvoiceView::build(i, items))
}

#[instrument(skip(db))]
pub async fn list(db: &DatabaseConnection, q: &InvoiceQuery) -> Result<Page<InvoiceView>, ServiceError> {
    let mut cond = Condition::all();
    if let Some(s) = filled(&q.search) {
        cond = cond.add(contains_ci((invoice::Entity, invoice::Column::CustomerName), s));
    }
    if let Some(raw) = filled(&q.status) {
        match raw.parse::<InvoiceStatus>() {
            Ok(s) => cond = cond.add(invoice::Column::Status.eq(s.as_str())),
            Err(_) => warn!(status = raw, "ignoring unknown invoice status filter"),
        }
    }
    let sort_col = match q.sort_by.as_deref().map(str::trim) {
        Some("invoice_date") => invoice::Column::InvoiceDate,
        Some("due_date") => invoice::Column::DueDate,
        Some("grand_total") => invoice::Column::GrandTotal,
        Some("customer_name") => invoice::Column::CustomerName,
        Some("invoice_number") => invoice::Column::InvoiceNumber,
        _ => invoice::Column::CreatedAt,
    };
    let order = SortOrder::parse(q.sort_order.as_deref(), SortOrder::Desc);
    let pg = Pagination::new(q.page, q.page_size);
    let (idx, per) = pg.normalize();
    let paginator = invoice::Entity::find()
        .filter(cond)
        .order_by(sort_col, order.order())
        .order_by_asc(invoice::Column::Id)
        .paginate(db, per);
    let total = paginator.num_items().await.map_err(ServiceError::from_db)?;
    let rows = paginator.fetch_page(idx).await.map_err(ServiceError::from_db)?;
    let mut items = load_items(db, rows.iter().map(|i| i.id).collect()).await?;
    let list = rows
        .into_iter()
        .map(|i| {
            let lines = items.remove(&i.id).unwrap_or_default();
            InvoiceView::build(i, lines)
        })
        .collect();
    Ok(pg.page_of(total, list))
}

pub async fn get(db: &DatabaseConnection, id: Uuid) -> Result<InvoiceView, ServiceError> {
    let i = find(db, id).await?;
    view(db, i).await
}

async fn append_lines<C: ConnectionTrait>(db: &C, invoice_id: Uuid, lines: &[PricedLine]) -> Result<(), ServiceError> {
    if lines.is_empty() {
        return Ok(());
    }
    let start = line::Entity::find()
        .filter(line::Column::InvoiceId.eq(invoice_id))
        .count(db)
        .await
        .map_err(ServiceError::from_db)? as i32;
    let rows = lines.iter().enumerate().map(|(i, l)| line::ActiveModel {
        id: Set(Uuid::new_v4()),
        invoice_id: Set(invoice_id),
        product_id: Set(l.product_id.clone()),
        label: Set(l.label.clone()),
        quantity: Set(l.quantity),
        price: Set(l.price),
        discount_pct: Set(l.discount_pct),
        tax_pct: Set(l.tax_pct),
        amount_ex_tax: Set(l.amount_ex_tax),
        amount_inc_tax: Set(l.amount_inc_tax),
        position: Set(start + i as i32),
    });
    line::Entity::insert_many(rows).exec(db).await.map_err(ServiceError::from_db)?;
    Ok(())
}

/// Recompute the invoice totals from its stored lines.
async fn refresh_totals<C: ConnectionTrait>(db: &C, inv: invoice::Model) -> Result<invoice::Model, ServiceError> {
    let lines = line::Entity::find()
        .filter(line::Column::InvoiceId.eq(inv.id))
        .all(db)
        .await
        .map_err(ServiceError::from_db)?;
    let t = totals(lines.iter().map(|l| (l.amount_ex_tax, l.amount_inc_tax)));
    let mut am: invoice::ActiveModel = inv.into();
    am.subtotal_ex_tax = Set(t.subtotal_ex_tax);
    am.tax_total = Set(t.tax_total);
    am.grand_total = Set(t.grand_total);
    am.updated_at = Set(Utc::now().into());
    am.update(db).await.map_err(ServiceError::from_db)
}

fn priced(input: &InvoiceInput) -> Vec<PricedLine> {
    input.items.as_deref().unwrap_or_default().iter().map(PricedLine::from_input).collect()
}

async fn insert_draft<C: ConnectionTrait>(db: &C, customer_name: String, input: &InvoiceInput) -> Result<invoice::Model, ServiceError> {
    let invoice_date = input.invoice_date.unwrap_or_else(|| Local::now().date_naive());
    let due_date = input.due_date.or_else(|| invoice_date.checked_add_days(Days::new(DUE_AFTER_DAYS)));
    let number = next_id::<invoice::Entity, _>(db, invoice::Column::InvoiceNumber, &invoice_number_prefix(invoice_date)).await?;
    let now = Utc::now().into();
    invoice::ActiveModel {
        id: Set(Uuid::new_v4()),
        invoice_number: Set(number),
        customer_name: Set(customer_name),
        invoice_date: Set(invoice_date),
        due_date: Set(due_date),
        currency: Set(validation::non_blank(input.currency.as_deref()).unwrap_or_else(|| DEFAULT_CURRENCY.into())),
        tax_number: Set(validation::non_blank(input.tax_number.as_deref())),
        payment_reference: Set(validation::non_blank(input.payment_reference.as_deref())),
        activities: Set(input.activities.clone().unwrap_or_default()),
        terms: Set(validation::non_blank(input.terms.as_deref())),
        status: Set(InvoiceStatus::Draft.to_string()),
        subtotal_ex_tax: Set(0.0),
        tax_total: Set(0.0),
        grand_total: Set(0.0),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .map_err(ServiceError::from_db)
}

/// Invoice for a customer's month of bills, reusing one that already covers
/// any of them; without a bill id a standalone invoice is created.
#[instrument(skip(db, op, input), fields(operator = %op.email))]
pub async fn create(db: &DatabaseConnection, op: &Operator, input: InvoiceInput) -> Result<InvoiceView, ServiceError> {
    let lines = priced(&input);
    let txn = db.begin().await.map_err(ServiceError::from_db)?;

    let inv = match input.customer_monthly_bill_id {
        Some(bill_id) => {
            let target = bill::Entity::find_by_id(bill_id)
                .one(&txn)
                .await
                .map_err(ServiceError::from_db)?
                .ok_or_else(|| ServiceError::NotFound(format!("Customer Monthly Bill not found: {bill_id}")))?;
            let siblings = bill::Entity::find()
                .filter(bill::Column::CustomerName.eq(target.customer_name.as_str()))
                .filter(bill::Column::Month.eq(target.month.as_str()))
                .order_by_asc(bill::Column::CreatedAt)
                .all(&txn)
                .await
                .map_err(ServiceError::from_db)?;
            let inv = match siblings.iter().find_map(|b| b.invoice_id) {
                Some(existing) => find(&txn, existing).await?,
                None => insert_draft(&txn, target.customer_name.clone(), &input).await?,
            };
            bill::Entity::update_many()
                .col_expr(bill::Column::InvoiceId, Expr::value(inv.id))
                .col_expr(bill::Column::IsInvoiced, Expr::value(true))
                .col_expr(bill::Column::InvoiceStatus, Expr::value(InvoiceStatus::Draft.as_str()))
                .filter(bill::Column::CustomerName.eq(target.customer_name.as_str()))
                .filter(bill::Column::Month.eq(target.month.as_str()))
                .filter(bill::Column::InvoiceId.is_null())
                .exec(&txn)
                .await
                .map_err(ServiceError::from_db)?;
            inv
        }
        None => {
            let name = validation::non_blank(input.customer_name.as_deref()).ok_or_else(|| ServiceError::required("customer_name"))?;
            insert_draft(&txn, name, &input).await?
        }
    };
    append_lines(&txn, inv.id, &lines).await?;
    let inv = refresh_totals(&txn, inv).await?;
    operation_log_service::record(&txn, op, ACTION_CREATE, "invoice", &inv.id.to_string(), &format!("创建发票: {}", inv.customer_name)).await?;
    let out = view(&txn, inv).await?;
    txn.commit().await.map_err(ServiceError::from_db)?;
    info!(invoice_number = %out.invoice_number, "invoice created");
    Ok(out)
}

async fn set_bill_status<C: ConnectionTrait>(db: &C, invoice_id: Uuid, status: InvoiceStatus) -> Result<(), ServiceError> {
    bill::Entity::update_many()
        .col_expr(bill::Column::InvoiceStatus, Expr::value(status.as_str()))
        .filter(bill::Column::InvoiceId.eq(invoice_id))
        .exec(db)
        .await
        .map_err(ServiceError::from_db)?;
    Ok(())
}

#[instrument(skip(db, op, input), fields(operator = %op.email))]
pub async fn update(db: &DatabaseConnection, op: &Operator, id: Uuid, input: InvoiceInput) -> Result<InvoiceView, ServiceError> {
    let status = match filled(&input.status) {
        Some(s) => Some(s.parse::<InvoiceStatus>()?),
        None => None,
    };
    let txn = db.begin().await.map_err(ServiceError::from_db)?;
    let existing = find(&txn, id).await?;
    let mut am: invoice::ActiveModel = existing.into();
    if let Some(v) = &input.customer_name { am.customer_name = Set(v.trim().to_string()); }
    if let Some(v) = input.invoice_date { am.invoice_date = Set(v); }
    if let Some(v) = input.due_date { am.due_date = Set(Some(v)); }
    if let Some(v) = &input.currency { am.currency = Set(v.trim().to_string()); }
    if let Some(v) = &input.tax_number { am.tax_number = Set(Some(v.clone())); }
    if let Some(v) = &input.payment_reference { am.payment_reference = Set(Some(v.clone())); }
    if let Some(v) = &input.activities { am.activities = Set(v.clone()); }
    if let Some(v) = &input.terms { am.terms = Set(Some(v.clone())); }
    if let Some(s) = status { am.status = Set(s.to_string()); }
    am.updated_at = Set(Utc::now().into());
    let mut inv = am.update(&txn).await.map_err(ServiceError::from_db)?;

    if input.items.is_some() {
        line::Entity::delete_many()
            .filter(line::Column::InvoiceId.eq(id))
            .exec(&txn)
            .await
            .map_err(ServiceError::from_db)?;
        append_lines(&txn, id, &priced(&input)).await?;
        inv = refresh_totals(&txn, inv).await?;
    }
    if let Some(s) = status {
        set_bill_status(&txn, id, s).await?;
    }
    operation_log_service::record(&txn, op, ACTION_UPDATE, "invoice", &id.to_string(), &format!("更新发票: {}", inv.customer_name)).await?;
    let out = view(&txn, inv).await?;
    txn.commit().await.map_err(ServiceError::from_db)?;
    Ok(out)
}

/// Delete invoices and put their bills back into the uninvoiced pool.
#[instrument(skip(db, op), fields(operator = %op.email))]
pub async fn delete(db: &DatabaseConnection, op: &Operator, ids: &[Uuid]) -> Result<u64, ServiceError> {
    if ids.is_empty() {
        return Err(ServiceError::Validation("ids 不能为空".into()));
    }
    let txn = db.begin().await.map_err(ServiceError::from_db)?;
    bill::Entity::update_many()
        .col_expr(bill::Column::InvoiceId, Expr::value(Option::<Uuid>::None))
        .col_expr(bill::Column::IsInvoiced, Expr::value(false))
        .col_expr(bill::Column::InvoiceStatus, Expr::value(InvoiceStatus::Draft.as_str()))
        .filter(bill::Column::InvoiceId.is_in(ids.to_vec()))
        .exec(&txn)
        .await
        .map_err(ServiceError::from_db)?;
    for id in ids {
        operation_log_service::record(&txn, op, ACTION_DELETE, "invoice", &id.to_string(), &format!("删除发票: {id}")).await?;
    }
    let res = invoice::Entity::delete_many()
        .filter(invoice::Column::Id.is_in(ids.to_vec()))
        .exec(&txn)
        .await
        .map_err(ServiceError::from_db)?;
    txn.commit().await.map_err(ServiceError::from_db)?;
    info!(deleted = res.rows_affected, "invoices deleted");
    Ok(res.rows_affected)
}

/// `DRAFT` → `POSTED`, assigning a payment reference when none is set.
#[instrument(skip(db, op), fields(operator = %op.email))]
pub async fn post(db: &DatabaseConnection, op: &Operator, id: Uuid) -> Result<InvoiceView, ServiceError> {
    post_on(db, op, id, Local::now().date_naive()).await
}

async fn post_on(db: &DatabaseConnection, op: &Operator, id: Uuid, today: NaiveDate) -> Result<InvoiceView, ServiceError> {
    let txn = db.begin().await.map_err(ServiceError::from_db)?;
    let inv = find(&txn, id).await?;
    if inv.status.parse::<InvoiceStatus>().ok() != Some(InvoiceStatus::Draft) {
        return Err(ServiceError::Conflict(format!("只有草稿状态的发票可以过账, 当前状态: {}", inv.status)));
    }
    let reference = match validation::non_blank(inv.payment_reference.as_deref()) {
        Some(r) => r,
        None => next_id::<invoice::Entity, _>(&txn, invoice::Column::PaymentReference, &payment_reference_prefix(today)).await?,
    };
    let mut am: invoice::ActiveModel = inv.into();
    am.status = Set(InvoiceStatus::Posted.to_string());
    am.payment_reference = Set(Some(reference));
    am.updated_at = Set(Utc::now().into());
    let inv = am.update(&txn).await.map_err(ServiceError::from_db)?;
    set_bill_status(&txn, id, InvoiceStatus::Posted).await?;
    operation_log_service::record(&txn, op, ACTION_UPDATE, "invoice", &id.to_string(), &format!("发票过账: {}", inv.customer_name)).await?;
    let out = view(&txn, inv).await?;
    txn.commit().await.map_err(ServiceError::from_db)?;
    Ok(out)
}
