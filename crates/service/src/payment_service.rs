//! Customer collections per billing month.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use models::{customer, customer_monthly_bill as bill, monthly_payment as payment, validation};
use crate::{billing::sum_amounts, errors::ServiceError, query::eq_ci};

pub const STATUS_NOT_REQUIRED: &str = "无需付款";
pub const STATUS_PAID: &str = "已付款";
pub const STATUS_UNPAID: &str = "未付款";
pub const STATUS_PARTIAL: &str = "部分付款";
const ALL: &str = "全部";
const EPSILON: f64 = 0.01;

/// Collection status for one customer.
///
/// ```
/// use service::payment_service::payment_status;
/// assert_eq!(payment_status(0.0, 0.0, 0.0), "无需付款");
/// assert_eq!(payment_status(100.0, 40.0, 60.0), "部分付款");
/// ```
pub fn payment_status(receivable: f64, received: f64, outstanding: f64) -> &'static str {
    if receivable <= EPSILON {
        STATUS_NOT_REQUIRED
    } else if outstanding <= EPSILON {
        STATUS_PAID
    } else if received <= EPSILON {
        STATUS_UNPAID
    } else {
        STATUS_PARTIAL
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct PaymentQuery {
    pub month: Option<String>,
    pub customer_name: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct PaymentRecord {
    pub month: Option<String>,
    pub customer_name: Option<String>,
    pub received_amount: Option<f64>,
    pub payment_method: Option<String>,
    pub last_payment_date: Option<NaiveDate>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PaymentRow {
    pub customer_name: String,
    pub account_count: u64,
    pub receivable_amount: f64,
    pub received_amount: f64,
    pub outstanding_amount: f64,
    pub status: String,
    pub last_payment_date: Option<NaiveDate>,
    pub payment_method: String,
    pub remarks: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PaymentSummary {
    pub total_receivable: f64,
    pub total_received: f64,
    pub total_outstanding: f64,
    pub collection_rate: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PaymentOverview {
    pub month: String,
    pub summary: PaymentSummary,
    pub list: Vec<PaymentRow>,
}

/// Merge customers, bills and payments of one month into the collection table.
pub fn build_overview(
    month: &str,
    customer_names: &[String],
    bills: &[bill::Model],
    payments: &[payment::Model],
    name_filter: Option<&str>,
    status_filter: Option<&str>,
) -> PaymentOverview {
    // lower-cased key -> canonical name
    let canonical: BTreeMap<String, String> = customer_names
        .iter()
        .filter_map(|n| validation::non_blank(Some(n)))
        .map(|n| (n.to_lowercase(), n))
        .collect();

    let mut receivable: HashMap<&str, f64> = HashMap::new();
    let mut uids: HashMap<&str, HashSet<&str>> = HashMap::new();
    for b in bills {
        if let Some(name) = canonical.get(&b.customer_name.trim().to_lowercase()) {
            *receivable.entry(name.as_str()).or_default() += b.customer_payable_bill.unwrap_or(0.0);
            uids.entry(name.as_str()).or_default().insert(b.linked_account_uid.as_str());
        }
    }
    let mut paid: HashMap<&str, &payment::Model> = HashMap::new();
    for p in payments {
        if let Some(name) = canonical.get(&p.customer_name.trim().to_lowercase()) {
            paid.insert(name.as_str(), p);
        }
    }

    let name_filter = name_filter.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty());
    let status_filter = status_filter.map(str::trim).filter(|s| !s.is_empty() && *s != ALL);

    let mut list = Vec::new();
    for name in canonical.values() {
        if let Some(f) = &name_filter {
            if !name.to_lowercase().contains(f.as_str()) {
                continue;
            }
        }
        let receivable_amount = receivable.get(name.as_str()).copied().unwrap_or(0.0);
        let record = paid.get(name.as_str()).copied();
        let received_amount = record.map(|p| p.received_amount).unwrap_or(0.0);
        let outstanding_amount = (receivable_amount - received_amount).max(0.0);
        let status = payment_status(receivable_amount, received_amount, outstanding_amount);
        if status_filter.is_some_and(|s| s != status) {
            continue;
        }
        list.push(PaymentRow {
            customer_name: name.clone(),
            account_count: uids.get(name.as_str()).map(|s| s.len() as u64).unwrap_or(0),
            receivable_amount,
            received_amount,
            outstanding_amount,
            status: status.to_string(),
            last_payment_date: record.and_then(|p| p.last_payment_date),
            payment_method: record.and_then(|p| p.payment_method.clone()).unwrap_or_else(|| "-".into()),
            remarks: record.and_then(|p| p.remarks.clone()).unwrap_or_else(|| "-".into()),
        });
    }
    list.sort_by(|a, b| b.receivable_amount.total_cmp(&a.receivable_amount));

    let total_receivable = sum_amounts(list.iter().map(|r| Some(r.receivable_amount)));
    let total_received = sum_amounts(list.iter().map(|r| Some(r.received_amount)));
    let total_outstanding = sum_amounts(list.iter().map(|r| Some(r.outstanding_amount)));
    let rate = if total_receivable > 0.0 { total_received / total_receivable * 100.0 } else { 0.0 };
    PaymentOverview {
        month: month.to_string(),
        summary: PaymentSummary { total_receivable, total_received, total_outstanding, collection_rate: format!("{rate:.1}%") },
        list,
    }
}

#[instrument(skip(db))]
pub async fn overview(db: &DatabaseConnection, q: &PaymentQuery) -> Result<PaymentOverview, ServiceError> {
    let month = validation::non_blank(q.month.as_deref()).ok_or_else(|| ServiceError::required("month"))?;
    validation::validate_month(&month)?;
    let names: Vec<String> = customer::Entity::find()
        .all(db)
        .await
        .map_err(ServiceError::from_db)?
        .into_iter()
        .map(|c| c.customer_name)
        .collect();
    let bills = bill::Entity::find().filter(bill::Column::Month.eq(month.as_str())).all(db).await.map_err(ServiceError::from_db)?;
    let payments = payment::Entity::find().filter(payment::Column::Month.eq(month.as_str())).all(db).await.map_err(ServiceError::from_db)?;
    Ok(build_overview(&month, &names, &bills, &payments, q.customer_name.as_deref(), q.status.as_deref()))
}

/// Upsert by (month, customer name); only provided fields are written.
#[instrument(skip(db, input))]
pub async fn record(db: &DatabaseConnection, input: PaymentRecord) -> Result<payment::Model, ServiceError> {
    let month = validation::non_blank(input.month.as_deref()).ok_or_else(|| ServiceError::required("month"))?;
    validation::validate_month(&month)?;
    let name = validation::non_blank(input.customer_name.as_deref()).ok_or_else(|| ServiceError::required("customer_name"))?;
    let now = Utc::now().into();

    let existing = payment::Entity::find()
        .filter(payment::Column::Month.eq(month.as_str()))
        .filter(eq_ci((payment::Entity, payment::Column::CustomerName), &name))
        .one(db)
        .await
        .map_err(ServiceError::from_db)?;
    let is_new = existing.is_none();
    let mut am: payment::ActiveModel = match existing {
        Some(p) => p.into(),
        None => payment::ActiveModel {
            id: Set(Uuid::new_v4()),
            month: Set(month.clone()),
            customer_name: Set(name.clone()),
            received_amount: Set(0.0),
            payment_method: Set(None),
            last_payment_date: Set(None),
            remarks: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        },
    };
    if let Some(v) = input.received_amount { am.received_amount = Set(v); }
    if let Some(v) = input.payment_method { am.payment_method = Set(Some(v)); }
    if let Some(v) = input.last_payment_date { am.last_payment_date = Set(Some(v)); }
    if let Some(v) = input.remarks { am.remarks = Set(Some(v)); }
    am.updated_at = Set(now);
    let saved = (if is_new { am.insert(db).await } else { am.update(db).await }).map_err(ServiceError::from_db)?;
    info!(month = %saved.month, customer = %saved.customer_name, received = saved.received_amount, "payment recorded");
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{get_db, tag};

    fn bill_for(name: &str, uid: &str, payable: Option<f64>) -> bill::Model {
        let now = Utc::now().into();
        bill::Model {
            id: Uuid::new_v4(),
            month: "2024-06".into(),
            cloud_vendor: "AWS".into(),
            customer_name: name.into(),
            linked_account_uid: uid.into(),
            original_billing_percentage: None,
            total_bill: None,
            undiscounted_bill: None,
            cost_discount_percentage: None,
            customer_payable_bill: payable,
            supplier_payable_bill: None,
            profit: None,
            remarks: None,
            is_invoiced: false,
            invoice_status: "DRAFT".into(),
            invoice_id: None,
            account_id: None,
            customer_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn paid(name: &str, amount: f64) -> payment::Model {
        let now = Utc::now().into();
        payment::Model {
            id: Uuid::new_v4(),
            month: "2024-06".into(),
            customer_name: name.into(),
            received_amount: amount,
            payment_method: Some("wire".into()),
            last_payment_date: None,
            remarks: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn statuses() {
        assert_eq!(payment_status(0.005, 0.0, 0.005), STATUS_NOT_REQUIRED);
        assert_eq!(payment_status(100.0, 100.0, 0.0), STATUS_PAID);
        assert_eq!(payment_status(100.0, 0.0, 100.0), STATUS_UNPAID);
        assert_eq!(payment_status(100.0, 50.0, 50.0), STATUS_PARTIAL);
    }

    #[test]
    fn overview_matches_names_case_insensitively() {
        let names = vec!["Acme".to_string(), " Beta ".to_string(), "".to_string(), "Gamma".to_string()];
        let bills = vec![
            bill_for("acme", "1", Some(100.0)),
            bill_for("ACME ", "1", Some(50.0)),
            bill_for("Acme", "2", None),
            bill_for("Beta", "3", Some(10.0)),
            bill_for("Unknown", "4", Some(999.0)),
        ];
        let payments = vec![paid("ACME", 200.0), paid("beta", 4.0)];
        let o = build_overview("2024-06", &names, &bills, &payments, None, Some("全部"));
        assert_eq!(o.list.len(), 3);
        let acme = &o.list[0];
        assert_eq!(acme.customer_name, "Acme");
        assert_eq!(acme.account_count, 2);
        assert_eq!(acme.receivable_amount, 150.0);
        assert_eq!(acme.outstanding_amount, 0.0);
        assert_eq!(acme.status, STATUS_PAID);
        assert_eq!(acme.payment_method, "wire");
        assert_eq!(o.list[1].status, STATUS_PARTIAL);
        assert_eq!(o.list[2].status, STATUS_NOT_REQUIRED);
        assert_eq!(o.list[2].remarks, "-");
        assert_eq!(o.summary.total_receivable, 160.0);
        assert_eq!(o.summary.total_outstanding, 6.0);
        assert_eq!(o.summary.collection_rate, "127.5%");

        let filtered = build_overview("2024-06", &names, &bills, &payments, Some("bet"), Some(STATUS_PARTIAL));
        assert_eq!(filtered.list.len(), 1);
        let none = build_overview("2024-06", &names, &[], &[], None, None);
        assert_eq!(none.summary.collection_rate, "0.0%");

        let empty = build_overview("2024-06", &names, &bills, &payments, Some("nobody"), None);
        assert!(empty.list.is_empty());
        let summary = serde_json::to_value(&empty.summary).unwrap();
        for key in ["total_receivable", "total_received", "total_outstanding"] {
            assert!(summary[key].as_f64().unwrap().is_sign_positive(), "{key} serialized as {}", summary[key]);
        }
    }

    #[tokio::test]
    async fn record_upserts() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let name = format!("Payer Co {}", tag());
        let first = record(&db, PaymentRecord { month: Some("2030-05".into()), customer_name: Some(name.clone()), received_amount: Some(10.0), ..Default::default() }).await?;
        let second = record(&db, PaymentRecord { month: Some("2030-05".into()), customer_name: Some(name.to_uppercase()), remarks: Some("second".into()), ..Default::default() }).await?;
        assert_eq!(first.id, second.id);
        assert_eq!(second.received_amount, 10.0);
        assert_eq!(second.remarks.as_deref(), Some("second"));
        assert_eq!(record(&db, PaymentRecord { month: Some("2030-05".into()), ..Default::default() }).await.unwrap_err().code(), 400);
        payment::Entity::delete_by_id(first.id).exec(&db).await?;
        Ok(())
    }
}
