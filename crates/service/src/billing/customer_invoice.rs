//! Monthly bills grouped per customer, as shown on the invoicing overview.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use common::types::Page;
use models::{account, customer_monthly_bill as bill, invoice::InvoiceStatus};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use crate::{errors::ServiceError, pagination::{Pagination, SortOrder}};
use super::{monthly_bill_service::bills_for_month, resolve_month, sum_amounts, Financials};

#[derive(Debug, Default, Clone, Deserialize)]
pub struct CustomerInvoiceQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub customer_name: Option<String>,
    pub linked_account_uid: Option<String>,
    pub cloud_vendor: Option<String>,
    pub month: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InvoiceAccount {
    pub id: Uuid,
    pub uid: String,
    pub account_name: Option<String>,
    pub cloud_vendor: String,
    pub total_bill: Option<f64>,
    pub undiscounted_bill: Option<f64>,
    #[serde(flatten)]
    pub financials: Financials,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CustomerInvoice {
    pub customer_name: String,
    pub month: String,
    pub customer_monthly_bill_id: Option<Uuid>,
    pub cloud_vendors: Vec<String>,
    pub total_bill_sum: f64,
    pub undiscounted_bill_sum: f64,
    pub customer_payable_sum: f64,
    pub supplier_payable_sum: f64,
    pub profit_sum: f64,
    pub accounts: Vec<InvoiceAccount>,
    pub is_invoiced: bool,
    pub invoice_status: InvoiceStatus,
}

/// Combined status of a customer's bills.
///
/// ```
/// use models::invoice::InvoiceStatus::*;
/// use service::billing::customer_invoice::aggregate_status;
/// assert_eq!(aggregate_status(&[Paid, Overdue]), Overdue);
/// assert_eq!(aggregate_status(&[Paid, Paid]), Paid);
/// assert_eq!(aggregate_status(&[]), Draft);
/// ```
pub fn aggregate_status(statuses: &[InvoiceStatus]) -> InvoiceStatus {
    let any = |s: InvoiceStatus| statuses.iter().any(|x| *x == s);
    if any(InvoiceStatus::Overdue) {
        InvoiceStatus::Overdue
    } else if !statuses.is_empty() && statuses.iter().all(|s| *s == InvoiceStatus::Paid) {
        InvoiceStatus::Paid
    } else if any(InvoiceStatus::Sent) {
        InvoiceStatus::Sent
    } else if any(InvoiceStatus::Posted) {
        InvoiceStatus::Posted
    } else {
        InvoiceStatus::Draft
    }
}

/// Group bills by customer name, keeping first-seen order.
pub fn group_by_customer(bills: Vec<bill::Model>, account_name: impl Fn(&bill::Model) -> Option<String>, month: &str) -> Vec<CustomerInvoice> {
    let mut groups: Vec<(String, Vec<bill::Model>)> = Vec::new();
    for b in bills {
        match groups.iter_mut().find(|(name, _)| *name == b.customer_name) {
            Some((_, list)) => list.push(b),
            None => groups.push((b.customer_name.clone(), vec![b])),
        }
    }

    groups
        .into_iter()
        .map(|(customer_name, bills)| {
            let fin: Vec<Financials> = bills.iter().map(Financials::of).collect();
            let mut cloud_vendors: Vec<String> = Vec::new();
            for b in &bills {
                if !cloud_vendors.contains(&b.cloud_vendor) {
                    cloud_vendors.push(b.cloud_vendor.clone());
                }
            }
            // unknown stored statuses are skipped
            let statuses: Vec<InvoiceStatus> = bills.iter().filter_map(|b| InvoiceStatus::from_str(&b.invoice_status).ok()).collect();
            let invoice_status = aggregate_status(&statuses);
            let is_invoiced = bills.iter().any(|b| b.is_invoiced) || invoice_status != InvoiceStatus::Draft;
            let accounts = bills
                .iter()
                .zip(&fin)
                .map(|(b, f)| InvoiceAccount {
                    id: b.id,
                    uid: b.linked_account_uid.clone(),
                    account_name: account_name(b),
                    cloud_vendor: b.cloud_vendor.clone(),
                    total_bill: b.total_bill,
                    undiscounted_bill: b.undiscounted_bill,
                    financials: *f,
                })
                .collect();
            CustomerInvoice {
                month: bills.first().map(|b| b.month.clone()).unwrap_or_else(|| month.to_string()),
                customer_monthly_bill_id: bills.first().map(|b| b.id),
                total_bill_sum: sum_amounts(bills.iter().map(|b| b.total_bill)),
                undiscounted_bill_sum: sum_amounts(bills.iter().map(|b| b.undiscounted_bill)),
                customer_payable_sum: sum_amounts(fin.iter().map(|f| f.customer_payable_bill)),
                supplier_payable_sum: sum_amounts(fin.iter().map(|f| f.supplier_payable_bill)),
                profit_sum: sum_amounts(fin.iter().map(|f| f.profit)),
                customer_name,
                cloud_vendors,
                accounts,
                is_invoiced,
                invoice_status,
            }
        })
        .collect()
}

/// Sort groups by `total_bill_sum`; ties keep their first-seen order.
pub fn sort_groups(groups: &mut [CustomerInvoice], order: SortOrder) {
    groups.sort_by(|a, b| {
        let o = a.total_bill_sum.total_cmp(&b.total_bill_sum);
        match order {
            SortOrder::Asc => o,
            SortOrder::Desc => o.reverse(),
        }
    });
}

#[instrument(skip(db))]
pub async fn list(db: &DatabaseConnection, q: &CustomerInvoiceQuery) -> Result<Page<CustomerInvoice>, ServiceError> {
    let month = resolve_month(q.month.as_deref())?;
    let bills = bills_for_month(db, &month, q.customer_name.as_deref(), q.linked_account_uid.as_deref(), q.cloud_vendor.as_deref()).await?;
    let account_ids: Vec<Uuid> = bills.iter().filter_map(|b| b.account_id).collect();
    let names: std::collections::HashMap<Uuid, String> = account::Entity::find()
        .filter(account::Column::Id.is_in(account_ids))
        .all(db)
        .await
        .map_err(ServiceError::from_db)?
        .into_iter()
        .map(|a| (a.id, a.account_name))
        .collect();
    let mut groups = group_by_customer(bills, |b| b.account_id.and_then(|id| names.get(&id).cloned()), &month);
    sort_groups(&mut groups, SortOrder::parse(q.sort_order.as_deref(), SortOrder::Desc));
    Ok(Pagination::new(q.page, q.page_size).slice(groups))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn bill(customer: &str, uid: &str, vendor: &str, total: f64, status: &str, invoiced: bool) -> bill::Model {
        let now = Utc::now().into();
        bill::Model {
            id: Uuid::new_v4(),
            month: "2024-05".into(),
            cloud_vendor: vendor.into(),
            customer_name: customer.into(),
            linked_account_uid: uid.into(),
            original_billing_percentage: Some(100.0),
            total_bill: Some(total),
            undiscounted_bill: Some(total),
            cost_discount_percentage: Some(50.0),
            customer_payable_bill: None,
            supplier_payable_bill: None,
            profit: None,
            remarks: None,
            is_invoiced: invoiced,
            invoice_status: status.into(),
            invoice_id: None,
            account_id: None,
            customer_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn groups_keep_first_seen_order_and_sum() {
        let bills = vec![
            bill("Acme", "1", "AWS", 100.0, "DRAFT", false),
            bill("Beta", "2", "Ali", 10.0, "PAID", false),
            bill("Acme", "3", "Ali", 50.0, "DRAFT", false),
            bill("Acme", "4", "AWS", 10.0, "DRAFT", false),
        ];
        let first_id = bills[0].id;
        let groups = group_by_customer(bills, |_| None, "2024-05");
        assert_eq!(groups.len(), 2);
        let acme = &groups[0];
        assert_eq!(acme.customer_name, "Acme");
        assert_eq!(acme.customer_monthly_bill_id, Some(first_id));
        assert_eq!(acme.cloud_vendors, vec!["AWS".to_string(), "Ali".to_string()]);
        assert_eq!(acme.total_bill_sum, 160.0);
        assert_eq!(acme.customer_payable_sum, 160.0);
        assert_eq!(acme.supplier_payable_sum, 80.0);
        assert_eq!(acme.profit_sum, 80.0);
        assert_eq!(acme.accounts.len(), 3);
        assert!(!acme.is_invoiced);
        assert_eq!(groups[1].invoice_status, InvoiceStatus::Paid);
        assert!(groups[1].is_invoiced);
    }

    #[test]
    fn fresh_bills_sum_to_positive_zero() {
        let mut b = bill("Fresh", "1", "AWS", 0.0, "DRAFT", false);
        b.total_bill = None;
        b.undiscounted_bill = None;
        let groups = group_by_customer(vec![b], |_| None, "2024-05");
        let v = serde_json::to_value(&groups[0]).unwrap();
        for key in ["total_bill_sum", "undiscounted_bill_sum", "customer_payable_sum", "supplier_payable_sum", "profit_sum"] {
            let n = v[key].as_f64().unwrap();
            assert_eq!(n, 0.0, "{key}");
            assert!(n.is_sign_positive(), "{key} serialized as {}", v[key]);
        }
        assert_eq!(serde_json::to_string(&v["total_bill_sum"]).unwrap(), "0.0");
    }

    #[test]
    fn status_precedence() {
        use InvoiceStatus::*;
        assert_eq!(aggregate_status(&[Draft, Sent, Posted]), Sent);
        assert_eq!(aggregate_status(&[Draft, Posted]), Posted);
        assert_eq!(aggregate_status(&[Paid, Draft]), Draft);
    }

    #[test]
    fn invoiced_flag_counts_even_in_draft() {
        let groups = group_by_customer(vec![bill("C", "1", "AWS", 1.0, "DRAFT", true)], |_| None, "2024-05");
        assert!(groups[0].is_invoiced);
        assert_eq!(groups[0].invoice_status, InvoiceStatus::Draft);
    }

    #[test]
    fn sorting_by_total() {
        let mut groups = group_by_customer(
            vec![bill("A", "1", "AWS", 5.0, "DRAFT", false), bill("B", "2", "AWS", 50.0, "DRAFT", false)],
            |_| None,
            "2024-05",
        );
        sort_groups(&mut groups, SortOrder::Desc);
        assert_eq!(groups[0].customer_name, "B");
        sort_groups(&mut groups, SortOrder::Asc);
        assert_eq!(groups[0].customer_name, "A");
    }
}
