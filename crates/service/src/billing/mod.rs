//! Customer monthly bills and the per-customer invoice overview built on them.

pub mod customer_invoice;
pub mod monthly_bill_service;

use chrono::{Local, Months, NaiveDate};
use serde::Serialize;

use models::{customer_monthly_bill, validation};
use crate::errors::ServiceError;

/// Map free-form vendor text onto `AWS`, `Ali` or `Azure`.
///
/// ```
/// use service::billing::normalize_vendor;
/// assert_eq!(normalize_vendor(Some("Aliyun")), "Ali");
/// assert_eq!(normalize_vendor(None), "AWS");
/// ```
pub fn normalize_vendor(raw: Option<&str>) -> &'static str {
    let lower = match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s.to_lowercase(),
        None => return "AWS",
    };
    if lower.contains("ali") {
        "Ali"
    } else if lower.contains("azure") {
        "Azure"
    } else {
        "AWS"
    }
}

/// Amounts shown for a bill: stored values win, missing ones are derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Financials {
    pub customer_payable_bill: Option<f64>,
    pub supplier_payable_bill: Option<f64>,
    pub profit: Option<f64>,
}

impl Financials {
    pub fn derive(
        undiscounted: Option<f64>,
        original_pct: Option<f64>,
        cost_pct: Option<f64>,
        stored: Financials,
    ) -> Financials {
        let customer = stored.customer_payable_bill.or_else(|| Some(undiscounted? * original_pct? / 100.0));
        let supplier = stored.supplier_payable_bill.or_else(|| Some(undiscounted? * (1.0 - cost_pct? / 100.0)));
        let profit = stored.profit.or_else(|| Some(customer? - supplier?));
        Financials { customer_payable_bill: customer, supplier_payable_bill: supplier, profit }
    }

    pub fn of(bill: &customer_monthly_bill::Model) -> Financials {
        Financials::derive(
            bill.undiscounted_bill,
            bill.original_billing_percentage,
            bill.cost_discount_percentage,
            Financials {
                customer_payable_bill: bill.customer_payable_bill,
                supplier_payable_bill: bill.supplier_payable_bill,
                profit: bill.profit,
            },
        )
    }
}

/// Sum of the present amounts, `0.0` when there are none.
///
/// ```
/// use service::billing::sum_amounts;
/// assert_eq!(sum_amounts([Some(1.5), None, Some(2.0)]), 3.5);
/// assert!(sum_amounts([None, None]).is_sign_positive());
/// ```
pub fn sum_amounts(values: impl IntoIterator<Item = Option<f64>>) -> f64 {
    values.into_iter().flatten().fold(0.0, |acc, v| acc + v)
}

/// `(cur - prev) / prev`, undefined without a non-zero previous value.
pub fn ratio_change(current: Option<f64>, previous: Option<f64>) -> Option<f64> {
    let prev = previous.filter(|p| *p != 0.0)?;
    Some((current? - prev) / prev)
}

pub fn current_month() -> String { Local::now().format("%Y-%m").to_string() }

/// Trimmed month or the current one, validated as `yyyy-MM`.
pub fn resolve_month(raw: Option<&str>) -> Result<String, ServiceError> {
    let month = validation::non_blank(raw).unwrap_or_else(current_month);
    validation::validate_month(&month)?;
    Ok(month)
}

/// Month preceding a validated `yyyy-MM`.
pub fn previous_month(month: &str) -> Result<String, ServiceError> {
    let first = NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d")
        .map_err(|_| ServiceError::Validation(format!("month must be yyyy-MM, got {month}")))?;
    let prev = first
        .checked_sub_months(Months::new(1))
        .ok_or_else(|| ServiceError::Validation(format!("month out of range: {month}")))?;
    Ok(prev.format("%Y-%m").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vendor_normalization() {
        assert_eq!(normalize_vendor(Some("  ")), "AWS");
        assert_eq!(normalize_vendor(Some("ALIBABA cloud")), "Ali");
        assert_eq!(normalize_vendor(Some("Microsoft Azure")), "Azure");
        assert_eq!(normalize_vendor(Some("aws")), "AWS");
        assert_eq!(normalize_vendor(Some("GCP")), "AWS");
    }

    #[test]
    fn derives_only_missing_amounts() {
        let f = Financials::derive(Some(1000.0), Some(95.0), Some(10.0), Financials::default());
        assert_eq!(f.customer_payable_bill, Some(950.0));
        assert_eq!(f.supplier_payable_bill, Some(900.0));
        assert_eq!(f.profit, Some(50.0));

        let stored = Financials { customer_payable_bill: Some(1.0), supplier_payable_bill: None, profit: None };
        let f = Financials::derive(Some(1000.0), Some(95.0), Some(10.0), stored);
        assert_eq!(f.customer_payable_bill, Some(1.0));
        assert_eq!(f.profit, Some(-899.0));
    }

    #[test]
    fn missing_inputs_stay_missing() {
        let f = Financials::derive(Some(1000.0), None, Some(10.0), Financials::default());
        assert_eq!(f.customer_payable_bill, None);
        assert_eq!(f.supplier_payable_bill, Some(900.0));
        assert_eq!(f.profit, None);
        let f = Financials::derive(None, Some(1.0), Some(1.0), Financials { profit: Some(3.0), ..Default::default() });
        assert_eq!(f.profit, Some(3.0));
    }

    #[test]
    fn month_over_month() {
        assert_eq!(ratio_change(Some(150.0), Some(100.0)), Some(0.5));
        assert_eq!(ratio_change(Some(150.0), Some(0.0)), None);
        assert_eq!(ratio_change(None, Some(10.0)), None);
        assert_eq!(ratio_change(Some(1.0), None), None);
    }

    #[test]
    fn months() {
        assert_eq!(previous_month("2024-01").unwrap(), "2023-12");
        assert_eq!(previous_month("2024-03").unwrap(), "2024-02");
        assert!(resolve_month(Some("2024-13")).is_err());
        assert_eq!(resolve_month(Some(" 2024-05 ")).unwrap(), "2024-05");
        assert_eq!(resolve_month(None).unwrap(), current_month());
    }
}
