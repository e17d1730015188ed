//! Revenue, cost and profit roll-ups per cloud vendor.

use std::collections::BTreeMap;

use chrono::{Datelike, Local};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::instrument;

use models::{customer_monthly_bill as bill, validation};
use crate::billing::{monthly_bill_service::{bills_for_month, bills_for_year}, previous_month, resolve_month};
use crate::errors::ServiceError;
use crate::invoice::line_items::round2;

/// Amounts of one bill with every missing value counted as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Amounts {
    pub revenue: f64,
    pub customer_payable: f64,
    pub cost: f64,
    pub profit: f64,
}

impl Amounts {
    pub fn of(b: &bill::Model) -> Amounts {
        let und = b.undiscounted_bill;
        let customer_payable = b
            .customer_payable_bill
            .or_else(|| Some(und? * b.original_billing_percentage? / 100.0))
            .unwrap_or(0.0);
        let cost = b
            .supplier_payable_bill
            .or_else(|| Some(und? * (1.0 - b.cost_discount_percentage? / 100.0)))
            .unwrap_or(0.0);
        let profit = b.profit.unwrap_or(customer_payable - cost);
        Amounts { revenue: und.unwrap_or(0.0), customer_payable, cost, profit }
    }

    fn add(&mut self, o: Amounts) {
        self.revenue += o.revenue;
        self.customer_payable += o.customer_payable;
        self.cost += o.cost;
        self.profit += o.profit;
    }
}

pub fn calculate_financials(b: &bill::Model) -> Amounts { Amounts::of(b) }

/// `12.5` → `"12.5%"`, `0` → `"0.0%"`.
pub fn percent(v: f64) -> String { format!("{:?}%", round2(v)) }

fn share(part: f64, whole: f64) -> f64 { if whole != 0.0 { part / whole * 100.0 } else { 0.0 } }

fn by_vendor(bills: &[bill::Model]) -> BTreeMap<String, Amounts> {
    let mut out: BTreeMap<String, Amounts> = BTreeMap::new();
    for b in bills {
        out.entry(b.cloud_vendor.clone()).or_default().add(Amounts::of(b));
    }
    out
}

fn total(bills: &[bill::Model]) -> Amounts {
    let mut t = Amounts::default();
    for b in bills {
        t.add(Amounts::of(b));
    }
    t
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VendorAmounts {
    pub cloud_vendor: String,
    pub revenue: f64,
    pub customer_payable: f64,
    pub cost: f64,
    pub profit: f64,
}

impl VendorAmounts {
    fn new(vendor: &str, a: Amounts) -> Self {
        Self {
            cloud_vendor: vendor.to_string(),
            revenue: round2(a.revenue),
            customer_payable: round2(a.customer_payable),
            cost: round2(a.cost),
            profit: round2(a.profit),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VendorMonthStat {
    #[serde(flatten)]
    pub amounts: VendorAmounts,
    pub margin: String,
    pub profit_share: String,
    pub revenue_mom: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthOverview {
    pub total_revenue: f64,
    pub tax: f64,
    pub total_cost: f64,
    pub total_profit: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthlyAnalysis {
    pub month: String,
    pub this_month_revenue_by_provider: Vec<VendorMonthStat>,
    pub last_month_revenue_by_provider: Vec<VendorAmounts>,
    pub this_month_overview: MonthOverview,
}

pub fn monthly_report(month: &str, current: &[bill::Model], previous: &[bill::Model]) -> MonthlyAnalysis {
    let totals = total(current);
    let prev = by_vendor(previous);
    let this_month = by_vendor(current)
        .into_iter()
        .map(|(vendor, a)| {
            let prev_revenue = prev.get(&vendor).map(|p| p.revenue).unwrap_or(0.0);
            let revenue_mom = if prev_revenue != 0.0 {
                percent((a.revenue - prev_revenue) / prev_revenue * 100.0)
            } else {
                "-".to_string()
            };
            VendorMonthStat {
                margin: percent(share(a.profit, a.revenue)),
                profit_share: percent(share(a.profit, totals.profit)),
                revenue_mom,
                amounts: VendorAmounts::new(&vendor, a),
            }
        })
        .collect();
    MonthlyAnalysis {
        month: month.to_string(),
        this_month_revenue_by_provider: this_month,
        last_month_revenue_by_provider: prev.iter().map(|(v, a)| VendorAmounts::new(v, *a)).collect(),
        this_month_overview: MonthOverview {
            total_revenue: round2(totals.revenue),
            tax: 0.0,
            total_cost: round2(totals.cost),
            total_profit: round2(totals.profit),
        },
    }
}

/// `All`, `全部` or blank mean every vendor.
pub fn vendor_filter(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("all") && *s != "全部")
}

#[instrument(skip(db))]
pub async fn monthly(db: &DatabaseConnection, month: Option<&str>, cloud_provider: Option<&str>) -> Result<MonthlyAnalysis, ServiceError> {
    let month = resolve_month(month)?;
    let prev_month = previous_month(&month)?;
    let vendor = vendor_filter(cloud_provider);
    let current = bills_for_month(db, &month, None, None, vendor).await?;
    let previous = bills_for_month(db, &prev_month, None, None, vendor).await?;
    Ok(monthly_report(&month, &current, &previous))
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct YearOverview {
    pub total_revenue: f64,
    pub total_cost: f64,
    pub total_tax: f64,
    pub total_profit: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RevenueComparison {
    pub cloud_vendor: String,
    pub this_year: f64,
    pub last_year: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RevenueShare {
    pub cloud_vendor: String,
    pub revenue: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct YearDetail {
    #[serde(flatten)]
    pub amounts: VendorAmounts,
    pub margin: String,
    pub share: String,
    pub yoy_growth: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct YearlyAnalysis {
    pub year: i32,
    pub overview: YearOverview,
    pub revenue_comparison: Vec<RevenueComparison>,
    pub revenue_share: Vec<RevenueShare>,
    pub details: Vec<YearDetail>,
}

pub fn yearly_report(year: i32, this_year: &[bill::Model], last_year: &[bill::Model]) -> YearlyAnalysis {
    let totals = total(this_year);
    let cur = by_vendor(this_year);
    let prev = by_vendor(last_year);

    let mut vendors: Vec<&String> = cur.keys().chain(prev.keys()).collect();
    vendors.sort();
    vendors.dedup();
    let revenue_comparison = vendors
        .into_iter()
        .map(|v| RevenueComparison {
            cloud_vendor: v.clone(),
            this_year: round2(cur.get(v).map(|a| a.revenue).unwrap_or(0.0)),
            last_year: round2(prev.get(v).map(|a| a.revenue).unwrap_or(0.0)),
        })
        .collect();
    let positive_share = |part: f64| if totals.revenue > 0.0 { part / totals.revenue * 100.0 } else { 0.0 };
    let revenue_share = cur
        .iter()
        .map(|(v, a)| RevenueShare { cloud_vendor: v.clone(), revenue: round2(a.revenue), percentage: round2(positive_share(a.revenue)) })
        .collect();
    let details = cur
        .iter()
        .map(|(v, a)| {
            let last = prev.get(v).map(|p| p.revenue).unwrap_or(0.0);
            let yoy = if last > 0.0 { (a.revenue - last) / last * 100.0 } else { 0.0 };
            YearDetail {
                amounts: VendorAmounts::new(v, *a),
                margin: percent(if a.revenue > 0.0 { a.profit / a.revenue * 100.0 } else { 0.0 }),
                share: percent(positive_share(a.revenue)),
                yoy_growth: percent(yoy),
            }
        })
        .collect();
    YearlyAnalysis {
        year,
        overview: YearOverview {
            total_revenue: round2(totals.revenue),
            total_cost: round2(totals.cost),
            total_tax: 0.0,
            total_profit: round2(totals.profit),
        },
        revenue_comparison,
        revenue_share,
        details,
    }
}

#[instrument(skip(db))]
pub async fn yearly(db: &DatabaseConnection, year: Option<i32>) -> Result<YearlyAnalysis, ServiceError> {
    let year = year.unwrap_or_else(|| Local::now().year());
    validation::validate_year(&year.to_string())?;
    let this_year = bills_for_year(db, year).await?;
    let last_year = bills_for_year(db, year - 1).await?;
    Ok(yearly_report(year, &this_year, &last_year))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn b(vendor: &str, month: &str, und: Option<f64>, orig: Option<f64>, cost: Option<f64>) -> bill::Model {
        let now = Utc::now().into();
        bill::Model {
            id: Uuid::new_v4(),
            month: month.into(),
            cloud_vendor: vendor.into(),
            customer_name: "c".into(),
            linked_account_uid: "1".into(),
            original_billing_percentage: orig,
            total_bill: None,
            undiscounted_bill: und,
            cost_discount_percentage: cost,
            customer_payable_bill: None,
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

    #[test]
    fn nulls_count_as_zero() {
        let a = Amounts::of(&b("AWS", "2024-01", None, None, None));
        assert_eq!(a, Amounts::default());
        let a = Amounts::of(&b("AWS", "2024-01", Some(100.0), None, Some(20.0)));
        assert_eq!(a.customer_payable, 0.0);
        assert_eq!(a.cost, 80.0);
        assert_eq!(a.profit, -80.0);
    }

    #[test]
    fn percent_format() {
        assert_eq!(percent(12.5), "12.5%");
        assert_eq!(percent(0.0), "0.0%");
        assert_eq!(percent(33.3333), "33.33%");
    }

    #[test]
    fn monthly_by_vendor() {
        let current = vec![
            b("AWS", "2024-02", Some(200.0), Some(100.0), Some(50.0)),
            b("Ali", "2024-02", Some(100.0), Some(100.0), Some(0.0)),
        ];
        let previous = vec![b("AWS", "2024-01", Some(100.0), Some(100.0), Some(50.0))];
        let r = monthly_report("2024-02", &current, &previous);
        assert_eq!(r.this_month_overview.total_revenue, 300.0);
        assert_eq!(r.this_month_overview.total_profit, 100.0);
        let aws = &r.this_month_revenue_by_provider[0];
        assert_eq!(aws.amounts.cloud_vendor, "AWS");
        let ali = &r.this_month_revenue_by_provider[1];
        assert_eq!(ali.revenue_mom, "-");
        assert_eq!(ali.profit_share, "0.0%");
        assert_eq!(aws.margin, "50.0%");
        assert_eq!(aws.profit_share, "100.0%");
        assert_eq!(aws.revenue_mom, "100.0%");
        assert_eq!(r.last_month_revenue_by_provider.len(), 1);
    }

    #[test]
    fn yearly_comparison() {
        let this_year = vec![b("AWS", "2024-03", Some(300.0), Some(100.0), Some(0.0)), b("Azure", "2024-04", Some(100.0), None, None)];
        let last_year = vec![b("AWS", "2023-03", Some(200.0), None, None), b("Ali", "2023-01", Some(10.0), None, None)];
        let r = yearly_report(2024, &this_year, &last_year);
        assert_eq!(r.overview.total_revenue, 400.0);
        assert_eq!(r.revenue_comparison.len(), 3);
        assert_eq!(r.revenue_comparison[0].cloud_vendor, "AWS");
        assert_eq!(r.revenue_comparison[1].this_year, 0.0);
        assert_eq!(r.revenue_share[0].percentage, 75.0);
        assert_eq!(r.details[0].yoy_growth, "50.0%");
        assert_eq!(r.details[1].yoy_growth, "0.0%");
        assert_eq!(r.details[1].share, "25.0%");
    }

    #[test]
    fn provider_filter() {
        assert_eq!(vendor_filter(Some("All")), None);
        assert_eq!(vendor_filter(Some("全部")), None);
        assert_eq!(vendor_filter(Some(" ")), None);
        assert_eq!(vendor_filter(Some("AWS")), Some("AWS"));
    }

    #[tokio::test]
    async fn yearly_rejects_short_years() {
        let db = DatabaseConnection::Disconnected;
        assert_eq!(yearly(&db, Some(999)).await.unwrap_err().code(), 400);
        assert_eq!(yearly(&db, Some(-2024)).await.unwrap_err().code(), 400);
    }
}
