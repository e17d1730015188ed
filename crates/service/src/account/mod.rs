//! Cloud vendor accounts and their payer / customer / mailbox links.

pub mod links;
pub mod rules;
pub mod service;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::payer_service::PayerSummary;

pub use service::{add_account, detail, list, sp_list, update_account};

#[derive(Debug, Default, Clone, Deserialize)]
pub struct AccountQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub search: Option<String>,
    pub vendor: Option<String>,
    /// Category filter; `account_category` is accepted as an alias.
    pub account_type: Option<String>,
    pub account_category: Option<String>,
    pub account_source: Option<String>,
    pub label: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// Body of `addAccount` and of account updates. `account_type` carries the category.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AccountInput {
    pub uid: Option<String>,
    pub account_name: Option<String>,
    pub vendor: Option<String>,
    #[serde(alias = "account_category")]
    pub account_type: Option<String>,
    pub mfa_status: Option<String>,
    pub account_source: Option<String>,
    pub account_attribution: Option<String>,
    pub monitor_email: Option<String>,
    pub monitor_url: Option<String>,
    pub is_monitored_sp: Option<bool>,
    pub monitor_bill_group: Option<String>,
    pub send_po: Option<bool>,
    pub bound_credit_card: Option<String>,
    pub bound_email: Option<String>,
    pub risk_discount: Option<f64>,
    pub cost_discount: Option<f64>,
    pub bd_name: Option<String>,
    pub remarks: Option<String>,
    pub is_submitted: Option<bool>,
    pub is_new: Option<bool>,
    pub labels: Option<Vec<String>>,
    pub payer_id: Option<String>,
    pub customer_id: Option<String>,
    pub email_id: Option<String>,
    pub email_address: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PayerRef {
    pub payer_id: String,
    pub payer_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerRef {
    pub customer_id: String,
    pub customer_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmailRef {
    pub email_id: String,
    pub email_address: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountRow {
    pub account_internal_id: String,
    pub uid: String,
    pub account_name: String,
    pub vendor: Option<String>,
    pub account_type: Option<String>,
    pub account_category: Option<String>,
    pub account_source: Option<String>,
    pub is_submitted: bool,
    pub is_monitored_sp: bool,
    pub labels: Vec<String>,
    pub created_at: DateTime<FixedOffset>,
    pub payer: Option<PayerRef>,
    pub customer: Option<CustomerRef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountDetail {
    pub account_internal_id: String,
    pub uid: String,
    pub account_name: String,
    pub vendor: Option<String>,
    pub account_type: Option<String>,
    pub account_category: Option<String>,
    pub mfa_status: Option<String>,
    pub account_source: Option<String>,
    pub account_attribution: Option<String>,
    pub monitor_email: Option<String>,
    pub monitor_url: Option<String>,
    pub is_monitored_sp: bool,
    pub monitor_bill_group: Option<String>,
    pub send_po: bool,
    pub bound_credit_card: Option<String>,
    pub bound_email: Option<String>,
    pub risk_discount: Option<f64>,
    pub cost_discount: Option<f64>,
    pub bd_name: Option<String>,
    pub remarks: Option<String>,
    pub is_submitted: bool,
    pub is_new: bool,
    pub labels: Vec<String>,
    pub created_at: DateTime<FixedOffset>,
    pub payer: Option<PayerSummary>,
    pub customer: Option<CustomerRef>,
    pub email: Option<EmailRef>,
}

/// Response of `addAccount`: the stored account flattened with its links.
#[derive(Debug, Clone, Serialize)]
pub struct AccountCreated {
    pub account_id: String,
    pub uid: String,
    pub account_name: String,
    pub vendor: Option<String>,
    pub account_type: Option<String>,
    pub account_category: Option<String>,
    pub mfa_status: Option<String>,
    pub account_source: Option<String>,
    pub account_attribution: Option<String>,
    pub is_monitored_sp: bool,
    pub is_new: bool,
    pub monitor_bill_group: Option<String>,
    pub send_po: bool,
    pub bound_credit_card: Option<String>,
    pub bound_email: Option<String>,
    pub monitor_email: Option<String>,
    pub monitor_url: Option<String>,
    pub risk_discount: Option<f64>,
    pub cost_discount: Option<f64>,
    pub remarks: Option<String>,
    pub is_submitted: bool,
    pub payer_id: String,
    pub payer_name: String,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub email_id: Option<String>,
    pub email_address: Option<String>,
    pub created_at: DateTime<FixedOffset>,
}
