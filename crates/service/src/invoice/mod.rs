//! Customer invoices and their line items.

pub mod line_items;
pub mod service;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use models::{invoice, invoice_line_item};
use line_items::LineItemInput;

pub use service::{create, delete, get, list, post, update};

#[derive(Debug, Default, Clone, Deserialize)]
pub struct InvoiceQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// Body of create and update requests; absent fields are left alone on update.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct InvoiceInput {
    pub customer_monthly_bill_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub currency: Option<String>,
    pub tax_number: Option<String>,
    pub payment_reference: Option<String>,
    pub activities: Option<Vec<String>>,
    pub terms: Option<String>,
    pub status: Option<String>,
    pub items: Option<Vec<LineItemInput>>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct DeleteInvoices {
    #[serde(default)]
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LineItemView {
    pub id: Uuid,
    pub product_id: Option<String>,
    pub label: String,
    pub quantity: i32,
    pub price: f64,
    pub discount_pct: f64,
    pub tax_pct: f64,
    pub amount_ex_tax: f64,
    pub amount_inc_tax: f64,
}

impl From<invoice_line_item::Model> for LineItemView {
    fn from(l: invoice_line_item::Model) -> Self {
        Self {
            id: l.id,
            product_id: l.product_id,
            label: l.label,
            quantity: l.quantity,
            price: l.price,
            discount_pct: l.discount_pct,
            tax_pct: l.tax_pct,
            amount_ex_tax: l.amount_ex_tax,
            amount_inc_tax: l.amount_inc_tax,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceView {
    pub id: Uuid,
    pub invoice_number: String,
    pub customer_name: String,
    pub invoice_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub currency: String,
    pub tax_number: Option<String>,
    pub payment_reference: Option<String>,
    pub activities: Vec<String>,
    pub terms: Option<String>,
    pub status: String,
    pub subtotal_ex_tax: f64,
    pub tax_total: f64,
    pub grand_total: f64,
    pub items: Vec<LineItemView>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl InvoiceView {
    pub fn build(i: invoice::Model, items: Vec<invoice_line_item::Model>) -> Self {
        Self {
            id: i.id,
            invoice_number: i.invoice_number,
            customer_name: i.customer_name,
            invoice_date: i.invoice_date,
            due_date: i.due_date,
            currency: i.currency,
            tax_number: i.tax_number,
            payment_reference: i.payment_reference,
            activities: i.activities,
            terms: i.terms,
            status: i.status,
            subtotal_ex_tax: i.subtotal_ex_tax,
            tax_total: i.tax_total,
            grand_total: i.grand_total,
            items: items.into_iter().map(LineItemView::from).collect(),
            created_at: i.created_at,
            updated_at: i.updated_at,
        }
    }
}
