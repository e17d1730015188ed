use std::{fmt, str::FromStr};

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{errors::ModelError, invoice_line_item};

/// Lifecycle of an invoice and of the bills attached to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InvoiceStatus {
    Draft,
    Posted,
    Sent,
    Paid,
    Overdue,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "DRAFT",
            InvoiceStatus::Posted => "POSTED",
            InvoiceStatus::Sent => "SENT",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::Overdue => "OVERDUE",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for InvoiceStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DRAFT" => Ok(InvoiceStatus::Draft),
            "POSTED" => Ok(InvoiceStatus::Posted),
            "SENT" => Ok(InvoiceStatus::Sent),
            "PAID" => Ok(InvoiceStatus::Paid),
            "OVERDUE" => Ok(InvoiceStatus::Overdue),
            other => Err(ModelError::Validation(format!("unknown invoice status: {other}"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoice")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub invoice_number: String,
    pub customer_name: String,
    pub invoice_date: Date,
    pub due_date: Option<Date>,
    pub currency: String,
    pub tax_number: Option<String>,
    pub payment_reference: Option<String>,
    pub activities: Vec<String>,
    pub terms: Option<String>,
    pub status: String,
    pub subtotal_ex_tax: f64,
    pub tax_total: f64,
    pub grand_total: f64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { LineItems }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::LineItems => Entity::has_many(invoice_line_item::Entity).into(),
        }
    }
}

impl Related<invoice_line_item::Entity> for Entity {
    fn to() -> RelationDef { Relation::LineItems.def() }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!("posted".parse::<InvoiceStatus>().unwrap(), InvoiceStatus::Posted);
        assert_eq!(InvoiceStatus::Overdue.to_string(), "OVERDUE");
        assert!("VOID".parse::<InvoiceStatus>().is_err());
    }
}
