use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{account, customer, invoice};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customer_monthly_bill")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// `yyyy-MM`
    pub month: String,
    pub cloud_vendor: String,
    pub customer_name: String,
    pub linked_account_uid: String,
    pub original_billing_percentage: Option<f64>,
    pub total_bill: Option<f64>,
    pub undiscounted_bill: Option<f64>,
    pub cost_discount_percentage: Option<f64>,
    pub customer_payable_bill: Option<f64>,
    pub supplier_payable_bill: Option<f64>,
    pub profit: Option<f64>,
    pub remarks: Option<String>,
    pub is_invoiced: bool,
    pub invoice_status: String,
    pub invoice_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Invoice,
    Account,
    Customer,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Invoice => Entity::belongs_to(invoice::Entity)
                .from(Column::InvoiceId)
                .to(invoice::Column::Id)
                .into(),
            Relation::Account => Entity::belongs_to(account::Entity)
                .from(Column::AccountId)
                .to(account::Column::Id)
                .into(),
            Relation::Customer => Entity::belongs_to(customer::Entity)
                .from(Column::CustomerId)
                .to(customer::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}
