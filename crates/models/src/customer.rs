use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{customer_uid, payer};

pub const STATUS_ACTIVE: &str = "active";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customer")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub customer_internal_id: String,
    pub customer_name: String,
    pub email: String,
    pub payer_id: Option<Uuid>,
    pub permissions: Vec<String>,
    pub original_billing_percentage: Option<f64>,
    pub products_used: Vec<String>,
    pub delivery_time: Option<String>,
    pub company: Option<String>,
    pub status: String,
    pub labels: Vec<String>,
    pub remarks: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Payer,
    Uids,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Payer => Entity::belongs_to(payer::Entity)
                .from(Column::PayerId)
                .to(payer::Column::Id)
                .into(),
            Relation::Uids => Entity::has_many(customer_uid::Entity).into(),
        }
    }
}

impl Related<customer_uid::Entity> for Entity {
    fn to() -> RelationDef { Relation::Uids.def() }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_active(&self) -> bool { self.status.eq_ignore_ascii_case(STATUS_ACTIVE) }
}
