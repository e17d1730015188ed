use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{customer, email, payer};

/// Category marking an account monitored for the service provider.
pub const CATEGORY_SP: &str = "SP Account";
/// Legacy placeholder stored in `vendor` by older imports.
pub const LEGACY_CUSTOMER_ACCOUNT: &str = "Customer Account";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "account")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub account_internal_id: String,
    #[sea_orm(unique)]
    pub uid: String,
    pub account_name: String,
    pub vendor: Option<String>,
    pub account_category: Option<String>,
    pub account_source: Option<String>,
    pub account_attribution: Option<String>,
    pub monitor_email: Option<String>,
    pub monitor_url: Option<String>,
    pub mfa_status: Option<String>,
    pub is_monitored_sp: bool,
    pub monitor_bill_group: Option<String>,
    pub send_po: bool,
    #[serde(skip_serializing)]
    pub bound_credit_card_encrypted: Option<String>,
    pub bound_credit_card_masked: Option<String>,
    pub bound_email: Option<String>,
    pub risk_discount: Option<f64>,
    pub cost_discount: Option<f64>,
    pub bd_name: Option<String>,
    pub remarks: Option<String>,
    pub is_submitted: bool,
    pub is_new: bool,
    pub labels: Vec<String>,
    pub payer_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub linked_email_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Payer,
    Customer,
    Email,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Payer => Entity::belongs_to(payer::Entity)
                .from(Column::PayerId)
                .to(payer::Column::Id)
                .into(),
            Relation::Customer => Entity::belongs_to(customer::Entity)
                .from(Column::CustomerId)
                .to(customer::Column::Id)
                .into(),
            Relation::Email => Entity::belongs_to(email::Entity)
                .from(Column::LinkedEmailId)
                .to(email::Column::Id)
                .into(),
        }
    }
}

impl Related<payer::Entity> for Entity {
    fn to() -> RelationDef { Relation::Payer.def() }
}

impl Related<customer::Entity> for Entity {
    fn to() -> RelationDef { Relation::Customer.def() }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_sp(&self) -> bool {
        self.is_monitored_sp || self.account_category.as_deref() == Some(CATEGORY_SP)
    }

    /// Vendor and category as they should be shown, with legacy
    /// `Customer Account` vendors mapped back to a real vendor.
    pub fn display_vendor_category(&self) -> (Option<String>, Option<String>) {
        if self.vendor.as_deref() != Some(LEGACY_CUSTOMER_ACCOUNT) {
            return (self.vendor.clone(), self.account_category.clone());
        }
        let vendor = if crate::validation::is_aws_uid(&self.uid) { Some("AWS".to_string()) } else { self.vendor.clone() };
        let category = self.account_category.clone().or_else(|| Some(LEGACY_CUSTOMER_ACCOUNT.to_string()));
        (vendor, category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample(uid: &str, vendor: Option<&str>, category: Option<&str>) -> Model {
        let now = Utc::now().into();
        Model {
            id: Uuid::new_v4(),
            account_internal_id: "acc_20240101_001".into(),
            uid: uid.into(),
            account_name: "n".into(),
            vendor: vendor.map(Into::into),
            account_category: category.map(Into::into),
            account_source: None,
            account_attribution: None,
            monitor_email: None,
            monitor_url: None,
            mfa_status: None,
            is_monitored_sp: false,
            monitor_bill_group: None,
            send_po: false,
            bound_credit_card_encrypted: None,
            bound_credit_card_masked: None,
            bound_email: None,
            risk_discount: None,
            cost_discount: None,
            bd_name: None,
            remarks: None,
            is_submitted: false,
            is_new: true,
            labels: vec![],
            payer_id: None,
            customer_id: None,
            linked_email_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn legacy_vendor_maps_to_aws_for_twelve_digit_uid() {
        let m = sample("123456789012", Some(LEGACY_CUSTOMER_ACCOUNT), None);
        let (v, c) = m.display_vendor_category();
        assert_eq!(v.as_deref(), Some("AWS"));
        assert_eq!(c.as_deref(), Some(LEGACY_CUSTOMER_ACCOUNT));
    }

    #[test]
    fn legacy_vendor_kept_for_other_uids() {
        let m = sample("abc", Some(LEGACY_CUSTOMER_ACCOUNT), Some("Direct"));
        let (v, c) = m.display_vendor_category();
        assert_eq!(v.as_deref(), Some(LEGACY_CUSTOMER_ACCOUNT));
        assert_eq!(c.as_deref(), Some("Direct"));
    }

    #[test]
    fn sp_by_flag_or_category() {
        assert!(sample("1", None, Some(CATEGORY_SP)).is_sp());
        let mut m = sample("1", None, None);
        assert!(!m.is_sp());
        m.is_monitored_sp = true;
        assert!(m.is_sp());
    }
}
