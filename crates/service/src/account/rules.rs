//! Pure validation for account writes.

use models::{account::CATEGORY_SP, validation};

use super::AccountInput;
use crate::errors::ServiceError;

pub const MAX_UID_LEN: usize = 64;

/// Everything `addAccount` needs before touching the database.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub uid: String,
    pub account_name: String,
    pub vendor: String,
    pub category: String,
    pub account_source: String,
    pub account_attribution: String,
    pub monitor_email: String,
    pub monitor_url: String,
    pub bound_email: String,
    pub is_monitored_sp: bool,
    pub monitor_bill_group: String,
    pub bound_credit_card: String,
    pub risk_discount: f64,
    pub cost_discount: f64,
    pub payer_key: String,
}

fn text(v: &Option<String>, field: &str) -> Result<String, ServiceError> {
    validation::non_blank(v.as_deref()).ok_or_else(|| ServiceError::required(field))
}

fn number(v: Option<f64>, field: &str) -> Result<f64, ServiceError> {
    let n = v.ok_or_else(|| ServiceError::required(field))?;
    validation::validate_percentage(field, n)?;
    Ok(n)
}

pub fn check_uid(uid: &str) -> Result<(), ServiceError> {
    if uid.chars().count() > MAX_UID_LEN {
        return Err(ServiceError::Validation(format!("UID 长度不能超过 {MAX_UID_LEN}")));
    }
    Ok(())
}

/// Console URL for a new account: twelve-digit uids always get the AWS sign-in URL.
pub fn monitor_url_for_new(uid: &str, raw: Option<&str>) -> Result<String, ServiceError> {
    if validation::is_aws_uid(uid) {
        return Ok(validation::aws_console_url(uid));
    }
    raw.map(validation::sanitize_url)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ServiceError::Validation("monitor_url 必填（非 12 位 UID 无法自动生成）".into()))
}

/// New console URL on update, if any: a given URL wins, otherwise AWS uids get a default
/// only when nothing is stored yet.
pub fn monitor_url_for_update(uid: &str, raw: Option<&str>, stored: Option<&str>) -> Option<String> {
    if let Some(url) = raw.map(validation::sanitize_url).filter(|s| !s.is_empty()) {
        return Some(url);
    }
    let has_stored = stored.map(|s| !s.trim().is_empty()).unwrap_or(false);
    if validation::is_aws_uid(uid) && !has_stored {
        return Some(validation::aws_console_url(uid));
    }
    None
}

/// Card numbers echoed back in masked form are not a change.
pub fn card_update(raw: Option<&str>) -> Option<String> {
    validation::non_blank(raw).filter(|c| !c.contains('*'))
}

pub fn is_sp_category(category: &str) -> bool { category.trim() == CATEGORY_SP }

/// First non-blank mailbox address among the explicit, bound and monitor emails.
pub fn candidate_address(input: &AccountInput) -> Option<String> {
    [&input.email_address, &input.bound_email, &input.monitor_email]
        .into_iter()
        .find_map(|v| validation::non_blank(v.as_deref()))
}

pub fn validate_new(input: &AccountInput) -> Result<NewAccount, ServiceError> {
    let uid = text(&input.uid, "uid")?;
    check_uid(&uid)?;
    let risk_discount = number(input.risk_discount, "risk_discount")?;
    let cost_discount = number(input.cost_discount, "cost_discount")?;
    let payer_key = text(&input.payer_id, "payer_id")?;
    let monitor_email = text(&input.monitor_email, "monitor_email")?;
    let bound_email = text(&input.bound_email, "bound_email")?;
    let account_name = text(&input.account_name, "account_name")?;
    let vendor = text(&input.vendor, "vendor")?;
    let category = text(&input.account_type, "account_type")?;
    let account_source = text(&input.account_source, "account_source")?;
    let account_attribution = text(&input.account_attribution, "account_attribution")?;
    let is_monitored_sp = input.is_monitored_sp.ok_or_else(|| ServiceError::required("is_monitored_sp"))?;
    let monitor_bill_group = text(&input.monitor_bill_group, "monitor_bill_group")?;
    let monitor_url = monitor_url_for_new(&uid, input.monitor_url.as_deref())?;
    let bound_credit_card = text(&input.bound_credit_card, "bound_credit_card")?;

    Ok(NewAccount {
        is_monitored_sp: is_monitored_sp || is_sp_category(&category),
        uid,
        account_name,
        vendor,
        category,
        account_source,
        account_attribution,
        monitor_email,
        monitor_url,
        bound_email,
        monitor_bill_group,
        bound_credit_card,
        risk_discount,
        cost_discount,
        payer_key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_input(uid: &str) -> AccountInput {
        AccountInput {
            uid: Some(uid.into()),
            account_name: Some("Prod".into()),
            vendor: Some("AWS".into()),
            account_type: Some("Customer Account".into()),
            account_source: Some("Direct".into()),
            account_attribution: Some("Team A".into()),
            monitor_email: Some("mon@example.com".into()),
            bound_email: Some("bound@example.com".into()),
            is_monitored_sp: Some(false),
            monitor_bill_group: Some("group-1".into()),
            bound_credit_card: Some("4111 1111 1111 4321".into()),
            risk_discount: Some(5.0),
            cost_discount: Some(12.5),
            payer_id: Some("payer_20240101_001".into()),
            ..Default::default()
        }
    }

    #[test]
    fn required_fields_are_named() {
        let mut i = full_input("123456789012");
        i.monitor_bill_group = Some("  ".into());
        assert_eq!(validate_new(&i).unwrap_err().to_string(), "validation error: monitor_bill_group 必填");
        let mut i = full_input("123456789012");
        i.is_monitored_sp = None;
        assert_eq!(validate_new(&i).unwrap_err().to_string(), "validation error: is_monitored_sp 必填");
    }

    #[test]
    fn percentages_bounded() {
        let mut i = full_input("123456789012");
        i.cost_discount = Some(100.1);
        assert_eq!(validate_new(&i).unwrap_err().code(), 400);
    }

    #[test]
    fn uid_length_limit() {
        let i = full_input(&"x".repeat(65));
        assert!(validate_new(&i).unwrap_err().to_string().contains("64"));
    }

    #[test]
    fn aws_uid_overrides_given_url() {
        let mut i = full_input("123456789012");
        i.monitor_url = Some("https://other.example.com".into());
        let n = validate_new(&i).unwrap();
        assert_eq!(n.monitor_url, "https://123456789012.signin.aws.amazon.com/console");
    }

    #[test]
    fn non_aws_uid_needs_url() {
        let i = full_input("azure-sub-1");
        assert!(validate_new(&i).is_err());
        let mut i = full_input("azure-sub-1");
        i.monitor_url = Some("`https://portal.azure.com`".into());
        assert_eq!(validate_new(&i).unwrap().monitor_url, "https://portal.azure.com");
    }

    #[test]
    fn sp_category_forces_flag() {
        let mut i = full_input("123456789012");
        i.account_type = Some("SP Account".into());
        assert!(validate_new(&i).unwrap().is_monitored_sp);
    }

    #[test]
    fn update_url_rules() {
        assert_eq!(
            monitor_url_for_update("123456789012", None, None).as_deref(),
            Some("https://123456789012.signin.aws.amazon.com/console")
        );
        assert_eq!(monitor_url_for_update("123456789012", None, Some("https://kept")), None);
        assert_eq!(monitor_url_for_update("abc", Some(" `https://new` "), None).as_deref(), Some("https://new"));
        assert_eq!(monitor_url_for_update("abc", None, None), None);
    }

    #[test]
    fn masked_card_is_not_an_update() {
        assert_eq!(card_update(Some("************1234")), None);
        assert_eq!(card_update(Some("")), None);
        assert_eq!(card_update(Some("4111111111111234")).as_deref(), Some("4111111111111234"));
    }

    #[test]
    fn candidate_address_order() {
        let mut i = full_input("1");
        assert_eq!(candidate_address(&i).as_deref(), Some("bound@example.com"));
        i.email_address = Some("explicit@example.com".into());
        assert_eq!(candidate_address(&i).as_deref(), Some("explicit@example.com"));
        i.email_address = None;
        i.bound_email = Some(" ".into());
        assert_eq!(candidate_address(&i).as_deref(), Some("mon@example.com"));
    }
}
