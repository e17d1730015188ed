//! Field-level validation shared by services.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::ModelError;

static AWS_SIGNIN_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://\d{12}\.signin\.aws\.amazon\.com/.*$").expect("static regex")
});

static TWELVE_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{12}$").expect("static regex"));

static MONTH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-(0[1-9]|1[0-2])$").expect("static regex"));

static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}$").expect("static regex"));

/// AWS account ids are exactly twelve digits.
pub fn is_aws_uid(uid: &str) -> bool {
    TWELVE_DIGITS.is_match(uid.trim())
}

pub fn aws_console_url(uid: &str) -> String {
    format!("https://{}.signin.aws.amazon.com/console", uid.trim())
}

pub fn validate_signin_url(url: &str) -> Result<(), ModelError> {
    if !AWS_SIGNIN_URL.is_match(url.trim()) {
        return Err(ModelError::Validation(
            "signin_url must look like https://<12 digits>.signin.aws.amazon.com/...".into(),
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ModelError> {
    let e = email.trim();
    match e.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(ModelError::Validation(format!("invalid email: {e}"))),
    }
}

pub fn validate_percentage(field: &str, v: f64) -> Result<(), ModelError> {
    if !(0.0..=100.0).contains(&v) || v.is_nan() {
        return Err(ModelError::Validation(format!("{field} must be within 0..=100")));
    }
    Ok(())
}

/// `yyyy-MM`
pub fn validate_month(month: &str) -> Result<(), ModelError> {
    if !MONTH.is_match(month) {
        return Err(ModelError::Validation(format!("month must be yyyy-MM, got {month}")));
    }
    Ok(())
}

pub fn validate_year(year: &str) -> Result<(), ModelError> {
    if !YEAR.is_match(year) {
        return Err(ModelError::Validation(format!("year must be yyyy, got {year}")));
    }
    Ok(())
}

/// Trim and strip backticks pasted around URLs.
pub fn sanitize_url(raw: &str) -> String {
    raw.trim().trim_matches('`').trim().to_string()
}

/// Split a comma separated input into trimmed, non-empty values.
pub fn split_csv(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// `Some(trimmed)` for non-blank input.
pub fn non_blank(v: Option<&str>) -> Option<String> {
    v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aws_uid_detection() {
        assert!(is_aws_uid("123456789012"));
        assert!(is_aws_uid(" 123456789012 "));
        assert!(!is_aws_uid("12345678901"));
        assert!(!is_aws_uid("12345678901a"));
    }

    #[test]
    fn signin_url_pattern() {
        assert!(validate_signin_url("https://123456789012.signin.aws.amazon.com/console").is_ok());
        assert!(validate_signin_url("https://example.com/console").is_err());
        assert!(validate_signin_url("http://123456789012.signin.aws.amazon.com/console").is_err());
    }

    #[test]
    fn month_and_year_formats() {
        assert!(validate_month("2024-01").is_ok());
        assert!(validate_month("2024-13").is_err());
        assert!(validate_month("2024-1").is_err());
        assert!(validate_year("2024").is_ok());
        assert!(validate_year("24").is_err());
    }

    #[test]
    fn percentage_bounds() {
        assert!(validate_percentage("risk_discount", 0.0).is_ok());
        assert!(validate_percentage("risk_discount", 100.0).is_ok());
        assert!(validate_percentage("risk_discount", 100.5).is_err());
        assert!(validate_percentage("risk_discount", -1.0).is_err());
    }

    #[test]
    fn sanitize_strips_backticks() {
        assert_eq!(sanitize_url("  `https://a.b/c`  "), "https://a.b/c");
        assert_eq!(sanitize_url("``"), "");
    }

    #[test]
    fn csv_split_drops_empties() {
        assert_eq!(split_csv(Some(" a, ,b ,")), vec!["a".to_string(), "b".to_string()]);
        assert!(split_csv(None).is_empty());
    }

    #[test]
    fn email_shape() {
        assert!(validate_email("a@b.com").is_ok());
        assert!(validate_email("@b.com").is_err());
        assert!(validate_email("ab.com").is_err());
    }
}
