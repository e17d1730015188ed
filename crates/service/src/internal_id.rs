//! Human-readable sequential identifiers such as `acc_20240315_007`.
//!
//! The next value is derived from the largest numeric suffix already stored
//! under the same prefix. Unique indexes on the target columns turn a lost
//! race into a conflict instead of a duplicate.

use chrono::NaiveDate;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect};

use crate::errors::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Payer,
    Account,
    Customer,
    Email,
}

impl IdKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdKind::Payer => "payer",
            IdKind::Account => "acc",
            IdKind::Customer => "cus",
            IdKind::Email => "email",
        }
    }
}

/// `<kind>_<yyyyMMdd>_`
pub fn prefix(kind: IdKind, day: NaiveDate) -> String {
    format!("{}_{}_", kind.as_str(), day.format("%Y%m%d"))
}

/// `PR-<yyyyMMdd>-`
pub fn payment_reference_prefix(day: NaiveDate) -> String {
    format!("PR-{}-", day.format("%Y%m%d"))
}

/// `INV-<yyyyMM>-`
pub fn invoice_number_prefix(day: NaiveDate) -> String {
    format!("INV-{}-", day.format("%Y%m"))
}

/// Next identifier under `prefix` given the identifiers already taken.
///
/// Suffixes are zero-padded to three digits and keep growing past 999.
/// Values whose suffix is not a number are ignored.
///
/// ```
/// use service::internal_id::next_sequence;
/// assert_eq!(next_sequence("acc_20240101_", &[]), "acc_20240101_001");
/// let taken = vec!["acc_20240101_009".to_string(), "acc_20240101_010".to_string()];
/// assert_eq!(next_sequence("acc_20240101_", &taken), "acc_20240101_011");
/// ```
pub fn next_sequence(prefix: &str, existing: &[String]) -> String {
    let max = existing
        .iter()
        .filter_map(|id| id.strip_prefix(prefix))
        .filter_map(|suffix| suffix.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    format!("{prefix}{:03}", max + 1)
}

/// Read the taken values of `column` under `prefix` and compute the next one.
pub async fn next_id<E, C>(db: &C, column: E::Column, prefix: &str) -> Result<String, ServiceError>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let existing: Vec<String> = E::find()
        .select_only()
        .column(column)
        .filter(column.like(format!("{prefix}%")))
        .into_tuple()
        .all(db)
        .await
        .map_err(ServiceError::from_db)?;
    Ok(next_sequence(prefix, &existing))
}

/// Shortcut for the `<kind>_<yyyyMMdd>_NNN` family using today's date.
pub async fn next_internal_id<E, C>(db: &C, column: E::Column, kind: IdKind) -> Result<String, ServiceError>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let p = prefix(kind, chrono::Local::now().date_naive());
    next_id::<E, C>(db, column, &p).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate { NaiveDate::from_ymd_opt(2024, 3, 15).unwrap() }

    #[test]
    fn prefixes() {
        assert_eq!(prefix(IdKind::Payer, day()), "payer_20240315_");
        assert_eq!(prefix(IdKind::Account, day()), "acc_20240315_");
        assert_eq!(prefix(IdKind::Customer, day()), "cus_20240315_");
        assert_eq!(prefix(IdKind::Email, day()), "email_20240315_");
        assert_eq!(payment_reference_prefix(day()), "PR-20240315-");
        assert_eq!(invoice_number_prefix(day()), "INV-202403-");
    }

    #[test]
    fn first_id_of_the_day() {
        assert_eq!(next_sequence("cus_20240315_", &[]), "cus_20240315_001");
    }

    #[test]
    fn grows_past_three_digits() {
        let taken = vec!["acc_20240315_999".to_string()];
        assert_eq!(next_sequence("acc_20240315_", &taken), "acc_20240315_1000");
        let taken = vec!["acc_20240315_999".to_string(), "acc_20240315_1000".to_string()];
        assert_eq!(next_sequence("acc_20240315_", &taken), "acc_20240315_1001");
    }

    #[test]
    fn non_numeric_suffix_restarts() {
        let taken = vec!["acc_20240315_abc".to_string()];
        assert_eq!(next_sequence("acc_20240315_", &taken), "acc_20240315_001");
    }

    #[test]
    fn other_prefixes_are_ignored() {
        let taken = vec!["acc_20240314_050".to_string(), "acc_20240315_002".to_string()];
        assert_eq!(next_sequence("acc_20240315_", &taken), "acc_20240315_003");
    }
}
