//! Small SeaQuery builders shared by list endpoints.

use sea_orm::sea_query::{Expr, Func, IntoColumnRef, LikeExpr, SimpleExpr};

const LIKE_ESCAPE: char = '\\';

/// Escape LIKE wildcards so the term matches literally.
///
/// ```
/// assert_eq!(service::query::escape_like(r"50%_a\b"), r"50\%\_a\\b");
/// ```
pub fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if c == '%' || c == '_' || c == LIKE_ESCAPE {
            out.push(LIKE_ESCAPE);
        }
        out.push(c);
    }
    out
}

/// `lower(col) LIKE '%term%'` with the term lower-cased and matched literally.
pub fn contains_ci<T: IntoColumnRef>(col: T, term: &str) -> SimpleExpr {
    let pattern = format!("%{}%", escape_like(&term.trim().to_lowercase()));
    Expr::expr(Func::lower(Expr::col(col))).like(LikeExpr::new(pattern).escape(LIKE_ESCAPE))
}

/// `lower(col) = lower(value)`
pub fn eq_ci<T: IntoColumnRef>(col: T, value: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(col))).eq(value.trim().to_lowercase())
}

/// Membership test on a `text[]` column, e.g. `array_contains("\"account\".\"labels\"", "vip")`.
pub fn array_contains(column_sql: &str, value: &str) -> SimpleExpr {
    Expr::cust_with_values(format!("? = ANY({column_sql})"), [value.trim().to_string()])
}

/// Trimmed non-empty query parameter.
pub fn filled(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::sea_query::{Alias, PostgresQueryBuilder, Query, QueryStatementWriter};

    #[test]
    fn wildcards_are_escaped() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn contains_declares_escape_char() {
        let sql = Query::select()
            .column(Alias::new("name"))
            .from(Alias::new("t"))
            .and_where(contains_ci(Alias::new("name"), " 50%_OFF "))
            .to_string(PostgresQueryBuilder);
        assert!(sql.contains("ESCAPE"), "{sql}");
        assert!(sql.contains("50"), "{sql}");
        assert!(!sql.contains("'%50%_off%'"), "{sql}");
    }
}
