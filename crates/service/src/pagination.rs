//! Pagination and sorting utilities for service layer
//!
//! Provides a simple `Pagination` struct and helpers to normalize inputs.

use common::types::Page;
use sea_orm::Order;

/// Pagination parameters
#[derive(Clone, Copy, Debug)]
pub struct Pagination {
    /// 1-based page index
    pub page: u32,
    /// items per page
    pub per_page: u32,
}

impl Pagination {
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        let d = Self::default();
        Self { page: page.unwrap_or(d.page), per_page: per_page.unwrap_or(d.per_page) }
    }

    /// Clamp to sane defaults and convert to `u64`
    pub fn normalize(self) -> (u64, u64) {
        let page = if self.page == 0 { 1 } else { self.page };
        let per_page = self.per_page.clamp(1, 100);
        ((page - 1) as u64, per_page as u64)
    }

    /// Wrap one fetched page.
    pub fn page_of<T>(self, total: u64, list: Vec<T>) -> Page<T> {
        let (idx, per) = self.normalize();
        Page { total, page: idx + 1, page_size: per, list }
    }

    /// Page over an already materialized list.
    pub fn slice<T>(self, items: Vec<T>) -> Page<T> {
        let (idx, per) = self.normalize();
        let total = items.len() as u64;
        let list = items.into_iter().skip((idx * per) as usize).take(per as usize).collect();
        Page { total, page: idx + 1, page_size: per, list }
    }

    /// Zero-based offset of the first row on this page.
    pub fn offset(self) -> u64 {
        let (idx, per) = self.normalize();
        idx * per
    }
}

impl Default for Pagination {
    fn default() -> Self { Self { page: 1, per_page: 20 } }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// `asc`/`desc`, case-insensitive; anything else yields `default`.
    pub fn parse(raw: Option<&str>, default: SortOrder) -> SortOrder {
        match raw.map(|s| s.trim().to_ascii_lowercase()) {
            Some(s) if s == "asc" => SortOrder::Asc,
            Some(s) if s == "desc" => SortOrder::Desc,
            _ => default,
        }
    }

    pub fn order(self) -> Order {
        match self {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_clamps_zero_to_defaults() {
        let (idx, per) = Pagination { page: 0, per_page: 0 }.normalize();
        assert_eq!(idx, 0);
        assert_eq!(per, 1);
    }

    #[test]
    fn normalize_clamps_upper_bound() {
        let (idx, per) = Pagination { page: 5, per_page: 1000 }.normalize();
        assert_eq!(idx, 4);
        assert_eq!(per, 100);
    }

    #[test]
    fn default_values_are_sane() {
        let d = Pagination::new(None, None);
        assert_eq!(d.page, 1);
        assert_eq!(d.per_page, 20);
    }

    #[test]
    fn slice_pages_in_memory() {
        let p = Pagination { page: 2, per_page: 2 }.slice(vec![1, 2, 3, 4, 5]);
        assert_eq!(p.total, 5);
        assert_eq!(p.page, 2);
        assert_eq!(p.list, vec![3, 4]);
        let last = Pagination { page: 9, per_page: 2 }.slice(vec![1, 2, 3]);
        assert!(last.list.is_empty());
    }

    #[test]
    fn sort_order_parse() {
        assert_eq!(SortOrder::parse(Some("ASC"), SortOrder::Desc), SortOrder::Asc);
        assert_eq!(SortOrder::parse(Some("sideways"), SortOrder::Desc), SortOrder::Desc);
        assert_eq!(SortOrder::parse(None, SortOrder::Asc), SortOrder::Asc);
    }
}
