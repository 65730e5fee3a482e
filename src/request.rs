//! Page Requests
//!
//! Caller-facing pagination parameters, as they arrive from a query string,
//! and their normalization into a [`Query`].

use serde::{Deserialize, Serialize};

use crate::constants::{PAGE_NUMBER_DEFAULT, PAGE_SIZE_DEFAULT};
use crate::query::{Query, SortOrder};

/// Pagination and ordering requested by a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRequest {
    /// Record id from the path, 0 when absent
    pub id: u64,
    /// 1-based page number
    pub page: i64,
    /// Rows per page; non-positive means "everything"
    pub limit: i64,
    /// Column to order by
    pub sort: String,
    /// `asc` or `desc`
    pub order: String,
}

impl PageRequest {
    /// Treat a non-positive limit as a request for every row on one page.
    pub fn apply_defaults(&mut self) {
        if self.limit <= 0 {
            self.limit = -1;
            self.page = 1;
        }
    }

    /// Fix up page, limit and order against `total` rows; returns the page count.
    pub fn normalize(&mut self, total: i64) -> i64 {
        // Precondition
        assert!(total >= 0, "total cannot be negative");

        let mut total_pages = 1;
        if self.limit < 0 {
            self.page = total_pages;
            self.limit = total;
            return total_pages;
        }

        if self.page <= 0 {
            self.page = PAGE_NUMBER_DEFAULT;
        }
        if self.limit == 0 {
            self.limit = PAGE_SIZE_DEFAULT;
        }
        if total > self.limit {
            total_pages = total / self.limit;
            if total % self.limit > 0 {
                total_pages += 1;
            }
        }
        if self.page > total_pages {
            self.page = total_pages;
        }
        self.order = SortOrder::parse_or_desc(&self.order).as_str().to_string();

        // Postcondition
        assert!(
            (1..=total_pages).contains(&self.page),
            "page must fall within the page count"
        );
        total_pages
    }

    /// The list query for this request.
    #[must_use]
    pub fn to_query(&self) -> Query {
        let mut query = Query::new().paginate(self.page, self.limit);
        if !self.sort.is_empty() {
            query = query.order_by(
                self.sort.clone(),
                SortOrder::parse_or_desc(&self.order).as_str(),
            );
        }
        query
    }
}
