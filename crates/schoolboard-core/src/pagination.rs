//! Page-based pagination.
//!
//! List endpoints accept `page` (1-indexed, default 1) and `limit`
//! (default 10, clamped to `[1, 100]`). Values that fail to parse are
//! ignored and the defaults apply.
//!
//! Responses carry a [`PaginationMeta`]:
//!
//! ```json
//! {
//!   "page": 2,
//!   "limit": 10,
//!   "total": 42,
//!   "totalPages": 5,
//!   "hasNext": true,
//!   "hasPrev": true
//! }
//! ```

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::query::lenient_option;

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;
/// Highest page honoured; larger values land on this page.
pub const MAX_PAGE: i64 = i64::MAX / MAX_LIMIT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: i64,
    pub limit: i64,
    /// Total number of matching items across all pages
    pub total: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let limit = limit.max(1);
        let page = page.max(1);
        let skip = (page - 1).saturating_mul(limit);
        let total_pages = if total <= 0 {
            0
        } else {
            total.saturating_add(limit - 1) / limit
        };

        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: skip.saturating_add(limit) < total,
            has_prev: page > 1,
        }
    }
}

/// Query parameters for pagination.
///
/// # Example
///
/// ```ignore
/// // GET /api/v1/communications?limit=20&page=3
/// let params = PaginationParams { limit: Some(20), page: Some(3) };
///
/// assert_eq!(params.limit(), 20);
/// assert_eq!(params.offset(), 40);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Page number (1-indexed, default: 1)
    #[serde(default, deserialize_with = "lenient_option")]
    pub page: Option<i64>,
    /// Items per page (1-100, default: 10)
    #[serde(default, deserialize_with = "lenient_option")]
    pub limit: Option<i64>,
}

impl PaginationParams {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self { page, limit }
    }

    #[must_use]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).clamp(1, MAX_PAGE)
    }

    /// Returns the effective limit, clamped to [1, 100].
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit_capped(MAX_LIMIT)
    }

    /// Like [`limit`](Self::limit) with a tighter upper bound.
    #[must_use]
    pub fn limit_capped(&self, max: i64) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, max.max(1))
    }

    /// Rows to skip: `(page - 1) * limit`.
    #[must_use]
    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }

    pub fn meta(&self, total: i64) -> PaginationMeta {
        PaginationMeta::new(self.page(), self.limit(), total)
    }
}
