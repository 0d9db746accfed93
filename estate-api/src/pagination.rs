//! Page/limit parsing and the pagination block of list responses.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;

/// Requested page window. Always `page >= 1` and `limit >= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: i64,
    limit: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    /// Non-positive values fall back to the defaults.
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: if page > 0 { page } else { DEFAULT_PAGE },
            limit: if limit > 0 { limit } else { DEFAULT_LIMIT },
        }
    }

    /// Lenient parse of raw `page` / `limit` query values.
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        Self::new(parse_positive(page, DEFAULT_PAGE), parse_positive(limit, DEFAULT_LIMIT))
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn meta(&self, total_items: i64) -> PaginationMeta {
        PaginationMeta::new(self.page, self.limit, total_items)
    }
}

/// Parse a positive integer, falling back to `default` for anything else.
pub fn parse_positive(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

/// `ceil(n / d)` for `n >= 0`, `d > 0`, without overflow near `i64::MAX`.
pub fn ceil_div(n: i64, d: i64) -> i64 {
    n / d + i64::from(n % d != 0)
}

/// Bare `?page=&limit=` for list endpoints without filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::from_query(self.page.as_deref(), self.limit.as_deref())
    }
}

/// `pagination` object of a paginated envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
    pub items_per_page: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl PaginationMeta {
    pub fn new(page: i64, limit: i64, total_items: i64) -> Self {
        let total_items = total_items.max(0);
        let total_pages = if limit > 0 {
            ceil_div(total_items, limit)
        } else {
            0
        };

        Self {
            current_page: page,
            total_pages,
            total_items,
            items_per_page: limit,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = Pagination::from_query(None, None);
        assert_eq!((p.page(), p.limit(), p.offset()), (1, 10, 0));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let p = Pagination::from_query(Some("abc"), Some("-5"));
        assert_eq!((p.page(), p.limit()), (1, 10));

        let p = Pagination::from_query(Some("0"), Some("0"));
        assert_eq!((p.page(), p.limit()), (1, 10));

        let p = Pagination::from_query(Some("3"), Some("25"));
        assert_eq!((p.page(), p.limit(), p.offset()), (3, 25, 50));
    }

    #[test]
    fn test_second_page_of_ten() {
        let meta = Pagination::new(2, 10).meta(25);
        assert_eq!(
            meta,
            PaginationMeta {
                current_page: 2,
                total_pages: 3,
                total_items: 25,
                items_per_page: 10,
                has_next_page: true,
                has_prev_page: true,
            }
        );
    }

    #[test]
    fn test_huge_limit_is_one_page() {
        let p = Pagination::from_query(None, Some("9223372036854775807"));
        assert_eq!(p.limit(), i64::MAX);
        let meta = p.meta(5);
        assert_eq!(meta.total_pages, 1);
        assert_eq!(meta.total_items, 5);
        assert!(!meta.has_next_page);

        let meta = Pagination::new(i64::MAX, i64::MAX).meta(i64::MAX);
        assert_eq!(meta.total_pages, 1);
        assert!(!meta.has_next_page);
        assert!(meta.has_prev_page);
    }

    #[test]
    fn test_ceil_div() {
        assert_eq!(ceil_div(0, 10), 0);
        assert_eq!(ceil_div(10, 10), 1);
        assert_eq!(ceil_div(11, 10), 2);
        assert_eq!(ceil_div(i64::MAX, 3), i64::MAX / 3 + 1);
        assert_eq!(ceil_div(i64::MAX, 1), i64::MAX);
    }

    #[test]
    fn test_empty_result() {
        let meta = Pagination::default().meta(0);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next_page);
        assert!(!meta.has_prev_page);
    }

    #[test]
    fn test_meta_serializes_camel_case() -> Result<(), serde_json::Error> {
        let json = serde_json::to_value(Pagination::new(1, 10).meta(11))?;
        assert_eq!(json["currentPage"], 1);
        assert_eq!(json["totalPages"], 2);
        assert_eq!(json["itemsPerPage"], 10);
        assert_eq!(json["hasNextPage"], true);
        assert_eq!(json["hasPrevPage"], false);
        Ok(())
    }
}
