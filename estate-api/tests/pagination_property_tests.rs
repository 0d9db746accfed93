//! Property-Based Tests for List Pagination
//!
//! For any raw `page` / `limit` query values, the parsed window is positive,
//! and the `pagination` block of a list response agrees with the window and
//! the total row count.

use estate_api::pagination::{PageQuery, Pagination, DEFAULT_LIMIT, DEFAULT_PAGE};
use estate_api::response::Paginated;
use estate_test_utils::{assertions::assert_pagination, generators::arb_query_number};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_window_is_always_positive(page in arb_query_number(), limit in arb_query_number()) {
        let window = Pagination::from_query(page.as_deref(), limit.as_deref());
        prop_assert!(window.page() >= 1);
        prop_assert!(window.limit() >= 1);
        prop_assert!(window.offset() >= 0);
    }

    #[test]
    fn prop_positive_values_are_honored(page in 1i64..10_000, limit in 1i64..500) {
        let query = PageQuery {
            page: Some(page.to_string()),
            limit: Some(format!(" {} ", limit)),
        };
        let window = query.pagination();
        prop_assert_eq!(window.page(), page);
        prop_assert_eq!(window.limit(), limit);
        prop_assert_eq!(window.offset(), (page - 1) * limit);
    }

    #[test]
    fn prop_rejected_values_fall_back(raw in prop_oneof!["[a-z]{1,5}", "-[0-9]{1,4}", Just("0".to_string())]) {
        let window = Pagination::from_query(Some(&raw), Some(&raw));
        prop_assert_eq!(window.page(), DEFAULT_PAGE);
        prop_assert_eq!(window.limit(), DEFAULT_LIMIT);
    }

    #[test]
    fn prop_page_count_never_overflows(limit in (i64::MAX - 1_000)..=i64::MAX, total in 0i64..=i64::MAX) {
        let meta = Pagination::from_query(None, Some(&limit.to_string())).meta(total);
        prop_assert_eq!(meta.items_per_page, limit);
        prop_assert!(meta.total_pages <= 2);
        prop_assert_eq!(meta.total_pages == 0, total == 0);
        prop_assert_eq!(meta.has_next_page, meta.total_pages > 1);
    }

    #[test]
    fn prop_envelope_matches_window(page in 1i64..20, limit in 1i64..50, total in 0i64..1_000) {
        let window = Pagination::new(page, limit);
        let rows = (total - window.offset()).clamp(0, limit) as usize;
        let envelope = Paginated::new(vec![0u8; rows], &window, total);

        let body = serde_json::to_value(&envelope).map_err(|e| TestCaseError::fail(e.to_string()))?;
        assert_pagination(&body, page, limit);
        prop_assert_eq!(envelope.pagination.total_items, total);
    }
}

#[test]
fn empty_envelope_has_no_pages() {
    let envelope: Paginated<u8> = Paginated::empty(&Pagination::default());
    assert!(envelope.data.is_empty());
    assert_eq!(envelope.pagination.total_pages, 0);
    assert!(!envelope.pagination.has_next_page);
    assert!(!envelope.pagination.has_prev_page);
}
