//! EstateHub Test Utilities
//!
//! Shared test infrastructure for the EstateHub workspace:
//! - Proptest generators for the domain enums and request inputs
//! - JSON fixtures for the create endpoints
//! - Assertions over the `{ success, message, data }` response envelope

pub use estate_core::{
    ClientType, DealStage, DealType, ListingType, PropertyStatus, PropertyType, StageTransition,
    StatsPeriod, TaskPriority, UserRole,
};

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    use super::*;
    use proptest::prelude::*;

    /// Pick any variant from a `db_enum!` `ALL` table.
    fn arb_variant<T: Copy + std::fmt::Debug + 'static>(all: &'static [T]) -> impl Strategy<Value = T> {
        proptest::sample::select(all)
    }

    pub fn arb_user_role() -> impl Strategy<Value = UserRole> {
        arb_variant(UserRole::ALL)
    }

    pub fn arb_deal_stage() -> impl Strategy<Value = DealStage> {
        arb_variant(DealStage::ALL)
    }

    pub fn arb_deal_type() -> impl Strategy<Value = DealType> {
        arb_variant(DealType::ALL)
    }

    pub fn arb_property_type() -> impl Strategy<Value = PropertyType> {
        arb_variant(PropertyType::ALL)
    }

    pub fn arb_listing_type() -> impl Strategy<Value = ListingType> {
        arb_variant(ListingType::ALL)
    }

    pub fn arb_client_type() -> impl Strategy<Value = ClientType> {
        arb_variant(ClientType::ALL)
    }

    pub fn arb_task_priority() -> impl Strategy<Value = TaskPriority> {
        arb_variant(TaskPriority::ALL)
    }

    pub fn arb_stats_period() -> impl Strategy<Value = StatsPeriod> {
        arb_variant(StatsPeriod::ALL)
    }

    /// Lower-case strings that are never a stored enum value.
    pub fn arb_unknown_enum_value() -> impl Strategy<Value = String> {
        "[a-z]{3,12}".prop_filter("must not collide with a known value", |s| {
            !is_known_enum_value(s)
        })
    }

    fn is_known_enum_value(s: &str) -> bool {
        UserRole::from_db_str(s).is_ok()
            || DealStage::from_db_str(s).is_ok()
            || DealType::from_db_str(s).is_ok()
            || PropertyType::from_db_str(s).is_ok()
            || ListingType::from_db_str(s).is_ok()
            || PropertyStatus::from_db_str(s).is_ok()
            || ClientType::from_db_str(s).is_ok()
            || TaskPriority::from_db_str(s).is_ok()
            || StatsPeriod::from_db_str(s).is_ok()
    }

    pub fn arb_email() -> impl Strategy<Value = String> {
        "[a-z]{3,10}@[a-z]{3,8}\\.(com|org|net)"
    }

    /// Eight or more characters with upper, lower and digit.
    pub fn arb_strong_password() -> impl Strategy<Value = String> {
        "[A-Z][a-z]{5,10}[0-9]{2,4}"
    }

    /// Passwords failing at least one strength rule.
    pub fn arb_weak_password() -> impl Strategy<Value = String> {
        prop_oneof![
            // too short
            "[A-Za-z0-9]{0,7}",
            // no digit
            "[A-Z][a-z]{8,12}",
            // no uppercase
            "[a-z]{6,10}[0-9]{2}",
            // no lowercase
            "[A-Z]{6,10}[0-9]{2}",
        ]
    }

    /// Raw `page` / `limit` query values, including ones the parser must reject.
    pub fn arb_query_number() -> impl Strategy<Value = Option<String>> {
        prop_oneof![
            Just(None),
            (1i64..500).prop_map(|n| Some(n.to_string())),
            (-500i64..=0).prop_map(|n| Some(n.to_string())),
            "[a-z]{1,6}".prop_map(Some),
            Just(Some(String::new())),
        ]
    }

    pub fn arb_lead_score() -> impl Strategy<Value = i32> {
        0i32..=100
    }

    pub fn arb_out_of_range_lead_score() -> impl Strategy<Value = i32> {
        prop_oneof![-1000i32..0, 101i32..1000]
    }

    /// A planned transition between any two stages.
    pub fn arb_stage_transition() -> impl Strategy<Value = StageTransition> {
        (
            arb_deal_stage(),
            arb_deal_stage(),
            arb_deal_type(),
            proptest::option::of(1i64..10_000),
            proptest::option::of("[a-z ]{0,20}"),
        )
            .prop_map(|(previous, next, deal_type, property_id, notes)| {
                StageTransition::plan(previous, next, deal_type, property_id, notes.as_deref())
            })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    use super::*;
    use chrono::Utc;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Signing secret long enough to pass production validation.
    pub const TEST_JWT_SECRET: &str = "estatehub_test_secret_at_least_32_characters";

    /// Satisfies the password strength rules.
    pub const TEST_PASSWORD: &str = "Password123";

    static SEQUENCE: AtomicU64 = AtomicU64::new(0);

    /// An email that will not collide with rows left by earlier test runs.
    pub fn unique_email(prefix: &str) -> String {
        let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        format!(
            "{}-{}-{}@estatehub.test",
            prefix,
            Utc::now().timestamp_micros(),
            seq
        )
    }

    pub fn register_body(email: &str, password: &str, role: Option<UserRole>) -> Value {
        let mut body = json!({
            "email": email,
            "password": password,
            "first_name": "Test",
            "last_name": "User",
        });
        if let Some(role) = role {
            body["role"] = json!(role.as_db_str());
        }
        body
    }

    pub fn login_body(email: &str, password: &str) -> Value {
        json!({ "email": email, "password": password })
    }

    pub fn property_body(agent_id: Option<i64>) -> Value {
        json!({
            "address": "742 Evergreen Terrace",
            "city": "Springfield",
            "state": "IL",
            "zip_code": "62704",
            "property_type": PropertyType::Residential.as_db_str(),
            "listing_type": ListingType::Sale.as_db_str(),
            "price": 325000,
            "bedrooms": 4,
            "bathrooms": 2.5,
            "listing_date": Utc::now().date_naive().to_string(),
            "agent_id": agent_id,
        })
    }

    pub fn client_body(client_type: ClientType) -> Value {
        json!({
            "first_name": "Jordan",
            "last_name": "Rivera",
            "email": unique_email("client"),
            "phone": "555-123-4567",
            "client_type": client_type.as_db_str(),
            "lead_score": 40,
        })
    }

    pub fn deal_body(property_id: Option<i64>, client_id: i64, agent_id: i64, deal_type: DealType) -> Value {
        json!({
            "property_id": property_id,
            "client_id": client_id,
            "agent_id": agent_id,
            "deal_type": deal_type.as_db_str(),
            "offer_amount": 310000,
        })
    }

    pub fn stage_body(stage: DealStage, notes: Option<&str>) -> Value {
        json!({ "stage": stage.as_db_str(), "notes": notes })
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    use serde_json::Value;

    /// `success: true`, returning `data`.
    pub fn assert_success(body: &Value) -> &Value {
        assert_eq!(body["success"], Value::Bool(true), "expected success envelope: {}", body);
        &body["data"]
    }

    /// `success: false` with the exact message.
    pub fn assert_error_message(body: &Value, message: &str) {
        assert_eq!(body["success"], Value::Bool(false), "expected error envelope: {}", body);
        assert_eq!(body["message"], message, "unexpected error body: {}", body);
    }

    /// `success: false` whose message mentions `fragment`.
    pub fn assert_error_mentions(body: &Value, fragment: &str) {
        assert_eq!(body["success"], Value::Bool(false), "expected error envelope: {}", body);
        let message = body["message"].as_str().unwrap_or_default();
        assert!(
            message.contains(fragment),
            "message {:?} does not mention {:?}",
            message,
            fragment
        );
    }

    /// Pagination block consistent with the requested page and limit.
    pub fn assert_pagination(body: &Value, page: i64, limit: i64) {
        let meta = &body["pagination"];
        assert_eq!(meta["currentPage"], page, "pagination: {}", meta);
        assert_eq!(meta["itemsPerPage"], limit, "pagination: {}", meta);

        let total_items = meta["totalItems"].as_i64().unwrap_or(-1);
        let total_pages = meta["totalPages"].as_i64().unwrap_or(-1);
        assert!(total_items >= 0, "total_items missing: {}", meta);
        assert_eq!(total_pages, total_items / limit + i64::from(total_items % limit != 0), "pagination: {}", meta);
        assert_eq!(meta["hasNextPage"], page < total_pages, "pagination: {}", meta);
        assert_eq!(meta["hasPrevPage"], page > 1, "pagination: {}", meta);

        let rows = body["data"].as_array().map(Vec::len).unwrap_or(0) as i64;
        assert!(rows <= limit, "{} rows exceed limit {}", rows, limit);
    }
}
