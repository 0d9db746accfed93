//! Dashboard aggregate types

use estate_core::{
    AgentId, DealId, PropertyStatus, PropertyType, ShowingStatus, Timestamp,
};
use serde::{Deserialize, Serialize};

use crate::pagination::{ceil_div, parse_positive};

pub const DEFAULT_RECENT_ACTIVITY_LIMIT: i64 = 20;
/// Number of feeds merged into the recent-activity list.
const ACTIVITY_SOURCES: i64 = 3;

// ============================================================================
// OVERVIEW
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PropertyCounts {
    pub total: i64,
    /// Listings with status `available`.
    pub active: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ClientCounts {
    pub total: i64,
    pub active: i64,
    pub leads: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DealCounts {
    pub total: i64,
    /// Deals not yet closed either way.
    pub active: i64,
    pub total_commission: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ShowingCounts {
    pub total: i64,
    pub upcoming: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TaskCounts {
    pub total: i64,
    pub pending: i64,
    pub overdue: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DashboardOverview {
    pub properties: PropertyCounts,
    pub clients: ClientCounts,
    pub deals: DealCounts,
    pub showings: ShowingCounts,
    pub tasks: TaskCounts,
}

// ============================================================================
// AGENT PERFORMANCE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AgentPerformance {
    pub id: AgentId,
    pub first_name: String,
    pub last_name: String,
    pub photo_url: Option<String>,
    pub closed_deals: i64,
    pub total_commission: f64,
    pub avg_deal_value: f64,
    pub active_clients: i64,
    pub active_listings: i64,
}

// ============================================================================
// RECENT ACTIVITY
// ============================================================================

/// One entry of the merged activity feed, tagged by its source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivityFeedItem {
    DealActivity {
        activity_type: String,
        description: Option<String>,
        #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
        date: Timestamp,
        deal_id: Option<DealId>,
        user_email: Option<String>,
    },
    Communication {
        activity_type: String,
        description: Option<String>,
        #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
        date: Timestamp,
        client_name: Option<String>,
    },
    Showing {
        activity_type: String,
        description: Option<String>,
        #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
        date: Timestamp,
        status: ShowingStatus,
    },
}

impl ActivityFeedItem {
    pub fn date(&self) -> Timestamp {
        match self {
            ActivityFeedItem::DealActivity { date, .. }
            | ActivityFeedItem::Communication { date, .. }
            | ActivityFeedItem::Showing { date, .. } => *date,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct RecentActivityQuery {
    pub limit: Option<String>,
}

impl RecentActivityQuery {
    pub fn limit(&self) -> i64 {
        parse_positive(self.limit.as_deref(), DEFAULT_RECENT_ACTIVITY_LIMIT)
    }

    /// Rows fetched from each source: `ceil(limit / 3)`.
    pub fn per_source(&self) -> i64 {
        let limit = self.limit();
        ceil_div(limit, ACTIVITY_SOURCES)
    }
}

/// Newest first across all sources, cut to `limit`.
pub fn merge_activity_feed(
    sources: impl IntoIterator<Item = Vec<ActivityFeedItem>>,
    limit: i64,
) -> Vec<ActivityFeedItem> {
    let mut items: Vec<ActivityFeedItem> = sources.into_iter().flatten().collect();
    items.sort_by(|a, b| b.date().cmp(&a.date()));
    items.truncate(usize::try_from(limit).unwrap_or(0));
    items
}

// ============================================================================
// PROPERTY & SALES STATISTICS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StatusCount {
    pub status: PropertyStatus,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TypeCount {
    pub property_type: PropertyType,
    pub count: i64,
    pub avg_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CityCount {
    pub city: String,
    pub count: i64,
}

/// Price spread over `available` listings. All null when there are none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PriceStats {
    pub avg_price: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub avg_days_on_market: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PropertyStats {
    pub by_status: Vec<StatusCount>,
    pub by_type: Vec<TypeCount>,
    pub by_city: Vec<CityCount>,
    pub price_stats: PriceStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SalesBucket {
    /// Day, ISO week or month label depending on the period.
    pub period: String,
    pub deals_closed: i64,
    pub total_value: f64,
    pub total_commission: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn at(hours: i64) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).single().unwrap_or_default() + Duration::hours(hours)
    }

    fn note(hours: i64) -> ActivityFeedItem {
        ActivityFeedItem::DealActivity {
            activity_type: "note".into(),
            description: None,
            date: at(hours),
            deal_id: Some(1),
            user_email: None,
        }
    }

    fn call(hours: i64) -> ActivityFeedItem {
        ActivityFeedItem::Communication {
            activity_type: "call".into(),
            description: Some("Intro call".into()),
            date: at(hours),
            client_name: Some("Mina Okafor".into()),
        }
    }

    #[test]
    fn test_per_source_rounds_up() {
        assert_eq!(RecentActivityQuery::default().per_source(), 7);
        assert_eq!(RecentActivityQuery { limit: Some("3".into()) }.per_source(), 1);
        assert_eq!(RecentActivityQuery { limit: Some("10".into()) }.per_source(), 4);
    }

    #[test]
    fn test_per_source_with_huge_limit_stays_positive() {
        let query = RecentActivityQuery {
            limit: Some(i64::MAX.to_string()),
        };
        assert_eq!(query.limit(), i64::MAX);
        assert_eq!(query.per_source(), i64::MAX / 3 + 1);
        assert!(query.per_source() > 0);
    }

    #[test]
    fn test_feed_is_newest_first_and_truncated() {
        let merged = merge_activity_feed(vec![vec![note(1), note(5)], vec![call(3), call(9)]], 3);
        let dates: Vec<_> = merged.iter().map(ActivityFeedItem::date).collect();
        assert_eq!(dates, vec![at(9), at(5), at(3)]);
    }

    #[test]
    fn test_feed_item_tagging() -> Result<(), serde_json::Error> {
        let item: ActivityFeedItem = serde_json::from_value(serde_json::json!({
            "type": "showing", "activity_type": "open_house",
            "description": "12 Elm St", "date": "2024-05-01T10:00:00+00:00",
            "status": "scheduled"
        }))?;
        assert!(matches!(item, ActivityFeedItem::Showing { status: ShowingStatus::Scheduled, .. }));
        assert_eq!(serde_json::to_value(&call(0))?["type"], "communication");
        Ok(())
    }
}
