//! Read-only aggregates behind the dashboard.
//!
//! Independent aggregates run concurrently, each on its own pooled
//! connection.

use estate_core::{AgentId, StatsPeriod};
use serde::de::DeserializeOwned;

use super::{query_json, query_json_one, DbClient, QueryBuilder};
use crate::error::ApiResult;
use crate::types::{
    merge_activity_feed, ActivityFeedItem, AgentPerformance, CityCount, ClientCounts,
    DashboardOverview, DealCounts, PriceStats, PropertyCounts, PropertyStats, SalesBucket,
    ShowingCounts, StatusCount, TaskCounts, TypeCount,
};

const TOP_AGENTS: i64 = 10;
const TOP_CITIES: i64 = 10;

/// `WHERE <column> = $1` scoping for the overview counters.
fn agent_scope(column: &str, agent_id: Option<AgentId>) -> QueryBuilder {
    let mut qb = QueryBuilder::new();
    qb.and_eq(column, agent_id);
    qb
}

fn closed_within(period: Option<StatsPeriod>) -> String {
    period
        .map(|p| format!(" AND d.actual_close_date >= CURRENT_DATE - INTERVAL '{}'", p.interval()))
        .unwrap_or_default()
}

impl DbClient {
    async fn dashboard_one<T: DeserializeOwned>(
        &self,
        select: &str,
        scope: &QueryBuilder,
    ) -> ApiResult<T> {
        let conn = self.get_conn().await?;
        let sql = format!("{}{}", select, scope.where_clause());
        query_json_one(&**conn, &sql, &scope.sql_params()).await
    }

    async fn dashboard_rows<T: DeserializeOwned>(
        &self,
        sql: &str,
        limit: Option<i64>,
    ) -> ApiResult<Vec<T>> {
        let conn = self.get_conn().await?;
        match limit {
            Some(limit) => query_json(&**conn, sql, &[&limit]).await,
            None => query_json(&**conn, sql, &[]).await,
        }
    }

    /// Headline counters, optionally limited to one agent's records.
    pub async fn dashboard_overview(
        &self,
        agent_id: Option<AgentId>,
    ) -> ApiResult<DashboardOverview> {
        let by_agent = agent_scope("agent_id", agent_id);
        let by_assigned_agent = agent_scope("assigned_agent_id", agent_id);
        let by_assignee = agent_scope("assigned_to", agent_id);

        let (properties, clients, deals, showings, tasks) = tokio::try_join!(
            self.dashboard_one::<PropertyCounts>(
                "SELECT COUNT(*) AS total,
                    COUNT(*) FILTER (WHERE status = 'available') AS active
                 FROM properties",
                &by_agent,
            ),
            self.dashboard_one::<ClientCounts>(
                "SELECT COUNT(*) AS total,
                    COUNT(*) FILTER (WHERE status = 'active') AS active,
                    COUNT(*) FILTER (WHERE status = 'lead') AS leads
                 FROM clients",
                &by_assigned_agent,
            ),
            self.dashboard_one::<DealCounts>(
                "SELECT COUNT(*) AS total,
                    COUNT(*) FILTER (WHERE stage NOT IN ('closed_won', 'closed_lost')) AS active,
                    COALESCE(SUM(commission_amount) FILTER (WHERE stage = 'closed_won'), 0)
                        AS total_commission
                 FROM deals",
                &by_agent,
            ),
            self.dashboard_one::<ShowingCounts>(
                "SELECT COUNT(*) AS total,
                    COUNT(*) FILTER (WHERE status = 'scheduled' AND scheduled_date >= NOW())
                        AS upcoming
                 FROM showings",
                &by_agent,
            ),
            self.dashboard_one::<TaskCounts>(
                "SELECT COUNT(*) AS total,
                    COUNT(*) FILTER (WHERE status = 'pending') AS pending,
                    COUNT(*) FILTER (WHERE status = 'pending' AND due_date < NOW()) AS overdue
                 FROM tasks",
                &by_assignee,
            ),
        )?;

        Ok(DashboardOverview {
            properties,
            clients,
            deals,
            showings,
            tasks,
        })
    }

    /// Top active agents by closed deals, then commission.
    pub async fn dashboard_agent_performance(
        &self,
        period: Option<StatsPeriod>,
    ) -> ApiResult<Vec<AgentPerformance>> {
        let won = format!("d.stage = 'closed_won'{}", closed_within(period));
        let sql = format!(
            "SELECT a.id, a.first_name, a.last_name, a.photo_url,
                COUNT(d.id) FILTER (WHERE {won}) AS closed_deals,
                COALESCE(SUM(d.commission_amount) FILTER (WHERE {won}), 0) AS total_commission,
                COALESCE(AVG(d.final_amount) FILTER (WHERE {won}), 0) AS avg_deal_value,
                (SELECT COUNT(*) FROM clients
                 WHERE assigned_agent_id = a.id AND status = 'active') AS active_clients,
                (SELECT COUNT(*) FROM properties
                 WHERE agent_id = a.id AND status = 'available') AS active_listings
             FROM agents a LEFT JOIN deals d ON a.id = d.agent_id
             WHERE a.status = 'active'
             GROUP BY a.id
             ORDER BY closed_deals DESC, total_commission DESC
             LIMIT $1",
            won = won
        );
        self.dashboard_rows(&sql, Some(TOP_AGENTS)).await
    }

    /// Latest deal activities, communications and showings merged into one
    /// feed of at most `limit` items.
    pub async fn dashboard_recent_activity(
        &self,
        limit: i64,
        per_source: i64,
    ) -> ApiResult<Vec<ActivityFeedItem>> {
        let (deal_activities, communications, showings) = tokio::try_join!(
            self.dashboard_rows::<ActivityFeedItem>(
                "SELECT 'deal_activity' AS type, da.activity_type, da.description,
                    da.activity_date AS date, da.deal_id, u.email AS user_email
                 FROM deal_activities da
                 LEFT JOIN users u ON da.performed_by = u.id
                 ORDER BY da.activity_date DESC
                 LIMIT $1",
                Some(per_source),
            ),
            self.dashboard_rows::<ActivityFeedItem>(
                "SELECT 'communication' AS type, cm.communication_type AS activity_type,
                    cm.subject AS description, cm.communication_date AS date,
                    c.first_name || ' ' || c.last_name AS client_name
                 FROM communications cm
                 LEFT JOIN clients c ON cm.client_id = c.id
                 ORDER BY cm.communication_date DESC
                 LIMIT $1",
                Some(per_source),
            ),
            self.dashboard_rows::<ActivityFeedItem>(
                "SELECT 'showing' AS type, s.showing_type AS activity_type,
                    p.address AS description, s.scheduled_date AS date, s.status
                 FROM showings s
                 LEFT JOIN properties p ON s.property_id = p.id
                 ORDER BY s.created_at DESC
                 LIMIT $1",
                Some(per_source),
            ),
        )?;

        Ok(merge_activity_feed(
            [deal_activities, communications, showings],
            limit,
        ))
    }

    /// Inventory breakdowns plus price statistics over available listings.
    pub async fn dashboard_property_stats(&self) -> ApiResult<PropertyStats> {
        let no_scope = QueryBuilder::new();
        let (by_status, by_type, by_city, price_stats) = tokio::try_join!(
            self.dashboard_rows::<StatusCount>(
                "SELECT status, COUNT(*) AS count FROM properties GROUP BY status ORDER BY status",
                None,
            ),
            self.dashboard_rows::<TypeCount>(
                "SELECT property_type, COUNT(*) AS count, AVG(price) AS avg_price
                 FROM properties GROUP BY property_type ORDER BY property_type",
                None,
            ),
            self.dashboard_rows::<CityCount>(
                "SELECT city, COUNT(*) AS count FROM properties
                 GROUP BY city ORDER BY count DESC, city
                 LIMIT $1",
                Some(TOP_CITIES),
            ),
            self.dashboard_one::<PriceStats>(
                "SELECT AVG(price) AS avg_price, MIN(price) AS min_price,
                    MAX(price) AS max_price, AVG(days_on_market) AS avg_days_on_market
                 FROM properties WHERE status = 'available'",
                &no_scope,
            ),
        )?;

        Ok(PropertyStats {
            by_status,
            by_type,
            by_city,
            price_stats,
        })
    }

    /// Closed-won deals inside the period, bucketed per the period's granularity.
    pub async fn dashboard_sales_stats(&self, period: StatsPeriod) -> ApiResult<Vec<SalesBucket>> {
        let bucket = format!("TO_CHAR(actual_close_date, '{}')", period.bucket_format());
        let sql = format!(
            "SELECT {bucket} AS period,
                COUNT(*) AS deals_closed,
                COALESCE(SUM(final_amount), 0) AS total_value,
                COALESCE(SUM(commission_amount), 0) AS total_commission
             FROM deals
             WHERE stage = 'closed_won'
               AND actual_close_date >= CURRENT_DATE - INTERVAL '{interval}'
             GROUP BY {bucket}
             ORDER BY period",
            bucket = bucket,
            interval = period.interval()
        );
        self.dashboard_rows(&sql, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overview_scope_binds_agent() {
        let scope = agent_scope("assigned_to", Some(4));
        assert_eq!(scope.where_clause(), " WHERE assigned_to = $1::bigint");
        assert!(agent_scope("agent_id", None).is_empty());
    }

    #[test]
    fn test_closed_within_period() {
        assert_eq!(closed_within(None), "");
        assert_eq!(
            closed_within(Some(StatsPeriod::Quarter)),
            " AND d.actual_close_date >= CURRENT_DATE - INTERVAL '3 months'"
        );
    }
}
