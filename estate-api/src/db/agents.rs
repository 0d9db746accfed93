//! `agents` table.

use estate_core::{AgentId, AgentStatus, StatsPeriod, UserId};

use super::{
    delete_by_id, exists, query_json, query_json_one, query_json_opt, query_page, DbClient,
    QueryBuilder,
};
use crate::error::{ApiError, ApiResult};
use crate::pagination::Pagination;
use crate::response::Paginated;
use crate::types::{
    AgentClientStats, AgentDealStats, AgentDetail, AgentFilter, AgentListItem, AgentListingStats,
    AgentName, AgentRecentDeal, AgentRow, AgentShowingStats, AgentStats, AgentSummary,
    CreateAgentRequest, UpdateAgentRequest,
};
use crate::validation::{self, non_blank};

const RECENT_DEALS: i64 = 5;

const AGENT_COUNTS: &str = "
    (SELECT COUNT(*) FROM properties WHERE agent_id = a.id) AS property_count,
    (SELECT COUNT(*) FROM clients WHERE assigned_agent_id = a.id) AS client_count,
    (SELECT COUNT(*) FROM deals WHERE agent_id = a.id AND stage = 'closed_won') AS closed_deals";

impl DbClient {
    pub async fn agent_by_user(&self, user_id: UserId) -> ApiResult<Option<AgentRow>> {
        let conn = self.get_conn().await?;
        query_json_opt(
            &**conn,
            "SELECT * FROM agents WHERE user_id = $1",
            &[&user_id],
        )
        .await
    }

    pub async fn agent_summary_by_user(&self, user_id: UserId) -> ApiResult<Option<AgentSummary>> {
        let conn = self.get_conn().await?;
        query_json_opt(
            &**conn,
            "SELECT id, first_name, last_name, photo_url FROM agents WHERE user_id = $1",
            &[&user_id],
        )
        .await
    }

    pub async fn agent_exists(&self, id: AgentId) -> ApiResult<bool> {
        let conn = self.get_conn().await?;
        exists(&**conn, "agents", id).await
    }

    pub async fn agent_list(
        &self,
        filter: &AgentFilter,
        page: &Pagination,
    ) -> ApiResult<Paginated<AgentListItem>> {
        let mut qb = QueryBuilder::new();
        qb.and_eq("a.status", non_blank(filter.status.as_deref()));
        if let Some(territory) = non_blank(filter.territory.as_deref()) {
            qb.and_where("a.territory ILIKE {}", format!("%{}%", territory));
        }
        qb.and_search(
            &["a.first_name", "a.last_name", "u.email", "a.license_number"],
            filter.search.as_deref(),
        );

        let conn = self.get_conn().await?;
        query_page(
            &**conn,
            &qb,
            &format!("a.*, u.email, {}", AGENT_COUNTS),
            "agents a LEFT JOIN users u ON a.user_id = u.id",
            "a.created_at DESC",
            page,
        )
        .await
    }

    /// Profile with login details, counters and the latest deals.
    pub async fn agent_detail(&self, id: AgentId) -> ApiResult<Option<AgentDetail>> {
        let conn = self.get_conn().await?;
        let detail: Option<AgentDetail> = query_json_opt(
            &**conn,
            &format!(
                "SELECT a.*, u.email, u.role, {},
                    (SELECT COUNT(*) FROM deals WHERE agent_id = a.id) AS total_deals,
                    (SELECT COALESCE(SUM(commission_amount), 0) FROM deals
                     WHERE agent_id = a.id AND stage = 'closed_won') AS total_commission
                 FROM agents a LEFT JOIN users u ON a.user_id = u.id
                 WHERE a.id = $1",
                AGENT_COUNTS
            ),
            &[&id],
        )
        .await?;

        let Some(mut detail) = detail else {
            return Ok(None);
        };

        let recent: Vec<AgentRecentDeal> = query_json(
            &**conn,
            "SELECT d.*, p.address, c.first_name AS client_first_name, c.last_name AS client_last_name
             FROM deals d
             LEFT JOIN properties p ON d.property_id = p.id
             LEFT JOIN clients c ON d.client_id = c.id
             WHERE d.agent_id = $1
             ORDER BY d.created_at DESC
             LIMIT $2",
            &[&id, &RECENT_DEALS],
        )
        .await?;
        detail.recent_deals = recent;
        Ok(Some(detail))
    }

    /// Deal, showing, client and listing aggregates. Deal and showing counts
    /// are limited to rows created within `period`.
    pub async fn agent_stats(
        &self,
        id: AgentId,
        period: Option<StatsPeriod>,
    ) -> ApiResult<Option<AgentStats>> {
        let conn = self.get_conn().await?;
        let agent: Option<AgentName> = query_json_opt(
            &**conn,
            "SELECT id, first_name, last_name FROM agents WHERE id = $1",
            &[&id],
        )
        .await?;
        let Some(agent) = agent else {
            return Ok(None);
        };

        let since = period
            .map(|p| format!(" AND created_at >= CURRENT_DATE - INTERVAL '{}'", p.interval()))
            .unwrap_or_default();

        let deals: AgentDealStats = query_json_one(
            &**conn,
            &format!(
                "SELECT
                    COUNT(*) AS total_deals,
                    COUNT(*) FILTER (WHERE stage = 'closed_won') AS won_deals,
                    COUNT(*) FILTER (WHERE stage = 'closed_lost') AS lost_deals,
                    COUNT(*) FILTER (WHERE stage NOT IN ('closed_won', 'closed_lost')) AS active_deals,
                    COALESCE(SUM(commission_amount) FILTER (WHERE stage = 'closed_won'), 0) AS total_commission,
                    COALESCE(AVG(final_amount) FILTER (WHERE stage = 'closed_won'), 0) AS avg_deal_value
                 FROM deals WHERE agent_id = $1{}",
                since
            ),
            &[&id],
        )
        .await?;

        let showings: AgentShowingStats = query_json_one(
            &**conn,
            &format!(
                "SELECT
                    COUNT(*) AS total_showings,
                    COUNT(*) FILTER (WHERE status = 'completed') AS completed_showings,
                    COUNT(*) FILTER (WHERE interest_level = 'high') AS high_interest_showings
                 FROM showings WHERE agent_id = $1{}",
                since
            ),
            &[&id],
        )
        .await?;

        let clients: AgentClientStats = query_json_one(
            &**conn,
            "SELECT
                COUNT(*) AS total_clients,
                COUNT(*) FILTER (WHERE status = 'active') AS active_clients,
                COALESCE(AVG(lead_score), 0) AS avg_lead_score
             FROM clients WHERE assigned_agent_id = $1",
            &[&id],
        )
        .await?;

        let properties: AgentListingStats = query_json_one(
            &**conn,
            "SELECT
                COUNT(*) AS total_listings,
                COUNT(*) FILTER (WHERE status = 'available') AS active_listings,
                COUNT(*) FILTER (WHERE status = 'sold') AS sold_listings
             FROM properties WHERE agent_id = $1",
            &[&id],
        )
        .await?;

        Ok(Some(AgentStats {
            agent,
            period: period
                .map(|p| p.as_db_str().to_string())
                .unwrap_or_else(|| "all_time".to_string()),
            deals,
            showings,
            clients,
            properties,
        }))
    }

    /// Insert a profile. A linked user must exist and must not have one yet.
    pub async fn agent_create(&self, req: &CreateAgentRequest) -> ApiResult<AgentRow> {
        let conn = self.get_conn().await?;

        if let Some(user_id) = req.user_id {
            if !exists(&**conn, "users", user_id).await? {
                return Err(ApiError::invalid_input("User not found"));
            }
            let linked = conn
                .query_opt("SELECT id FROM agents WHERE user_id = $1", &[&user_id])
                .await?;
            if linked.is_some() {
                return Err(ApiError::invalid_input(
                    "Agent profile already exists for this user",
                ));
            }
        }

        let status = validation::parse_enum::<AgentStatus>(req.status.as_deref())?
            .unwrap_or(AgentStatus::Active)
            .as_db_str();

        let agent: AgentRow = query_json_one(
            &**conn,
            "INSERT INTO agents (
                user_id, first_name, last_name, phone, license_number,
                commission_rate, territory, hire_date, status, photo_url, bio
             ) VALUES ($1, $2, $3, $4, $5, $6::float8, $7, $8, $9, $10, $11)
             RETURNING *",
            &[
                &req.user_id,
                &non_blank(req.first_name.as_deref()),
                &non_blank(req.last_name.as_deref()),
                &non_blank(req.phone.as_deref()),
                &non_blank(req.license_number.as_deref()),
                &req.commission_rate,
                &non_blank(req.territory.as_deref()),
                &req.hire_date,
                &status,
                &non_blank(req.photo_url.as_deref()),
                &non_blank(req.bio.as_deref()),
            ],
        )
        .await?;

        tracing::info!(agent_id = agent.id, "Agent created");
        Ok(agent)
    }

    /// COALESCE update. `None` when the agent does not exist.
    pub async fn agent_update(
        &self,
        id: AgentId,
        req: &UpdateAgentRequest,
    ) -> ApiResult<Option<AgentRow>> {
        let status = validation::parse_enum::<AgentStatus>(req.status.as_deref())?
            .map(|s| s.as_db_str());

        let conn = self.get_conn().await?;
        query_json_opt(
            &**conn,
            "UPDATE agents SET
                first_name = COALESCE($1, first_name),
                last_name = COALESCE($2, last_name),
                phone = COALESCE($3, phone),
                license_number = COALESCE($4, license_number),
                commission_rate = COALESCE($5::float8, commission_rate),
                territory = COALESCE($6, territory),
                hire_date = COALESCE($7, hire_date),
                status = COALESCE($8, status),
                photo_url = COALESCE($9, photo_url),
                bio = COALESCE($10, bio)
             WHERE id = $11
             RETURNING *",
            &[
                &non_blank(req.first_name.as_deref()),
                &non_blank(req.last_name.as_deref()),
                &non_blank(req.phone.as_deref()),
                &non_blank(req.license_number.as_deref()),
                &req.commission_rate,
                &non_blank(req.territory.as_deref()),
                &req.hire_date,
                &status,
                &non_blank(req.photo_url.as_deref()),
                &non_blank(req.bio.as_deref()),
                &id,
            ],
        )
        .await
    }

    pub async fn agent_delete(&self, id: AgentId) -> ApiResult<bool> {
        let conn = self.get_conn().await?;
        delete_by_id(&**conn, "agents", id).await
    }
}
