//! `showings` table.

use estate_core::{AgentId, ShowingId, ShowingStatus, ShowingType};

use super::{exists, query_json, query_json_one, query_json_opt, query_page};
use super::{DbClient, QueryBuilder};
use crate::error::{ApiError, ApiResult};
use crate::pagination::Pagination;
use crate::response::Paginated;
use crate::types::{
    AgentSchedule, CreateShowingRequest, DateRange, ShowingDetail, ShowingFilter,
    ShowingListItem, ShowingRow, UpdateShowingRequest, DEFAULT_DURATION_MINUTES,
};
use crate::validation::non_blank;

const LIST_COLUMNS: &str = "s.*,
    p.address AS property_address, p.city AS property_city,
    c.first_name AS client_first_name, c.last_name AS client_last_name,
    a.first_name AS agent_first_name, a.last_name AS agent_last_name";

const LIST_FROM: &str = "showings s
    LEFT JOIN properties p ON s.property_id = p.id
    LEFT JOIN clients c ON s.client_id = c.id
    LEFT JOIN agents a ON s.agent_id = a.id";

impl DbClient {
    pub async fn showing_list(
        &self,
        filter: &ShowingFilter,
        page: &Pagination,
    ) -> ApiResult<Paginated<ShowingListItem>> {
        let mut qb = QueryBuilder::new();
        qb.and_eq("s.status", non_blank(filter.status.as_deref()))
            .and_eq("s.agent_id", filter.agent_id)
            .and_eq("s.property_id", filter.property_id)
            .and_eq("s.client_id", filter.client_id)
            .and_cmp("s.scheduled_date", ">=", filter.date_from)
            .and_cmp("s.scheduled_date", "<=", filter.date_to);

        let conn = self.get_conn().await?;
        query_page(&**conn, &qb, LIST_COLUMNS, LIST_FROM, "s.scheduled_date ASC", page).await
    }

    /// Scheduled showings from now on, soonest first.
    pub async fn showing_upcoming(&self, limit: i64) -> ApiResult<Vec<ShowingListItem>> {
        let mut qb = QueryBuilder::new();
        qb.and_eq("s.status", Some(ShowingStatus::Scheduled))
            .push("s.scheduled_date >= NOW()");
        let sql = qb.select_sql(
            &format!("SELECT {} FROM {}", LIST_COLUMNS, LIST_FROM),
            "s.scheduled_date ASC",
            Some(limit),
        );

        let conn = self.get_conn().await?;
        query_json(&**conn, &sql, &qb.sql_params()).await
    }

    /// Scheduled and completed showings of one agent inside `range`.
    pub async fn showing_agent_schedule(
        &self,
        agent_id: AgentId,
        range: DateRange,
    ) -> ApiResult<AgentSchedule> {
        let mut qb = QueryBuilder::new();
        qb.and_eq("s.agent_id", Some(agent_id))
            .and_cmp("s.scheduled_date", ">=", Some(range.from))
            .and_cmp("s.scheduled_date", "<=", Some(range.to))
            .push(format!(
                "s.status IN ('{}', '{}')",
                ShowingStatus::Scheduled.as_db_str(),
                ShowingStatus::Completed.as_db_str()
            ));
        let sql = qb.select_sql(
            &format!("SELECT {} FROM {}", LIST_COLUMNS, LIST_FROM),
            "s.scheduled_date ASC",
            None,
        );

        let conn = self.get_conn().await?;
        let showings = query_json(&**conn, &sql, &qb.sql_params()).await?;
        Ok(AgentSchedule {
            agent_id,
            date_range: range,
            showings,
        })
    }

    pub async fn showing_detail(&self, id: ShowingId) -> ApiResult<Option<ShowingDetail>> {
        let conn = self.get_conn().await?;
        query_json_opt(
            &**conn,
            "SELECT s.*,
                p.address AS property_address, p.city AS property_city,
                p.price AS property_price, p.bedrooms, p.bathrooms, p.square_feet,
                c.first_name AS client_first_name, c.last_name AS client_last_name,
                c.email AS client_email, c.phone AS client_phone,
                a.first_name AS agent_first_name, a.last_name AS agent_last_name,
                a.phone AS agent_phone
             FROM showings s
             LEFT JOIN properties p ON s.property_id = p.id
             LEFT JOIN clients c ON s.client_id = c.id
             LEFT JOIN agents a ON s.agent_id = a.id
             WHERE s.id = $1",
            &[&id],
        )
        .await
    }

    /// Schedule a showing once its property, agent and client are confirmed.
    pub async fn showing_create(&self, req: &CreateShowingRequest) -> ApiResult<ShowingRow> {
        let f = &req.fields;
        let conn = self.get_conn().await?;

        if let Some(property_id) = f.property_id {
            if !exists(&**conn, "properties", property_id).await? {
                return Err(ApiError::invalid_input("Property not found"));
            }
        }
        if let Some(agent_id) = f.agent_id {
            if !exists(&**conn, "agents", agent_id).await? {
                return Err(ApiError::invalid_input("Agent not found"));
            }
        }
        if let Some(client_id) = f.client_id {
            if !exists(&**conn, "clients", client_id).await? {
                return Err(ApiError::invalid_input("Client not found"));
            }
        }
        req.validate_values()?;

        let showing_type =
            non_blank(f.showing_type.as_deref()).unwrap_or(ShowingType::Private.as_db_str());
        let status = non_blank(f.status.as_deref()).unwrap_or(ShowingStatus::Scheduled.as_db_str());
        let duration = f.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES);

        let showing: ShowingRow = query_json_one(
            &**conn,
            "INSERT INTO showings (
                property_id, client_id, agent_id, showing_type, scheduled_date,
                duration_minutes, status
             ) VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *",
            &[
                &f.property_id,
                &f.client_id,
                &f.agent_id,
                &showing_type,
                &f.scheduled_date,
                &duration,
                &status,
            ],
        )
        .await?;

        tracing::info!(showing_id = showing.id, "Showing scheduled");
        Ok(showing)
    }

    pub async fn showing_update(
        &self,
        id: ShowingId,
        req: &UpdateShowingRequest,
    ) -> ApiResult<Option<ShowingRow>> {
        let f = &req.fields;
        let conn = self.get_conn().await?;
        query_json_opt(
            &**conn,
            "UPDATE showings SET
                property_id = COALESCE($1, property_id),
                client_id = COALESCE($2, client_id),
                agent_id = COALESCE($3, agent_id),
                showing_type = COALESCE($4, showing_type),
                scheduled_date = COALESCE($5, scheduled_date),
                duration_minutes = COALESCE($6, duration_minutes),
                status = COALESCE($7, status)
             WHERE id = $8
             RETURNING *",
            &[
                &f.property_id,
                &f.client_id,
                &f.agent_id,
                &non_blank(f.showing_type.as_deref()),
                &f.scheduled_date,
                &f.duration_minutes,
                &non_blank(f.status.as_deref()),
                &id,
            ],
        )
        .await
    }

    /// Cancel a showing that is still scheduled. `None` for a missing,
    /// completed or already cancelled showing.
    pub async fn showing_cancel(&self, id: ShowingId) -> ApiResult<Option<ShowingRow>> {
        let conn = self.get_conn().await?;
        query_json_opt(
            &**conn,
            "UPDATE showings SET status = $1 WHERE id = $2 AND status = $3 RETURNING *",
            &[
                &ShowingStatus::Cancelled.as_db_str(),
                &id,
                &ShowingStatus::Scheduled.as_db_str(),
            ],
        )
        .await
    }

    /// Record feedback and mark the showing completed.
    pub async fn showing_feedback(
        &self,
        id: ShowingId,
        feedback: Option<&str>,
        interest_level: Option<&str>,
    ) -> ApiResult<Option<ShowingRow>> {
        let conn = self.get_conn().await?;
        query_json_opt(
            &**conn,
            "UPDATE showings SET
                status = $1,
                feedback = COALESCE($2, feedback),
                interest_level = COALESCE($3, interest_level)
             WHERE id = $4
             RETURNING *",
            &[
                &ShowingStatus::Completed.as_db_str(),
                &non_blank(feedback),
                &interest_level,
                &id,
            ],
        )
        .await
    }
}
