//! `communications` table.

use estate_core::{ClientId, CommunicationId};

use super::{delete_by_id, exists, query_json, query_json_one, query_json_opt, query_page};
use super::{DbClient, QueryBuilder};
use crate::error::{ApiError, ApiResult};
use crate::pagination::Pagination;
use crate::response::Paginated;
use crate::types::{
    CommunicationDetail, CommunicationFilter, CommunicationListItem, CommunicationRow,
    CommunicationSummary, CreateCommunicationRequest, SummaryFilter, UpdateCommunicationRequest,
};
use crate::validation::non_blank;

const LIST_COLUMNS: &str = "cm.*,
    c.first_name AS client_first_name, c.last_name AS client_last_name,
    a.first_name AS agent_first_name, a.last_name AS agent_last_name";

const LIST_FROM: &str = "communications cm
    LEFT JOIN clients c ON cm.client_id = c.id
    LEFT JOIN agents a ON cm.agent_id = a.id";

impl DbClient {
    pub async fn communication_list(
        &self,
        filter: &CommunicationFilter,
        page: &Pagination,
    ) -> ApiResult<Paginated<CommunicationListItem>> {
        let mut qb = QueryBuilder::new();
        qb.and_eq(
            "cm.communication_type",
            non_blank(filter.communication_type.as_deref()),
        )
        .and_eq("cm.client_id", filter.client_id)
        .and_eq("cm.agent_id", filter.agent_id)
        .and_eq("cm.direction", non_blank(filter.direction.as_deref()))
        .and_cmp("cm.communication_date", ">=", filter.date_from)
        .and_cmp("cm.communication_date", "<=", filter.date_to);

        let conn = self.get_conn().await?;
        query_page(
            &**conn,
            &qb,
            LIST_COLUMNS,
            LIST_FROM,
            "cm.communication_date DESC",
            page,
        )
        .await
    }

    /// One client's history, newest first. The client columns are left out
    /// since the envelope carries the client.
    pub async fn communication_list_for_client(
        &self,
        client_id: ClientId,
        page: &Pagination,
    ) -> ApiResult<Paginated<CommunicationListItem>> {
        let mut qb = QueryBuilder::new();
        qb.and_eq("cm.client_id", Some(client_id));

        let conn = self.get_conn().await?;
        query_page(
            &**conn,
            &qb,
            "cm.*, a.first_name AS agent_first_name, a.last_name AS agent_last_name",
            "communications cm LEFT JOIN agents a ON cm.agent_id = a.id",
            "cm.communication_date DESC",
            page,
        )
        .await
    }

    pub async fn communication_detail(
        &self,
        id: CommunicationId,
    ) -> ApiResult<Option<CommunicationDetail>> {
        let conn = self.get_conn().await?;
        query_json_opt(
            &**conn,
            "SELECT cm.*,
                c.first_name AS client_first_name, c.last_name AS client_last_name,
                c.email AS client_email, c.phone AS client_phone,
                a.first_name AS agent_first_name, a.last_name AS agent_last_name
             FROM communications cm
             LEFT JOIN clients c ON cm.client_id = c.id
             LEFT JOIN agents a ON cm.agent_id = a.id
             WHERE cm.id = $1",
            &[&id],
        )
        .await
    }

    /// Per-type totals with the inbound/outbound split, largest first.
    pub async fn communication_summary(
        &self,
        filter: &SummaryFilter,
    ) -> ApiResult<Vec<CommunicationSummary>> {
        let mut qb = QueryBuilder::new();
        qb.and_eq("client_id", filter.client_id)
            .and_eq("agent_id", filter.agent_id)
            .and_cmp("communication_date", ">=", filter.date_from)
            .and_cmp("communication_date", "<=", filter.date_to);
        let sql = format!(
            "SELECT communication_type,
                COUNT(*) AS count,
                COUNT(*) FILTER (WHERE direction = 'inbound') AS inbound_count,
                COUNT(*) FILTER (WHERE direction = 'outbound') AS outbound_count
             FROM communications{}
             GROUP BY communication_type
             ORDER BY count DESC",
            qb.where_clause()
        );

        let conn = self.get_conn().await?;
        query_json(&**conn, &sql, &qb.sql_params()).await
    }

    /// Log a communication. The client, and the agent when given, must exist.
    pub async fn communication_create(
        &self,
        req: &CreateCommunicationRequest,
    ) -> ApiResult<CommunicationRow> {
        let conn = self.get_conn().await?;

        if let Some(client_id) = req.client_id {
            if !exists(&**conn, "clients", client_id).await? {
                return Err(ApiError::invalid_input("Client not found"));
            }
        }
        if let Some(agent_id) = req.agent_id {
            if !exists(&**conn, "agents", agent_id).await? {
                return Err(ApiError::invalid_input("Agent not found"));
            }
        }

        let communication: CommunicationRow = query_json_one(
            &**conn,
            "INSERT INTO communications (
                client_id, agent_id, communication_type, subject, content, direction,
                communication_date
             ) VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, NOW()))
             RETURNING *",
            &[
                &req.client_id,
                &req.agent_id,
                &non_blank(req.communication_type.as_deref()),
                &non_blank(req.subject.as_deref()),
                &non_blank(req.content.as_deref()),
                &req.direction().as_db_str(),
                &req.communication_date,
            ],
        )
        .await?;

        tracing::debug!(
            communication_id = communication.id,
            client_id = communication.client_id,
            "Communication logged"
        );
        Ok(communication)
    }

    pub async fn communication_update(
        &self,
        id: CommunicationId,
        req: &UpdateCommunicationRequest,
    ) -> ApiResult<Option<CommunicationRow>> {
        let conn = self.get_conn().await?;
        query_json_opt(
            &**conn,
            "UPDATE communications SET
                communication_type = COALESCE($1, communication_type),
                subject = COALESCE($2, subject),
                content = COALESCE($3, content),
                direction = COALESCE($4, direction)
             WHERE id = $5
             RETURNING *",
            &[
                &non_blank(req.communication_type.as_deref()),
                &non_blank(req.subject.as_deref()),
                &non_blank(req.content.as_deref()),
                &non_blank(req.direction.as_deref()),
                &id,
            ],
        )
        .await
    }

    pub async fn communication_delete(&self, id: CommunicationId) -> ApiResult<bool> {
        let conn = self.get_conn().await?;
        delete_by_id(&**conn, "communications", id).await
    }
}
