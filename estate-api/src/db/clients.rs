//! `clients` table.

use estate_core::{AgentId, ClientId, ClientStatus};

use super::{delete_by_id, exists, query_json, query_json_one, query_json_opt, query_page};
use super::{DbClient, QueryBuilder};
use crate::error::ApiResult;
use crate::pagination::Pagination;
use crate::response::Paginated;
use crate::types::{
    ClientCommunication, ClientDeal, ClientDetail, ClientFilter, ClientListItem, ClientRef,
    ClientRow, ClientShowing, CreateClientRequest, UpdateClientRequest,
};
use crate::validation::non_blank;

const RECENT_HISTORY: i64 = 10;

impl DbClient {
    pub async fn client_exists(&self, id: ClientId) -> ApiResult<bool> {
        let conn = self.get_conn().await?;
        exists(&**conn, "clients", id).await
    }

    pub async fn client_ref(&self, id: ClientId) -> ApiResult<Option<ClientRef>> {
        let conn = self.get_conn().await?;
        query_json_opt(
            &**conn,
            "SELECT id, first_name, last_name FROM clients WHERE id = $1",
            &[&id],
        )
        .await
    }

    pub async fn client_list(
        &self,
        filter: &ClientFilter,
        page: &Pagination,
    ) -> ApiResult<Paginated<ClientListItem>> {
        let mut qb = QueryBuilder::new();
        qb.and_eq("c.status", non_blank(filter.status.as_deref()))
            .and_eq("c.client_type", non_blank(filter.client_type.as_deref()))
            .and_eq("c.assigned_agent_id", filter.assigned_agent_id)
            .and_cmp("c.lead_score", ">=", filter.min_score)
            .and_cmp("c.lead_score", "<=", filter.max_score)
            .and_search(
                &["c.first_name", "c.last_name", "c.email", "c.phone"],
                filter.search.as_deref(),
            );

        let conn = self.get_conn().await?;
        query_page(
            &**conn,
            &qb,
            "c.*,
                a.first_name AS agent_first_name, a.last_name AS agent_last_name,
                (SELECT COUNT(*) FROM deals WHERE client_id = c.id) AS deal_count,
                (SELECT MAX(communication_date) FROM communications WHERE client_id = c.id) AS last_contact",
            "clients c LEFT JOIN agents a ON c.assigned_agent_id = a.id",
            "c.lead_score DESC, c.created_at DESC",
            page,
        )
        .await
    }

    /// Client with agent contact, deals, and the latest communications and showings.
    pub async fn client_detail(&self, id: ClientId) -> ApiResult<Option<ClientDetail>> {
        let conn = self.get_conn().await?;
        let detail: Option<ClientDetail> = query_json_opt(
            &**conn,
            "SELECT c.*,
                a.first_name AS agent_first_name, a.last_name AS agent_last_name,
                a.phone AS agent_phone,
                (SELECT COUNT(*) FROM deals WHERE client_id = c.id) AS deal_count
             FROM clients c
             LEFT JOIN agents a ON c.assigned_agent_id = a.id
             WHERE c.id = $1",
            &[&id],
        )
        .await?;
        let Some(mut detail) = detail else {
            return Ok(None);
        };

        let deals: Vec<ClientDeal> = query_json(
            &**conn,
            "SELECT d.*, p.address AS property_address
             FROM deals d LEFT JOIN properties p ON d.property_id = p.id
             WHERE d.client_id = $1
             ORDER BY d.created_at DESC",
            &[&id],
        )
        .await?;

        let communications: Vec<ClientCommunication> = query_json(
            &**conn,
            "SELECT id, communication_type, subject, direction, communication_date
             FROM communications
             WHERE client_id = $1
             ORDER BY communication_date DESC
             LIMIT $2",
            &[&id, &RECENT_HISTORY],
        )
        .await?;

        let showings: Vec<ClientShowing> = query_json(
            &**conn,
            "SELECT s.*, p.address AS property_address
             FROM showings s LEFT JOIN properties p ON s.property_id = p.id
             WHERE s.client_id = $1
             ORDER BY s.scheduled_date DESC
             LIMIT $2",
            &[&id, &RECENT_HISTORY],
        )
        .await?;

        detail.deals = deals;
        detail.communications = communications;
        detail.showings = showings;
        Ok(Some(detail))
    }

    pub async fn client_create(&self, req: &CreateClientRequest) -> ApiResult<ClientRow> {
        let f = &req.fields;
        let status = non_blank(f.status.as_deref()).unwrap_or(ClientStatus::Lead.as_db_str());
        let lead_score = f.lead_score.unwrap_or(0);

        let conn = self.get_conn().await?;
        let client: ClientRow = query_json_one(
            &**conn,
            "INSERT INTO clients (
                first_name, last_name, email, phone, secondary_phone,
                client_type, status, lead_source, lead_score,
                budget_min, budget_max, preferred_locations, requirements, assigned_agent_id
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10::float8, $11::float8, $12, $13, $14)
             RETURNING *",
            &[
                &non_blank(f.first_name.as_deref()),
                &non_blank(f.last_name.as_deref()),
                &non_blank(f.email.as_deref()),
                &non_blank(f.phone.as_deref()),
                &non_blank(f.secondary_phone.as_deref()),
                &non_blank(f.client_type.as_deref()),
                &status,
                &non_blank(f.lead_source.as_deref()),
                &lead_score,
                &f.budget_min,
                &f.budget_max,
                &f.preferred_locations,
                &f.requirements(),
                &f.assigned_agent_id,
            ],
        )
        .await?;

        tracing::info!(client_id = client.id, "Client created");
        Ok(client)
    }

    /// COALESCE update. `None` when the client does not exist.
    pub async fn client_update(
        &self,
        id: ClientId,
        req: &UpdateClientRequest,
    ) -> ApiResult<Option<ClientRow>> {
        let f = &req.fields;
        let conn = self.get_conn().await?;
        query_json_opt(
            &**conn,
            "UPDATE clients SET
                first_name = COALESCE($1, first_name),
                last_name = COALESCE($2, last_name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                secondary_phone = COALESCE($5, secondary_phone),
                client_type = COALESCE($6, client_type),
                status = COALESCE($7, status),
                lead_source = COALESCE($8, lead_source),
                lead_score = COALESCE($9, lead_score),
                budget_min = COALESCE($10::float8, budget_min),
                budget_max = COALESCE($11::float8, budget_max),
                preferred_locations = COALESCE($12, preferred_locations),
                requirements = COALESCE($13, requirements),
                assigned_agent_id = COALESCE($14, assigned_agent_id)
             WHERE id = $15
             RETURNING *",
            &[
                &non_blank(f.first_name.as_deref()),
                &non_blank(f.last_name.as_deref()),
                &non_blank(f.email.as_deref()),
                &non_blank(f.phone.as_deref()),
                &non_blank(f.secondary_phone.as_deref()),
                &non_blank(f.client_type.as_deref()),
                &non_blank(f.status.as_deref()),
                &non_blank(f.lead_source.as_deref()),
                &f.lead_score,
                &f.budget_min,
                &f.budget_max,
                &f.preferred_locations,
                &f.requirements(),
                &f.assigned_agent_id,
                &id,
            ],
        )
        .await
    }

    pub async fn client_delete(&self, id: ClientId) -> ApiResult<bool> {
        let conn = self.get_conn().await?;
        delete_by_id(&**conn, "clients", id).await
    }

    /// Set or clear the assigned agent.
    pub async fn client_assign_agent(
        &self,
        id: ClientId,
        agent_id: Option<AgentId>,
    ) -> ApiResult<Option<ClientRow>> {
        let conn = self.get_conn().await?;
        query_json_opt(
            &**conn,
            "UPDATE clients SET assigned_agent_id = $1 WHERE id = $2 RETURNING *",
            &[&agent_id, &id],
        )
        .await
    }

    pub async fn client_set_lead_score(
        &self,
        id: ClientId,
        lead_score: i32,
    ) -> ApiResult<Option<ClientRow>> {
        let conn = self.get_conn().await?;
        query_json_opt(
            &**conn,
            "UPDATE clients SET lead_score = $1 WHERE id = $2 RETURNING *",
            &[&lead_score, &id],
        )
        .await
    }
}
