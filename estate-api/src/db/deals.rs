//! `deals` and `deal_activities` tables, including the stage transition.

use estate_core::{
    ActivityType, AgentId, DealId, DealStage, DealType, PropertyId, StageTransition, UserId,
};
use serde::Deserialize;
use tokio_postgres::GenericClient;

use super::{delete_by_id, exists, query_json, query_json_one, query_json_opt, query_page};
use super::{DbClient, QueryBuilder};
use crate::error::{ApiError, ApiResult};
use crate::pagination::Pagination;
use crate::response::Paginated;
use crate::types::{
    CreateDealRequest, DealActivity, DealDetail, DealFilter, DealListItem, DealRow,
    DealWithProperty, PipelineStage, UpdateDealRequest,
};
use crate::validation::non_blank;

const LIST_COLUMNS: &str = "d.*,
    p.address AS property_address, p.city AS property_city, p.price AS property_price,
    c.first_name AS client_first_name, c.last_name AS client_last_name,
    c.first_name || ' ' || c.last_name AS client_name,
    a.first_name AS agent_first_name, a.last_name AS agent_last_name,
    a.first_name || ' ' || a.last_name AS agent_name";

const LIST_FROM: &str = "deals d
    LEFT JOIN properties p ON d.property_id = p.id
    LEFT JOIN clients c ON d.client_id = c.id
    LEFT JOIN agents a ON d.agent_id = a.id";

/// Fields of a deal the stage transition depends on.
#[derive(Debug, Deserialize)]
struct StageSnapshot {
    stage: DealStage,
    deal_type: DealType,
    property_id: Option<PropertyId>,
}

/// `CASE stage WHEN 'lead' THEN 1 ... END`, ordering rows by pipeline position.
pub(crate) fn stage_order_sql(column: &str) -> String {
    let arms: Vec<String> = DealStage::ALL
        .iter()
        .map(|stage| format!("WHEN '{}' THEN {}", stage.as_db_str(), stage.pipeline_index() + 1))
        .collect();
    format!("CASE {} {} END", column, arms.join(" "))
}

/// Apply a planned stage change.
///
/// Runs the deal update, the `stage_change` activity insert and, for a won
/// deal with a property, the property status update, in that order. The
/// caller owns the transaction: if any statement fails the caller drops it
/// uncommitted and none of the writes persist.
pub async fn execute_stage_transition<C>(
    client: &C,
    deal_id: DealId,
    plan: &StageTransition,
    performed_by: Option<UserId>,
) -> ApiResult<()>
where
    C: GenericClient + Sync,
{
    let next = plan.next.as_db_str();
    let deal_sql = if plan.stamps_close_date {
        "UPDATE deals SET stage = $1, actual_close_date = CURRENT_DATE WHERE id = $2"
    } else {
        "UPDATE deals SET stage = $1 WHERE id = $2"
    };
    client.execute(deal_sql, &[&next, &deal_id]).await?;

    client
        .execute(
            "INSERT INTO deal_activities (
                deal_id, activity_type, description, previous_stage, new_stage, performed_by
             ) VALUES ($1, $2, $3, $4, $5, $6)",
            &[
                &deal_id,
                &ActivityType::StageChange.as_db_str(),
                &plan.activity_description,
                &plan.previous.as_db_str(),
                &next,
                &performed_by,
            ],
        )
        .await?;

    if let Some(outcome) = &plan.property_outcome {
        client
            .execute(
                "UPDATE properties SET status = $1, sold_date = CURRENT_DATE WHERE id = $2",
                &[&outcome.status.as_db_str(), &outcome.property_id],
            )
            .await?;
    }

    Ok(())
}

impl DbClient {
    pub async fn deal_exists(&self, id: DealId) -> ApiResult<bool> {
        let conn = self.get_conn().await?;
        exists(&**conn, "deals", id).await
    }

    pub async fn deal_list(
        &self,
        filter: &DealFilter,
        page: &Pagination,
    ) -> ApiResult<Paginated<DealListItem>> {
        let mut qb = QueryBuilder::new();
        qb.and_eq("d.stage", non_blank(filter.stage.as_deref()))
            .and_eq("d.deal_type", non_blank(filter.deal_type.as_deref()))
            .and_eq("d.agent_id", filter.agent_id)
            .and_eq("d.client_id", filter.client_id)
            .and_eq("d.property_id", filter.property_id);

        let conn = self.get_conn().await?;
        query_page(&**conn, &qb, LIST_COLUMNS, LIST_FROM, "d.created_at DESC", page).await
    }

    /// Deal with property, client and agent details and its activity log.
    pub async fn deal_detail(&self, id: DealId) -> ApiResult<Option<DealDetail>> {
        let conn = self.get_conn().await?;
        let detail: Option<DealDetail> = query_json_opt(
            &**conn,
            "SELECT d.*,
                p.address AS property_address, p.city AS property_city,
                p.price AS property_price, p.mls_number,
                c.first_name AS client_first_name, c.last_name AS client_last_name,
                c.email AS client_email, c.phone AS client_phone,
                a.first_name AS agent_first_name, a.last_name AS agent_last_name,
                a.phone AS agent_phone
             FROM deals d
             LEFT JOIN properties p ON d.property_id = p.id
             LEFT JOIN clients c ON d.client_id = c.id
             LEFT JOIN agents a ON d.agent_id = a.id
             WHERE d.id = $1",
            &[&id],
        )
        .await?;
        let Some(mut detail) = detail else {
            return Ok(None);
        };

        detail.activities = query_json(
            &**conn,
            "SELECT da.*, u.email AS performed_by_email
             FROM deal_activities da LEFT JOIN users u ON da.performed_by = u.id
             WHERE da.deal_id = $1
             ORDER BY da.activity_date DESC",
            &[&id],
        )
        .await?;
        Ok(Some(detail))
    }

    /// Insert a deal and its "Deal created" activity in one transaction.
    ///
    /// The client, the agent and any property must exist (400 otherwise).
    pub async fn deal_create(
        &self,
        req: &CreateDealRequest,
        performed_by: UserId,
    ) -> ApiResult<DealRow> {
        let mut conn = self.get_conn().await?;

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
        if let Some(property_id) = req.property_id {
            if !exists(&**conn, "properties", property_id).await? {
                return Err(ApiError::invalid_input("Property not found"));
            }
        }

        let stage = req.stage().as_db_str();
        let tx = conn.transaction().await?;

        let deal: DealRow = query_json_one(
            &*tx,
            "INSERT INTO deals (
                property_id, client_id, agent_id, deal_type, stage,
                offer_amount, expected_close_date, notes
             ) VALUES ($1, $2, $3, $4, $5, $6::float8, $7, $8)
             RETURNING *",
            &[
                &req.property_id,
                &req.client_id,
                &req.agent_id,
                &non_blank(req.deal_type.as_deref()),
                &stage,
                &req.offer_amount,
                &req.expected_close_date,
                &non_blank(req.notes.as_deref()),
            ],
        )
        .await?;

        tx.execute(
            "INSERT INTO deal_activities (deal_id, activity_type, description, new_stage, performed_by)
             VALUES ($1, $2, 'Deal created', $3, $4)",
            &[
                &deal.id,
                &ActivityType::StageChange.as_db_str(),
                &stage,
                &performed_by,
            ],
        )
        .await?;

        tx.commit().await?;
        tracing::info!(deal_id = deal.id, stage, "Deal created");
        Ok(deal)
    }

    /// COALESCE update. Stage changes go through [`DbClient::deal_update_stage`].
    pub async fn deal_update(
        &self,
        id: DealId,
        req: &UpdateDealRequest,
    ) -> ApiResult<Option<DealRow>> {
        let conn = self.get_conn().await?;
        query_json_opt(
            &**conn,
            "UPDATE deals SET
                property_id = COALESCE($1, property_id),
                client_id = COALESCE($2, client_id),
                agent_id = COALESCE($3, agent_id),
                deal_type = COALESCE($4, deal_type),
                offer_amount = COALESCE($5::float8, offer_amount),
                final_amount = COALESCE($6::float8, final_amount),
                commission_amount = COALESCE($7::float8, commission_amount),
                expected_close_date = COALESCE($8, expected_close_date),
                actual_close_date = COALESCE($9, actual_close_date),
                notes = COALESCE($10, notes)
             WHERE id = $11
             RETURNING *",
            &[
                &req.property_id,
                &req.client_id,
                &req.agent_id,
                &non_blank(req.deal_type.as_deref()),
                &req.offer_amount,
                &req.final_amount,
                &req.commission_amount,
                &req.expected_close_date,
                &req.actual_close_date,
                &non_blank(req.notes.as_deref()),
                &id,
            ],
        )
        .await
    }

    /// Move a deal to `next` atomically. `None` when the deal does not exist.
    ///
    /// The deal row is locked for the duration of the transaction so the
    /// recorded `previous_stage` is the stage actually replaced.
    pub async fn deal_update_stage(
        &self,
        id: DealId,
        next: DealStage,
        notes: Option<&str>,
        performed_by: Option<UserId>,
    ) -> ApiResult<Option<(DealWithProperty, StageTransition)>> {
        let mut conn = self.get_conn().await?;
        let tx = conn.transaction().await?;

        let snapshot: Option<StageSnapshot> = query_json_opt(
            &*tx,
            "SELECT stage, deal_type, property_id FROM deals WHERE id = $1 FOR UPDATE",
            &[&id],
        )
        .await?;
        let Some(snapshot) = snapshot else {
            return Ok(None);
        };

        let plan = StageTransition::plan(
            snapshot.stage,
            next,
            snapshot.deal_type,
            snapshot.property_id,
            notes,
        );
        execute_stage_transition(&*tx, id, &plan, performed_by).await?;
        tx.commit().await?;

        tracing::debug!(
            deal_id = id,
            property_outcome = ?plan.property_outcome,
            "Stage transition committed"
        );

        let deal: DealWithProperty = query_json_one(
            &**conn,
            "SELECT d.*, p.address AS property_address
             FROM deals d LEFT JOIN properties p ON d.property_id = p.id
             WHERE d.id = $1",
            &[&id],
        )
        .await?;
        Ok(Some((deal, plan)))
    }

    pub async fn deal_delete(&self, id: DealId) -> ApiResult<bool> {
        let conn = self.get_conn().await?;
        delete_by_id(&**conn, "deals", id).await
    }

    // ------------------------------------------------------------------------
    // Activities
    // ------------------------------------------------------------------------

    pub async fn deal_activities(
        &self,
        deal_id: DealId,
        page: &Pagination,
    ) -> ApiResult<Paginated<DealActivity>> {
        let mut qb = QueryBuilder::new();
        qb.and_eq("da.deal_id", Some(deal_id));

        let conn = self.get_conn().await?;
        query_page(
            &**conn,
            &qb,
            "da.*, u.email AS performed_by_email",
            "deal_activities da LEFT JOIN users u ON da.performed_by = u.id",
            "da.activity_date DESC",
            page,
        )
        .await
    }

    pub async fn deal_add_activity(
        &self,
        deal_id: DealId,
        activity_type: ActivityType,
        description: Option<&str>,
        performed_by: UserId,
    ) -> ApiResult<DealActivity> {
        let conn = self.get_conn().await?;
        query_json_one(
            &**conn,
            "INSERT INTO deal_activities (deal_id, activity_type, description, performed_by)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
            &[
                &deal_id,
                &activity_type.as_db_str(),
                &non_blank(description),
                &performed_by,
            ],
        )
        .await
    }

    /// Count and offer total per stage, in pipeline order.
    pub async fn deal_pipeline(&self, agent_id: Option<AgentId>) -> ApiResult<Vec<PipelineStage>> {
        let mut qb = QueryBuilder::new();
        qb.and_eq("agent_id", agent_id);
        let sql = format!(
            "SELECT stage, COUNT(*) AS count, COALESCE(SUM(offer_amount), 0) AS total_value
             FROM deals{}
             GROUP BY stage
             ORDER BY {}",
            qb.where_clause(),
            stage_order_sql("stage")
        );

        let conn = self.get_conn().await?;
        query_json(&**conn, &sql, &qb.sql_params()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order_follows_pipeline() {
        let sql = stage_order_sql("stage");
        assert!(sql.starts_with("CASE stage WHEN 'lead' THEN 1 WHEN 'viewing' THEN 2"));
        assert!(sql.ends_with("WHEN 'closed_lost' THEN 7 END"));
    }
}
