//! `tasks` table.

use estate_core::{AgentId, TaskId, TaskPriority, TaskStatus};

use super::{delete_by_id, query_json, query_json_one, query_json_opt, query_page};
use super::{DbClient, QueryBuilder};
use crate::error::ApiResult;
use crate::pagination::Pagination;
use crate::response::Paginated;
use crate::types::{
    CreateTaskRequest, OverdueFilter, TaskFilter, TaskListItem, TaskRow, UpdateTaskRequest,
    COMPLETABLE_STATUS,
};
use crate::validation::non_blank;

const LIST_COLUMNS: &str =
    "t.*, a.first_name AS assigned_first_name, a.last_name AS assigned_last_name";

const LIST_FROM: &str = "tasks t LEFT JOIN agents a ON t.assigned_to = a.id";

/// Urgent first, then by due date with undated tasks last.
fn list_order() -> String {
    let arms: Vec<String> = TaskPriority::ALL
        .iter()
        .map(|p| format!("WHEN '{}' THEN {}", p.as_db_str(), p.sort_rank()))
        .collect();
    format!("CASE t.priority {} END, t.due_date ASC NULLS LAST", arms.join(" "))
}

impl DbClient {
    pub async fn task_list(
        &self,
        filter: &TaskFilter,
        page: &Pagination,
    ) -> ApiResult<Paginated<TaskListItem>> {
        let mut qb = QueryBuilder::new();
        qb.and_eq("t.status", non_blank(filter.status.as_deref()))
            .and_eq("t.priority", non_blank(filter.priority.as_deref()))
            .and_eq("t.task_type", non_blank(filter.task_type.as_deref()))
            .and_eq("t.assigned_to", filter.assigned_to);

        let conn = self.get_conn().await?;
        query_page(&**conn, &qb, LIST_COLUMNS, LIST_FROM, &list_order(), page).await
    }

    /// Tasks assigned to one agent, in list order.
    pub async fn task_list_for_agent(
        &self,
        agent_id: AgentId,
        page: &Pagination,
    ) -> ApiResult<Paginated<TaskListItem>> {
        let mut qb = QueryBuilder::new();
        qb.and_eq("t.assigned_to", Some(agent_id));

        let conn = self.get_conn().await?;
        query_page(&**conn, &qb, LIST_COLUMNS, LIST_FROM, &list_order(), page).await
    }

    /// Pending tasks past their due date, oldest due first.
    pub async fn task_overdue(&self, filter: &OverdueFilter) -> ApiResult<Vec<TaskListItem>> {
        let mut qb = QueryBuilder::new();
        qb.and_eq("t.status", Some(TaskStatus::Pending))
            .push("t.due_date < NOW()")
            .and_eq("t.assigned_to", filter.assigned_to);
        let sql = qb.select_sql(
            &format!("SELECT {} FROM {}", LIST_COLUMNS, LIST_FROM),
            "t.due_date ASC",
            None,
        );

        let conn = self.get_conn().await?;
        query_json(&**conn, &sql, &qb.sql_params()).await
    }

    pub async fn task_detail(&self, id: TaskId) -> ApiResult<Option<TaskListItem>> {
        let conn = self.get_conn().await?;
        query_json_opt(
            &**conn,
            &format!("SELECT {} FROM {} WHERE t.id = $1", LIST_COLUMNS, LIST_FROM),
            &[&id],
        )
        .await
    }

    pub async fn task_create(&self, req: &CreateTaskRequest) -> ApiResult<TaskRow> {
        let f = &req.fields;
        let conn = self.get_conn().await?;
        let task: TaskRow = query_json_one(
            &**conn,
            "INSERT INTO tasks (
                title, description, task_type, related_to, related_id,
                assigned_to, due_date, priority
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
            &[
                &non_blank(f.title.as_deref()),
                &non_blank(f.description.as_deref()),
                &non_blank(f.task_type.as_deref()),
                &non_blank(f.related_to.as_deref()),
                &f.related_id,
                &f.assigned_to,
                &f.due_date,
                &req.priority().as_db_str(),
            ],
        )
        .await?;

        tracing::debug!(task_id = task.id, priority = %task.priority, "Task created");
        Ok(task)
    }

    pub async fn task_update(
        &self,
        id: TaskId,
        req: &UpdateTaskRequest,
    ) -> ApiResult<Option<TaskRow>> {
        let f = &req.fields;
        let conn = self.get_conn().await?;
        query_json_opt(
            &**conn,
            "UPDATE tasks SET
                title = COALESCE($1, title),
                description = COALESCE($2, description),
                task_type = COALESCE($3, task_type),
                related_to = COALESCE($4, related_to),
                related_id = COALESCE($5, related_id),
                assigned_to = COALESCE($6, assigned_to),
                due_date = COALESCE($7, due_date),
                priority = COALESCE($8, priority),
                status = COALESCE($9, status)
             WHERE id = $10
             RETURNING *",
            &[
                &non_blank(f.title.as_deref()),
                &non_blank(f.description.as_deref()),
                &non_blank(f.task_type.as_deref()),
                &non_blank(f.related_to.as_deref()),
                &f.related_id,
                &f.assigned_to,
                &f.due_date,
                &non_blank(f.priority.as_deref()),
                &non_blank(req.status.as_deref()),
                &id,
            ],
        )
        .await
    }

    /// Complete a pending task. `None` when the task is missing or no longer
    /// pending, so repeating the call changes nothing.
    pub async fn task_complete(&self, id: TaskId) -> ApiResult<Option<TaskRow>> {
        let conn = self.get_conn().await?;
        query_json_opt(
            &**conn,
            "UPDATE tasks SET status = $1, completed_at = NOW()
             WHERE id = $2 AND status = $3
             RETURNING *",
            &[
                &TaskStatus::Completed.as_db_str(),
                &id,
                &COMPLETABLE_STATUS.as_db_str(),
            ],
        )
        .await
    }

    pub async fn task_delete(&self, id: TaskId) -> ApiResult<bool> {
        let conn = self.get_conn().await?;
        delete_by_id(&**conn, "tasks", id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_order_ranks_urgent_first() {
        let order = list_order();
        assert_eq!(
            order,
            "CASE t.priority WHEN 'low' THEN 4 WHEN 'medium' THEN 3 WHEN 'high' THEN 2 \
             WHEN 'urgent' THEN 1 END, t.due_date ASC NULLS LAST"
        );
    }
}
