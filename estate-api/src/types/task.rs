//! Task types

use estate_core::{
    AgentId, EntityId, RelatedTo, TaskId, TaskPriority, TaskStatus, TaskType, Timestamp,
};
use serde::{Deserialize, Serialize};

use super::{lenient_i64, lenient_timestamp};
use crate::error::ApiResult;
use crate::validation::{self, RequiredFields};

/// Only tasks in this status can be completed.
pub const COMPLETABLE_STATUS: TaskStatus = TaskStatus::Pending;

/// A `tasks` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TaskRow {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub task_type: Option<TaskType>,
    pub related_to: Option<RelatedTo>,
    pub related_id: Option<EntityId>,
    pub assigned_to: Option<AgentId>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub due_date: Option<Timestamp>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub completed_at: Option<Timestamp>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl TaskRow {
    pub fn is_overdue(&self, now: Timestamp) -> bool {
        self.status == TaskStatus::Pending && self.due_date.map(|d| d < now).unwrap_or(false)
    }
}

/// Task with the assignee's name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TaskListItem {
    #[serde(flatten)]
    pub task: TaskRow,
    pub assigned_first_name: Option<String>,
    pub assigned_last_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TaskFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub task_type: Option<String>,
    pub related_to: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub related_id: Option<EntityId>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub assigned_to: Option<AgentId>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub due_date: Option<Timestamp>,
    pub priority: Option<String>,
}

impl TaskFields {
    fn validate_values(&self) -> ApiResult<()> {
        validation::parse_enum::<TaskType>(self.task_type.as_deref())?;
        validation::parse_enum::<RelatedTo>(self.related_to.as_deref())?;
        validation::parse_enum::<TaskPriority>(self.priority.as_deref())?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateTaskRequest {
    #[serde(flatten)]
    pub fields: TaskFields,
}

impl CreateTaskRequest {
    pub fn validate(&self) -> ApiResult<()> {
        RequiredFields::new()
            .check("title", &self.fields.title)
            .finish()?;
        self.fields.validate_values()
    }

    pub fn priority(&self) -> TaskPriority {
        validation::parse_enum::<TaskPriority>(self.fields.priority.as_deref())
            .ok()
            .flatten()
            .unwrap_or(TaskPriority::Medium)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateTaskRequest {
    #[serde(flatten)]
    pub fields: TaskFields,
    pub status: Option<String>,
}

impl UpdateTaskRequest {
    pub fn validate(&self) -> ApiResult<()> {
        self.fields.validate_values()?;
        validation::parse_enum::<TaskStatus>(self.status.as_deref())?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct TaskFilter {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub task_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub assigned_to: Option<AgentId>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct OverdueFilter {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub assigned_to: Option<AgentId>,
}
