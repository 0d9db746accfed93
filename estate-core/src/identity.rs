//! Identity and time aliases.

use chrono::{DateTime, NaiveDate, Utc};

/// Primary key of every table (`BIGSERIAL`).
pub type EntityId = i64;

pub type UserId = EntityId;
pub type AgentId = EntityId;
pub type PropertyId = EntityId;
pub type ClientId = EntityId;
pub type DealId = EntityId;
pub type ShowingId = EntityId;
pub type CommunicationId = EntityId;
pub type TaskId = EntityId;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Calendar date (listing dates, close dates, hire dates).
pub type Date = NaiveDate;
