//! Closed value sets stored as lowercase text in the database.
//!
//! Every enum here round-trips through `as_db_str` / `from_db_str`, and its
//! serde representation is the same string, so rows read through
//! `row_to_json` deserialize directly into these types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EnumParseError;

/// Declares a text-backed enum together with its database mapping.
///
/// The `field` name is used in parse errors ("Invalid {field}. Allowed values: ...").
macro_rules! db_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident ($field:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $db:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $db)]
                $variant,
            )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Field name used in validation messages.
            pub const FIELD: &'static str = $field;

            /// Convert to database string representation.
            pub fn as_db_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $db,)+
                }
            }

            /// Parse from database string representation.
            pub fn from_db_str(s: &str) -> Result<Self, EnumParseError> {
                match s {
                    $($db => Ok($name::$variant),)+
                    _ => Err(EnumParseError::new($field, s, Self::allowed())),
                }
            }

            /// Database strings of every variant.
            pub fn allowed() -> Vec<&'static str> {
                Self::ALL.iter().map(|v| v.as_db_str()).collect()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_db_str())
            }
        }

        impl FromStr for $name {
            type Err = EnumParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_db_str(s)
            }
        }
    };
}

// ============================================================================
// USERS & AGENTS
// ============================================================================

db_enum! {
    /// Account role. Gates administrative routes.
    pub enum UserRole ("role") {
        Admin => "admin",
        Agent => "agent",
        Manager => "manager",
    }
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Agent
    }
}

db_enum! {
    pub enum AgentStatus ("status") {
        Active => "active",
        Inactive => "inactive",
    }
}

// ============================================================================
// PROPERTIES
// ============================================================================

db_enum! {
    pub enum PropertyType ("property_type") {
        Residential => "residential",
        Commercial => "commercial",
        Land => "land",
        MultiFamily => "multi-family",
    }
}

db_enum! {
    pub enum ListingType ("listing_type") {
        Sale => "sale",
        Rent => "rent",
        Lease => "lease",
    }
}

db_enum! {
    /// Listing lifecycle. `sold` and `off_market` are set by a won deal.
    pub enum PropertyStatus ("status") {
        Available => "available",
        Pending => "pending",
        UnderContract => "under_contract",
        Sold => "sold",
        OffMarket => "off_market",
    }
}

db_enum! {
    pub enum DocumentType ("document_type") {
        Deed => "deed",
        Inspection => "inspection",
        Disclosure => "disclosure",
        Contract => "contract",
    }
}

// ============================================================================
// CLIENTS
// ============================================================================

db_enum! {
    pub enum ClientType ("client_type") {
        Buyer => "buyer",
        Seller => "seller",
        Renter => "renter",
        Investor => "investor",
    }
}

db_enum! {
    pub enum ClientStatus ("status") {
        Lead => "lead",
        Active => "active",
        Inactive => "inactive",
        Closed => "closed",
    }
}

// ============================================================================
// DEALS
// ============================================================================

db_enum! {
    pub enum DealType ("deal_type") {
        Purchase => "purchase",
        Sale => "sale",
        Rental => "rental",
        Lease => "lease",
    }
}

impl DealType {
    /// Whether a won deal of this type transfers ownership of the property.
    pub fn transfers_ownership(&self) -> bool {
        matches!(self, DealType::Sale | DealType::Purchase)
    }
}

db_enum! {
    /// Position of a deal in the sales pipeline, declared in pipeline order.
    pub enum DealStage ("stage") {
        Lead => "lead",
        Viewing => "viewing",
        OfferMade => "offer_made",
        Negotiation => "negotiation",
        UnderContract => "under_contract",
        ClosedWon => "closed_won",
        ClosedLost => "closed_lost",
    }
}

impl DealStage {
    /// Closed stages stamp `actual_close_date`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DealStage::ClosedWon | DealStage::ClosedLost)
    }

    /// Zero-based position in the pipeline.
    pub fn pipeline_index(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).unwrap_or(0)
    }
}

impl Default for DealStage {
    fn default() -> Self {
        DealStage::Lead
    }
}

db_enum! {
    pub enum ActivityType ("activity_type") {
        StageChange => "stage_change",
        Note => "note",
        Email => "email",
        Call => "call",
        Meeting => "meeting",
        Viewing => "viewing",
    }
}

// ============================================================================
// SHOWINGS
// ============================================================================

db_enum! {
    pub enum ShowingType ("showing_type") {
        Private => "private",
        OpenHouse => "open_house",
    }
}

db_enum! {
    pub enum ShowingStatus ("status") {
        Scheduled => "scheduled",
        Completed => "completed",
        Cancelled => "cancelled",
        NoShow => "no_show",
    }
}

db_enum! {
    pub enum InterestLevel ("interest_level") {
        High => "high",
        Medium => "medium",
        Low => "low",
        None => "none",
    }
}

// ============================================================================
// COMMUNICATIONS
// ============================================================================

db_enum! {
    pub enum CommunicationType ("communication_type") {
        Email => "email",
        Call => "call",
        Sms => "sms",
        Meeting => "meeting",
        Note => "note",
    }
}

db_enum! {
    pub enum Direction ("direction") {
        Inbound => "inbound",
        Outbound => "outbound",
    }
}

// ============================================================================
// TASKS
// ============================================================================

db_enum! {
    pub enum TaskType ("task_type") {
        FollowUp => "follow_up",
        Showing => "showing",
        Document => "document",
        Closing => "closing",
    }
}

db_enum! {
    pub enum TaskPriority ("priority") {
        Low => "low",
        Medium => "medium",
        High => "high",
        Urgent => "urgent",
    }
}

impl TaskPriority {
    /// Sort rank used by task listings: urgent first, low last.
    pub fn sort_rank(&self) -> i32 {
        match self {
            TaskPriority::Urgent => 1,
            TaskPriority::High => 2,
            TaskPriority::Medium => 3,
            TaskPriority::Low => 4,
        }
    }
}

db_enum! {
    pub enum TaskStatus ("status") {
        Pending => "pending",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

db_enum! {
    /// Entity a task refers to through `related_id`.
    pub enum RelatedTo ("related_to") {
        Deal => "deal",
        Client => "client",
        Property => "property",
    }
}

// ============================================================================
// REPORTING
// ============================================================================

db_enum! {
    /// Reporting window for dashboard and agent statistics.
    pub enum StatsPeriod ("period") {
        Month => "month",
        Quarter => "quarter",
        Year => "year",
    }
}

impl StatsPeriod {
    /// Length of the trailing window as a PostgreSQL interval literal.
    pub fn interval(&self) -> &'static str {
        match self {
            StatsPeriod::Month => "1 month",
            StatsPeriod::Quarter => "3 months",
            StatsPeriod::Year => "1 year",
        }
    }

    /// `to_char` pattern used to bucket closed deals within the window.
    pub fn bucket_format(&self) -> &'static str {
        match self {
            StatsPeriod::Month => "YYYY-MM-DD",
            StatsPeriod::Quarter => "YYYY-WW",
            StatsPeriod::Year => "YYYY-MM",
        }
    }
}
