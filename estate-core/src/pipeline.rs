//! Deal pipeline rules.
//!
//! Moving a deal between stages touches up to three tables. The decisions
//! (close date, activity text, property outcome) are made here so the
//! transactional code in the API layer only has to execute them.

use serde::{Deserialize, Serialize};

use crate::enums::{DealStage, DealType, PropertyStatus};
use crate::identity::PropertyId;

/// Status change applied to the deal's property when it is won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyOutcome {
    pub property_id: PropertyId,
    pub status: PropertyStatus,
}

/// Planned effects of a single stage change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTransition {
    pub previous: DealStage,
    pub next: DealStage,
    /// Stamp `actual_close_date = CURRENT_DATE` on the deal.
    pub stamps_close_date: bool,
    /// Text of the `stage_change` activity row.
    pub activity_description: String,
    /// Property update, present only for a won deal with a linked property.
    pub property_outcome: Option<PropertyOutcome>,
}

impl StageTransition {
    pub fn plan(
        previous: DealStage,
        next: DealStage,
        deal_type: DealType,
        property_id: Option<PropertyId>,
        notes: Option<&str>,
    ) -> Self {
        let activity_description = match notes.map(str::trim) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => format!("Stage changed from {} to {}", previous, next),
        };

        let property_outcome = match (next, property_id) {
            (DealStage::ClosedWon, Some(property_id)) => Some(PropertyOutcome {
                property_id,
                status: if deal_type.transfers_ownership() {
                    PropertyStatus::Sold
                } else {
                    PropertyStatus::OffMarket
                },
            }),
            _ => None,
        };

        Self {
            previous,
            next,
            stamps_close_date: next.is_terminal(),
            activity_description,
            property_outcome,
        }
    }

    /// Confirmation message returned to the caller.
    pub fn message(&self) -> String {
        format!("Deal stage updated to {}", self.next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_won_sale_marks_property_sold() {
        let plan = StageTransition::plan(
            DealStage::UnderContract,
            DealStage::ClosedWon,
            DealType::Sale,
            Some(42),
            None,
        );
        assert!(plan.stamps_close_date);
        assert_eq!(
            plan.property_outcome,
            Some(PropertyOutcome { property_id: 42, status: PropertyStatus::Sold })
        );
        assert_eq!(
            plan.activity_description,
            "Stage changed from under_contract to closed_won"
        );
    }

    #[test]
    fn test_won_purchase_marks_property_sold() {
        let plan = StageTransition::plan(
            DealStage::Negotiation,
            DealStage::ClosedWon,
            DealType::Purchase,
            Some(7),
            None,
        );
        assert_eq!(plan.property_outcome.map(|o| o.status), Some(PropertyStatus::Sold));
    }

    #[test]
    fn test_won_rental_takes_property_off_market() {
        let plan = StageTransition::plan(
            DealStage::Negotiation,
            DealStage::ClosedWon,
            DealType::Rental,
            Some(7),
            None,
        );
        assert_eq!(
            plan.property_outcome.map(|o| o.status),
            Some(PropertyStatus::OffMarket)
        );
    }

    #[test]
    fn test_won_without_property_has_no_outcome() {
        let plan = StageTransition::plan(
            DealStage::Negotiation,
            DealStage::ClosedWon,
            DealType::Sale,
            None,
            None,
        );
        assert!(plan.property_outcome.is_none());
        assert!(plan.stamps_close_date);
    }

    #[test]
    fn test_lost_stamps_close_date_only() {
        let plan = StageTransition::plan(
            DealStage::OfferMade,
            DealStage::ClosedLost,
            DealType::Sale,
            Some(1),
            None,
        );
        assert!(plan.stamps_close_date);
        assert!(plan.property_outcome.is_none());
    }

    #[test]
    fn test_open_stage_changes_do_not_close() {
        let plan = StageTransition::plan(
            DealStage::Lead,
            DealStage::Viewing,
            DealType::Sale,
            Some(1),
            Some("Booked first viewing"),
        );
        assert!(!plan.stamps_close_date);
        assert!(plan.property_outcome.is_none());
        assert_eq!(plan.activity_description, "Booked first viewing");
        assert_eq!(plan.message(), "Deal stage updated to viewing");
    }

    #[test]
    fn test_blank_notes_fall_back_to_default_description() {
        let plan = StageTransition::plan(
            DealStage::Lead,
            DealStage::Viewing,
            DealType::Lease,
            None,
            Some("   "),
        );
        assert_eq!(plan.activity_description, "Stage changed from lead to viewing");
    }
}
