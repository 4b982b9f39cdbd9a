//! Rate cards (read-only approval context).
//!
//! Rate-card CRUD lives outside this core; we only read active cards to give
//! approvers pricing context, and failures here must never fail the primary
//! operation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use apflow_core::{Money, ProjectId, VendorId};

use crate::order::SourceError;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RateCardStatus {
    Active,
    Draft,
    Expired,
}

/// One negotiated rate: a role and experience band priced per unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateEntry {
    pub role: String,
    pub experience_min_years: u8,
    pub experience_max_years: u8,
    pub rate: Money,
    /// Billing unit, e.g. "hour" or "day".
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateCard {
    pub vendor_id: VendorId,
    pub project_id: Option<ProjectId>,
    pub effective_from: DateTime<Utc>,
    pub effective_to: DateTime<Utc>,
    pub status: RateCardStatus,
    pub entries: Vec<RateEntry>,
}

impl RateCard {
    /// Is this card usable as approval context at `now`?
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status == RateCardStatus::Active
            && self.effective_from <= now
            && now < self.effective_to
    }
}

/// Read access to rate cards for approval context.
pub trait RateCardSource: Send + Sync {
    fn list_for_vendor(&self, vendor_id: VendorId) -> Result<Vec<RateCard>, SourceError>;
}

impl<S> RateCardSource for Arc<S>
where
    S: RateCardSource + ?Sized,
{
    fn list_for_vendor(&self, vendor_id: VendorId) -> Result<Vec<RateCard>, SourceError> {
        (**self).list_for_vendor(vendor_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn active_window_is_half_open() {
        let now = Utc::now();
        let card = RateCard {
            vendor_id: VendorId::new(),
            project_id: None,
            effective_from: now - Duration::days(30),
            effective_to: now + Duration::days(30),
            status: RateCardStatus::Active,
            entries: vec![],
        };

        assert!(card.is_active_at(now));
        assert!(card.is_active_at(card.effective_from));
        assert!(!card.is_active_at(card.effective_to));
    }

    #[test]
    fn draft_cards_are_never_active() {
        let now = Utc::now();
        let card = RateCard {
            vendor_id: VendorId::new(),
            project_id: None,
            effective_from: now - Duration::days(1),
            effective_to: now + Duration::days(1),
            status: RateCardStatus::Draft,
            entries: vec![],
        };
        assert!(!card.is_active_at(now));
    }
}
