//! Listing filters and pagination for shipment queries.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::{Department, Reason, Shipment, ShipmentState};

pub const DEFAULT_LIMIT: u32 = 100;
pub const MAX_LIMIT: u32 = 1000;

/// Pagination parameters for shipment listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub limit: u32,
    pub skip: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            skip: 0,
        }
    }
}

impl Pagination {
    pub fn new(limit: Option<u32>, skip: Option<u32>) -> Self {
        Self {
            limit: limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT),
            skip: skip.unwrap_or(0),
        }
    }
}

/// Filter criteria for shipment listings. Every criterion is optional and
/// they combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShipmentFilter {
    pub department: Option<Department>,
    pub reason: Option<Reason>,
    pub state: Option<ShipmentState>,
    /// First creation day included (UTC).
    pub created_from: Option<NaiveDate>,
    /// Last creation day included (UTC).
    pub created_to: Option<NaiveDate>,
}

impl ShipmentFilter {
    pub fn matches(&self, shipment: &Shipment) -> bool {
        if self.department.is_some_and(|d| d != shipment.department) {
            return false;
        }
        if self.reason.is_some_and(|r| r != shipment.reason) {
            return false;
        }
        if self.state.is_some_and(|s| s != shipment.state) {
            return false;
        }

        let created = shipment.created_at.date_naive();
        if self.created_from.is_some_and(|from| created < from) {
            return false;
        }
        if self.created_to.is_some_and(|to| created > to) {
            return false;
        }
        true
    }

    /// Inclusive UTC bounds as timestamps, for stores that filter in SQL.
    pub fn created_bounds(&self) -> (Option<chrono::DateTime<chrono::Utc>>, Option<chrono::DateTime<chrono::Utc>>) {
        let from = self
            .created_from
            .map(|d| d.and_time(NaiveTime::MIN).and_utc());
        let to = self
            .created_to
            .and_then(|d| d.and_hms_nano_opt(23, 59, 59, 999_999_999))
            .map(|dt| dt.and_utc());
        (from, to)
    }
}
