//! Change notifications published by the engine
//!
//! The engine mutates state and broadcasts these events; notification
//! plumbing (UI refresh, remote sync) lives in thin adapters that subscribe
//! to the broadcast channel. The engine itself never waits on receivers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::ServiceCategory;

/// Event emitted after engine state changed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FloorEvent {
    /// Table positions changed for a layout key
    LayoutChanged { key: String },
    /// Cluster set recomputed and published for a layout key
    ClustersUpdated { key: String },
    /// Reservation set for a day changed (add/update/remove)
    ReservationsChanged {
        date: NaiveDate,
        category: ServiceCategory,
    },
}
