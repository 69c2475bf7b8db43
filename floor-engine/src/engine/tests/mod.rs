mod assign_flow;
mod layout_flow;

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use shared::models::{ReservationDraft, Table};
use shared::types::{Acceptance, ReservationKind, ReservationStatus, ServiceCategory};
use uuid::Uuid;

use crate::config::FloorConfig;
use crate::engine::FloorManager;
use crate::store::{
    MemoryClusterStore, MemoryLayoutStore, MemoryReservationStore, ReservationStore,
};

pub(crate) fn create_test_manager(
    config: FloorConfig,
) -> (FloorManager, Arc<MemoryReservationStore>) {
    let reservations = Arc::new(MemoryReservationStore::new());
    let manager = FloorManager::new(
        config,
        Arc::clone(&reservations) as Arc<dyn ReservationStore>,
        Arc::new(MemoryClusterStore::new()),
        Arc::new(MemoryLayoutStore::new()),
    );
    (manager, reservations)
}

pub(crate) fn simple_table(id: i64, capacity: i32, row: i32, col: i32) -> Table {
    Table::new(id, format!("T{id}"), capacity, row, col)
}

pub(crate) fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
}

pub(crate) fn at(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub(crate) fn draft(start: &str, end: &str, party_size: i32) -> ReservationDraft {
    ReservationDraft {
        id: Uuid::new_v4(),
        name: "Ferrari".into(),
        phone: "+39 347 5551234".into(),
        party_size,
        date: test_date(),
        category: ServiceCategory::Dinner,
        start: start.into(),
        end: end.into(),
        notes: None,
        acceptance: Acceptance::Confirmed,
        status: ReservationStatus::Pending,
        kind: ReservationKind::InAdvance,
    }
}
