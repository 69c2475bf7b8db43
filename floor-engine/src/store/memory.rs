//! In-memory store implementations
//!
//! Used by tests and by standalone (offline) operation. The layout store
//! keeps raw JSON values and decodes through the degrade path, so malformed
//! persisted layouts behave the same here as against real storage.

use std::collections::HashMap;

use chrono::NaiveDate;
use parking_lot::RwLock;
use shared::error::EngineResult;
use shared::models::{Cluster, Reservation, Table};
use shared::types::ServiceCategory;
use shared::util::layout_key;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::{ClusterStore, LayoutStore, ReservationStore};
use crate::layout::decode_tables;

const CHANGE_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug)]
pub struct MemoryReservationStore {
    reservations: RwLock<HashMap<Uuid, Reservation>>,
    change_tx: broadcast::Sender<Reservation>,
}

impl Default for MemoryReservationStore {
    fn default() -> Self {
        let (change_tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            reservations: RwLock::new(HashMap::new()),
            change_tx,
        }
    }
}

impl MemoryReservationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject a change as if another process wrote it, notifying subscribers.
    pub fn push_external(&self, reservation: Reservation) {
        self.reservations
            .write()
            .insert(reservation.id, reservation.clone());
        let _ = self.change_tx.send(reservation);
    }
}

impl ReservationStore for MemoryReservationStore {
    fn get_all(&self) -> EngineResult<Vec<Reservation>> {
        Ok(self.reservations.read().values().cloned().collect())
    }

    fn upsert(&self, reservation: Reservation) -> EngineResult<()> {
        self.reservations
            .write()
            .insert(reservation.id, reservation);
        Ok(())
    }

    fn delete(&self, id: Uuid) -> EngineResult<()> {
        self.reservations.write().remove(&id);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<Reservation> {
        self.change_tx.subscribe()
    }
}

#[derive(Debug, Default)]
pub struct MemoryClusterStore {
    clusters: RwLock<HashMap<String, Vec<Cluster>>>,
}

impl MemoryClusterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClusterStore for MemoryClusterStore {
    fn load(&self, date: NaiveDate, category: ServiceCategory) -> EngineResult<Vec<Cluster>> {
        let key = layout_key(date, category);
        Ok(self.clusters.read().get(&key).cloned().unwrap_or_default())
    }

    fn save(
        &self,
        clusters: &[Cluster],
        date: NaiveDate,
        category: ServiceCategory,
    ) -> EngineResult<()> {
        let key = layout_key(date, category);
        self.clusters.write().insert(key, clusters.to_vec());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryLayoutStore {
    layouts: RwLock<HashMap<String, serde_json::Value>>,
}

impl MemoryLayoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw JSON value under a key, bypassing encoding. Lets tests
    /// exercise the malformed-layout degrade path.
    pub fn seed_raw(&self, key: impl Into<String>, value: serde_json::Value) {
        self.layouts.write().insert(key.into(), value);
    }
}

impl LayoutStore for MemoryLayoutStore {
    fn load(&self, date: NaiveDate, category: ServiceCategory) -> EngineResult<Option<Vec<Table>>> {
        let key = layout_key(date, category);
        Ok(self
            .layouts
            .read()
            .get(&key)
            .map(|raw| decode_tables(raw, &key)))
    }

    fn load_closest_prior(
        &self,
        date: NaiveDate,
        category: ServiceCategory,
    ) -> EngineResult<Option<Vec<Table>>> {
        let key = layout_key(date, category);
        let suffix = format!("-{category}");
        // ISO-date prefixes make lexicographic order chronological
        Ok(self
            .layouts
            .read()
            .iter()
            .filter(|(k, _)| k.ends_with(&suffix) && k.as_str() < key.as_str())
            .max_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(k, raw)| decode_tables(raw, k)))
    }

    fn save(
        &self,
        tables: &[Table],
        date: NaiveDate,
        category: ServiceCategory,
    ) -> EngineResult<()> {
        let key = layout_key(date, category);
        let value = serde_json::to_value(tables)?;
        self.layouts.write().insert(key, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn layout_store_round_trips() {
        let store = MemoryLayoutStore::new();
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let tables = vec![Table::new(1, "T1", 2, 1, 14)];

        store
            .save(&tables, date, ServiceCategory::Lunch)
            .unwrap();
        let loaded = store.load(date, ServiceCategory::Lunch).unwrap().unwrap();
        assert_eq!(loaded, tables);
        assert!(store.load(date, ServiceCategory::Dinner).unwrap().is_none());
    }

    #[test]
    fn malformed_layout_degrades_to_empty() {
        let store = MemoryLayoutStore::new();
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        store.seed_raw(layout_key(date, ServiceCategory::Dinner), json!("garbage"));

        let loaded = store.load(date, ServiceCategory::Dinner).unwrap().unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn reservation_store_notifies_subscribers() {
        use chrono::{NaiveTime, Utc};
        use shared::types::{Acceptance, ReservationKind, ReservationStatus};

        let store = MemoryReservationStore::new();
        let mut rx = store.subscribe();

        let reservation = Reservation {
            id: Uuid::new_v4(),
            name: "Rossi".into(),
            phone: "333 1234567".into(),
            party_size: 2,
            date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            category: ServiceCategory::Dinner,
            start_time: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(21, 0, 0).unwrap(),
            acceptance: Acceptance::Confirmed,
            status: ReservationStatus::Pending,
            kind: ReservationKind::InAdvance,
            notes: None,
            tables: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        store.push_external(reservation.clone());

        assert_eq!(store.get_all().unwrap().len(), 1);
        assert_eq!(rx.try_recv().unwrap().id, reservation.id);
    }
}
