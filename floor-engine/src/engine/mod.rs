//! Floor manager
//!
//! Top-level coordinator. Owns the layout service, lock manager, reservation
//! cache, clusterer and store handles, wires the side effects of every
//! operation, and broadcasts [`FloorEvent`]s for adapters to react to. The
//! manager never waits on event receivers and carries no view state: events
//! name keys, subscribers fetch what they need.
//!
//! Cluster recomputation is the only background work. It runs over a
//! snapshot of tables and reservations; the result is committed only if the
//! layout signature it was computed against still matches the live layout,
//! so a move that lands mid-computation simply discards the stale set.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use shared::error::EngineResult;
use shared::event::FloorEvent;
use shared::models::{Cluster, Reservation, ReservationDraft, Table};
use shared::types::ServiceCategory;
use shared::util::{layout_key, TimeCache};
use tokio::sync::broadcast;

use crate::assignment::{AssignmentError, AssignmentService, AvailableTable};
use crate::cache::ReservationCache;
use crate::clusters::ClusterManager;
use crate::config::FloorConfig;
use crate::layout::{LayoutService, MoveOutcome};
use crate::locks::LockManager;
use crate::store::{ClusterStore, LayoutStore, ReservationStore};

const EVENT_CHANNEL_CAPACITY: usize = 256;

pub struct FloorManager {
    inner: Arc<Inner>,
}

struct Inner {
    config: FloorConfig,
    layout: LayoutService,
    locks: LockManager,
    cache: ReservationCache,
    clusters: ClusterManager,
    assignment: AssignmentService,
    reservations: Arc<dyn ReservationStore>,
    time_cache: TimeCache,
    event_tx: broadcast::Sender<FloorEvent>,
}

impl FloorManager {
    pub fn new(
        config: FloorConfig,
        reservations: Arc<dyn ReservationStore>,
        clusters: Arc<dyn ClusterStore>,
        layouts: Arc<dyn LayoutStore>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let layout = LayoutService::new(
            config.total_rows,
            config.total_cols,
            config.base_tables.clone(),
            layouts,
        );
        let assignment = AssignmentService::new(config.preferred_order.clone());
        Self {
            inner: Arc::new(Inner {
                config,
                layout,
                locks: LockManager::new(),
                cache: ReservationCache::new(),
                clusters: ClusterManager::new(clusters),
                assignment,
                reservations,
                time_cache: TimeCache::new(),
                event_tx,
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FloorEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Load the layout for a key and make it live.
    pub fn load_layout(&self, date: NaiveDate, category: ServiceCategory) -> Vec<Table> {
        self.inner.layout.load_tables(date, category)
    }

    /// Live layout snapshot.
    pub fn tables(&self) -> Vec<Table> {
        self.inner.layout.tables()
    }

    /// Focus the temporal cache on `around ± preload_range` days, filled
    /// from the reservation store.
    pub fn preload_window(&self, around: NaiveDate) -> EngineResult<()> {
        let all = self.inner.reservations.get_all()?;
        self.inner
            .cache
            .preload(around, self.inner.config.preload_range as i64, &all);
        Ok(())
    }

    /// Assign tables for a draft and commit the reservation.
    ///
    /// On success the reservation is upserted with its table set, locks are
    /// taken for its window, the temporal index is updated, and a
    /// `ReservationsChanged` event goes out before the cluster recompute is
    /// kicked off.
    pub fn assign_tables(
        &self,
        draft: ReservationDraft,
        forced_table: Option<i64>,
    ) -> Result<Vec<Table>, AssignmentError> {
        let inner = &self.inner;
        let (start, end) = inner
            .time_cache
            .parse_window(&draft.start, &draft.end)
            .ok_or_else(|| {
                AssignmentError::Unknown(format!(
                    "unparseable reservation times {}-{}",
                    draft.start, draft.end
                ))
            })?;

        let layout = inner.layout.tables();
        let day = inner.cache.day(draft.date);
        // An edit must not trip over the locks its own first commit took
        if let Some(existing) = day.iter().find(|r| r.id == draft.id) {
            inner.release_locks(existing);
        }
        let tables = inner.assignment.assign(
            &layout,
            &day,
            &inner.locks,
            draft.date,
            start,
            end,
            draft.party_size,
            forced_table,
            Some(draft.id),
        )?;

        let date = draft.date;
        let category = draft.category;
        let reservation = draft.into_reservation(start, end, tables.clone(), Utc::now());
        inner.take_locks(&reservation);

        if let Err(e) = inner.reservations.upsert(reservation.clone()) {
            // Roll the locks back, the reservation was never committed
            inner.release_locks(&reservation);
            return Err(AssignmentError::Unknown(e.to_string()));
        }

        inner.cache.add_or_update(reservation);
        inner.publish(FloorEvent::ReservationsChanged { date, category });
        Inner::kick_cluster_recompute(inner, date, category);
        tracing::info!(
            date = %date,
            category = %category,
            tables = ?tables.iter().map(|t| t.id).collect::<Vec<_>>(),
            "Reservation committed"
        );
        Ok(tables)
    }

    /// Remove a reservation everywhere and republish.
    pub fn delete_reservation(
        &self,
        id: uuid::Uuid,
        date: NaiveDate,
        category: ServiceCategory,
    ) -> EngineResult<()> {
        let inner = &self.inner;
        if let Some(existing) = inner.cache.day(date).into_iter().find(|r| r.id == id) {
            inner.release_locks(&existing);
        }
        inner.reservations.delete(id)?;
        inner.cache.remove(id, date);
        inner.publish(FloorEvent::ReservationsChanged { date, category });
        Inner::kick_cluster_recompute(inner, date, category);
        Ok(())
    }

    /// Move a table on the live layout. A committed move is persisted for
    /// the key and invalidates the cluster set for it.
    pub fn move_table(
        &self,
        date: NaiveDate,
        category: ServiceCategory,
        table_id: i64,
        to_row: i32,
        to_col: i32,
    ) -> EngineResult<MoveOutcome> {
        let inner = &self.inner;
        let outcome = inner.layout.move_table(table_id, to_row, to_col);
        if outcome == MoveOutcome::Moved {
            let tables = inner.layout.tables();
            inner.layout.save_tables(&tables, date, category)?;
            inner.publish(FloorEvent::LayoutChanged {
                key: layout_key(date, category),
            });
            Inner::kick_cluster_recompute(inner, date, category);
        }
        Ok(outcome)
    }

    /// Restore the base layout for a key.
    pub fn reset_layout(&self, date: NaiveDate, category: ServiceCategory) -> EngineResult<()> {
        let inner = &self.inner;
        inner.layout.reset_tables(date, category)?;
        inner.publish(FloorEvent::LayoutChanged {
            key: layout_key(date, category),
        });
        Inner::kick_cluster_recompute(inner, date, category);
        Ok(())
    }

    /// Cluster set for a key. A cached set computed against the live layout
    /// signature is reused; anything else is recomputed and republished.
    pub fn clusters_for(
        &self,
        date: NaiveDate,
        category: ServiceCategory,
    ) -> EngineResult<Vec<Cluster>> {
        let inner = &self.inner;
        let signature = inner.layout.signature();
        if inner.clusters.cached_signature(date, category).as_deref() == Some(signature.as_str()) {
            return inner.clusters.load_clusters(date, category);
        }
        let clusters =
            inner
                .clusters
                .compute(&inner.cache.day(date), &inner.layout.tables(), date, category);
        inner
            .clusters
            .save_clusters(clusters.clone(), date, category, signature)?;
        Ok(clusters)
    }

    /// Re-index a reservation that changed outside this process.
    pub fn apply_external_change(&self, reservation: Reservation) {
        Inner::apply_external_change(&self.inner, reservation);
    }

    /// Spawn the store subscription loop, feeding external changes through
    /// [`Self::apply_external_change`] until the store closes the channel.
    pub fn spawn_store_listener(&self) -> tokio::task::JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        let mut rx = inner.reservations.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(reservation) => Inner::apply_external_change(&inner, reservation),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "Store listener lagged, resyncing from store");
                        if let Ok(all) = inner.reservations.get_all() {
                            for reservation in all {
                                inner.cache.add_or_update(reservation);
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    pub fn release_locks(&self, reservation: &Reservation) {
        self.inner.release_locks(reservation);
    }

    // Query delegation

    pub fn active_reservations(
        &self,
        date: NaiveDate,
        time: chrono::NaiveTime,
    ) -> Vec<Reservation> {
        self.inner.cache.active_reservations(date, time)
    }

    pub fn reservation_at(
        &self,
        table_id: i64,
        date: NaiveDate,
        time: chrono::NaiveTime,
        category: ServiceCategory,
    ) -> Option<Reservation> {
        self.inner.cache.reservation_at(table_id, date, time, category)
    }

    pub fn first_upcoming(
        &self,
        table_id: i64,
        date: NaiveDate,
        time: chrono::NaiveTime,
        category: ServiceCategory,
    ) -> Option<Reservation> {
        self.inner.cache.first_upcoming(table_id, date, time, category)
    }

    pub fn late_reservations(&self, now: chrono::NaiveDateTime) -> Vec<Reservation> {
        self.inner.cache.late(now)
    }

    pub fn nearing_end(&self, now: chrono::NaiveDateTime) -> Vec<Reservation> {
        self.inner.cache.nearing_end(now)
    }

    /// Free tables for a draft's window, flagging ones the draft already
    /// holds when editing.
    pub fn available_tables(
        &self,
        draft: &ReservationDraft,
    ) -> Result<Vec<AvailableTable>, AssignmentError> {
        let inner = &self.inner;
        let (start, end) = inner
            .time_cache
            .parse_window(&draft.start, &draft.end)
            .ok_or_else(|| {
                AssignmentError::Unknown(format!(
                    "unparseable reservation times {}-{}",
                    draft.start, draft.end
                ))
            })?;
        let day = inner.cache.day(draft.date);
        let editing = day.iter().find(|r| r.id == draft.id).cloned();
        Ok(inner.assignment.available_tables(
            &inner.layout.tables(),
            &day,
            draft.date,
            start,
            end,
            editing.as_ref(),
        ))
    }

    /// Purge index entries that lost their indexable status.
    pub fn validate_cache(&self) -> usize {
        self.inner.cache.validate()
    }
}

impl Inner {
    fn publish(&self, event: FloorEvent) {
        // Send fails only when nobody subscribed, which is fine
        let _ = self.event_tx.send(event);
    }

    fn release_locks(&self, reservation: &Reservation) {
        let start = reservation.start_datetime();
        let end = reservation.end_datetime();
        for table in &reservation.tables {
            self.locks.unlock(table.id, start, end);
        }
    }

    fn take_locks(&self, reservation: &Reservation) {
        let start = reservation.start_datetime();
        let end = reservation.end_datetime();
        for table in &reservation.tables {
            self.locks.lock(table.id, start, end);
        }
    }

    /// Re-index a reservation changed outside this process. Locks follow
    /// occupancy: whatever hold the previous version had is released, and
    /// only a version that still occupies its tables takes a new one, so a
    /// no-show or cancellation frees the table for the rest of the window.
    fn apply_external_change(inner: &Arc<Inner>, reservation: Reservation) {
        let date = reservation.date;
        let category = reservation.category;
        if let Some(previous) = inner
            .cache
            .day(date)
            .into_iter()
            .find(|r| r.id == reservation.id)
        {
            inner.release_locks(&previous);
        }
        if reservation.is_indexable() {
            tracing::debug!(reservation_id = %reservation.id, "Applying external change");
            if reservation.occupies_tables() {
                inner.take_locks(&reservation);
            }
            inner.cache.add_or_update(reservation);
        } else {
            tracing::debug!(
                reservation_id = %reservation.id,
                "Dropping externally removed reservation"
            );
            inner.release_locks(&reservation);
            inner.cache.remove(reservation.id, date);
        }
        inner.publish(FloorEvent::ReservationsChanged { date, category });
        Inner::kick_cluster_recompute(inner, date, category);
    }

    /// Recompute the cluster set for a key over a snapshot, in the
    /// background when a runtime is available, inline otherwise.
    fn kick_cluster_recompute(inner: &Arc<Inner>, date: NaiveDate, category: ServiceCategory) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let inner = Arc::clone(inner);
                handle.spawn(async move {
                    inner.recompute_clusters(date, category);
                });
            }
            Err(_) => inner.recompute_clusters(date, category),
        }
    }

    fn recompute_clusters(&self, date: NaiveDate, category: ServiceCategory) {
        let signature = self.layout.signature();
        let tables = self.layout.tables();
        let day = self.cache.day(date);

        let clusters = self.clusters.compute(&day, &tables, date, category);

        // A layout change since the snapshot invalidates the result; the
        // recompute kicked by that change will publish the correct set
        if self.layout.signature() != signature {
            tracing::debug!(date = %date, category = %category, "Discarding stale cluster set");
            return;
        }
        if let Err(e) = self
            .clusters
            .save_clusters(clusters, date, category, signature)
        {
            tracing::warn!(error = %e, "Failed to persist recomputed clusters");
            return;
        }
        self.publish(FloorEvent::ClustersUpdated {
            key: layout_key(date, category),
        });
    }
}

impl std::fmt::Debug for FloorManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FloorManager")
            .field("rows", &self.inner.config.total_rows)
            .field("cols", &self.inner.config.total_cols)
            .finish()
    }
}

#[cfg(test)]
mod tests;
