//! Store seams
//!
//! The engine consumes its collaborators as traits injected at construction,
//! so tests run against in-memory doubles and production wires in whatever
//! persistence the deployment uses. All traits are synchronous: the engine
//! is a single logical writer and persistence batching belongs to the
//! implementations.

mod memory;

pub use memory::{MemoryClusterStore, MemoryLayoutStore, MemoryReservationStore};

use chrono::NaiveDate;
use shared::error::EngineResult;
use shared::models::{Cluster, Reservation, Table};
use shared::types::ServiceCategory;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Backing store for reservations, with a change stream for updates made by
/// other processes (remote sync, other devices).
pub trait ReservationStore: Send + Sync {
    fn get_all(&self) -> EngineResult<Vec<Reservation>>;
    fn upsert(&self, reservation: Reservation) -> EngineResult<()>;
    fn delete(&self, id: Uuid) -> EngineResult<()>;
    /// Receiver of externally-originated reservation changes.
    fn subscribe(&self) -> broadcast::Receiver<Reservation>;
}

/// Persisted cluster sets, keyed by day and service category.
pub trait ClusterStore: Send + Sync {
    fn load(&self, date: NaiveDate, category: ServiceCategory) -> EngineResult<Vec<Cluster>>;
    fn save(
        &self,
        clusters: &[Cluster],
        date: NaiveDate,
        category: ServiceCategory,
    ) -> EngineResult<()>;
}

/// Persisted table layouts, keyed by the `"<ISO-date>-<category>"` string.
pub trait LayoutStore: Send + Sync {
    fn load(&self, date: NaiveDate, category: ServiceCategory) -> EngineResult<Option<Vec<Table>>>;
    /// Latest persisted layout of the same category strictly before `date`.
    /// Backs prior-key inheritance when the exact key has no entry, so a
    /// saved rearrangement carries forward across process restarts.
    fn load_closest_prior(
        &self,
        date: NaiveDate,
        category: ServiceCategory,
    ) -> EngineResult<Option<Vec<Table>>>;
    fn save(
        &self,
        tables: &[Table],
        date: NaiveDate,
        category: ServiceCategory,
    ) -> EngineResult<()>;
}
