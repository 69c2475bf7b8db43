//! Shared types for the floor reservation engine
//!
//! Domain models, error types, engine events, and time utilities used by
//! the engine crate and by outer layers (UI adapters, persistence).

pub mod error;
pub mod event;
pub mod models;
pub mod types;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use error::{EngineError, EngineResult};
pub use event::FloorEvent;
pub use models::{Cluster, GridRect, Reservation, Table, TableSide};
pub use types::{Acceptance, ReservationKind, ReservationStatus, ServiceCategory};
