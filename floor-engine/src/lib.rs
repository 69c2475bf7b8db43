//! Floor reservation engine
//!
//! Assigns physical, spatially-arranged tables to time-bounded reservations
//! across the two daily service windows, preventing spatial overlap and
//! double-booking, and answering "what is active right now" in O(1).
//!
//! # Module structure
//!
//! ```text
//! floor-engine/src/
//! ├── config/      # Engine configuration (grid size, base layout, knobs)
//! ├── grid/        # Occupancy matrix
//! ├── layout/      # Per-(day, category) layouts, placement, moves
//! ├── locks/       # Advisory time-ranged table locks
//! ├── assignment/  # Table selection for a reservation draft
//! ├── cache/       # Day + minute temporal reservation index
//! ├── clusters/    # Adjacency clustering with signature-guarded cache
//! ├── store/       # Store seams + in-memory implementations
//! └── engine/      # FloorManager: coordination, events, side effects
//! ```

pub mod assignment;
pub mod cache;
pub mod clusters;
pub mod config;
pub mod engine;
pub mod grid;
pub mod layout;
pub mod locks;
pub mod store;

pub use assignment::{AssignmentError, AssignmentService, AvailableTable};
pub use cache::ReservationCache;
pub use clusters::ClusterManager;
pub use config::FloorConfig;
pub use engine::FloorManager;
pub use grid::Grid;
pub use layout::{LayoutService, MoveOutcome};
pub use locks::LockManager;
pub use store::{
    ClusterStore, LayoutStore, MemoryClusterStore, MemoryLayoutStore, MemoryReservationStore,
    ReservationStore,
};
