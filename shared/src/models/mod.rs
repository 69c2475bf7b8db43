//! Domain models

mod cluster;
mod reservation;
mod table;

pub use cluster::Cluster;
pub use reservation::{Reservation, ReservationDraft};
pub use table::{GridRect, Table, TableSide, TABLE_FOOTPRINT};
