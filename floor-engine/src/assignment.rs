//! Table assignment
//!
//! Picks tables for a reservation: either a caller-forced starting table
//! grown into an adjacency-reachable block, or an automatic search that tries
//! single tables in house preference order before falling back to contiguous
//! blocks. Occupancy is judged against the day's reservations with half-open
//! time overlap, so back-to-back bookings on the same table are fine.

use std::collections::{HashSet, VecDeque};

use chrono::{NaiveDate, NaiveTime};
use shared::models::{Reservation, Table};
use thiserror::Error;

use crate::locks::LockManager;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssignmentError {
    #[error("no tables are free for the requested time")]
    NoTablesLeft,
    #[error("free tables cannot seat the requested party size")]
    InsufficientTables,
    #[error("table {0} does not exist in the current layout")]
    TableNotFound(i64),
    #[error("table {0} is locked for the requested time")]
    TableLocked(i64),
    #[error("assignment failed: {0}")]
    Unknown(String),
}

/// A free table as reported to callers, with a flag for tables the
/// reservation being edited already holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableTable {
    pub table: Table,
    pub currently_assigned: bool,
}

pub struct AssignmentService {
    preferred_order: Vec<String>,
}

impl AssignmentService {
    pub fn new(preferred_order: Vec<String>) -> Self {
        Self { preferred_order }
    }

    fn preference_rank(&self, table: &Table) -> usize {
        self.preferred_order
            .iter()
            .position(|name| name == &table.name)
            .unwrap_or(self.preferred_order.len())
    }

    /// Tables sorted by house preference, then by id for names outside the
    /// preference list.
    fn ordered<'a>(&self, layout: &'a [Table]) -> Vec<&'a Table> {
        let mut tables: Vec<&Table> = layout.iter().collect();
        tables.sort_by_key(|t| (self.preference_rank(t), t.id));
        tables
    }

    /// True iff `table` is held by some other occupying reservation on the
    /// same date with an overlapping half-open time window.
    pub fn is_table_occupied(
        table_id: i64,
        day_reservations: &[Reservation],
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        excluding: Option<uuid::Uuid>,
    ) -> bool {
        day_reservations.iter().any(|res| {
            res.date == date
                && Some(res.id) != excluding
                && res.occupies_tables()
                && res.tables.iter().any(|t| t.id == table_id)
                && shared::util::time_ranges_overlap(res.start_time, res.end_time, start, end)
        })
    }

    /// Free tables for a window, flagged with the ones `editing` already has.
    pub fn available_tables(
        &self,
        layout: &[Table],
        day_reservations: &[Reservation],
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        editing: Option<&Reservation>,
    ) -> Vec<AvailableTable> {
        let held: HashSet<i64> = editing
            .map(|r| r.tables.iter().map(|t| t.id).collect())
            .unwrap_or_default();
        let excluding = editing.map(|r| r.id);

        self.ordered(layout)
            .into_iter()
            .filter(|t| {
                !Self::is_table_occupied(t.id, day_reservations, date, start, end, excluding)
            })
            .map(|t| AvailableTable {
                table: t.clone(),
                currently_assigned: held.contains(&t.id),
            })
            .collect()
    }

    /// Assign tables for a party.
    ///
    /// With `forced_table`, that table anchors the block; it must exist, be
    /// unlocked, and be free. Without it, the first single free table that
    /// seats the party wins, else the smallest-by-order contiguous block of
    /// free tables that does. Contiguity is footprint adjacency, so a block
    /// is always a physically joined run of tables.
    #[allow(clippy::too_many_arguments)]
    pub fn assign(
        &self,
        layout: &[Table],
        day_reservations: &[Reservation],
        locks: &LockManager,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        party_size: i32,
        forced_table: Option<i64>,
        excluding: Option<uuid::Uuid>,
    ) -> Result<Vec<Table>, AssignmentError> {
        let start_dt = date.and_time(start);
        let end_dt = date.and_time(end);

        let free: Vec<&Table> = self
            .ordered(layout)
            .into_iter()
            .filter(|t| {
                !Self::is_table_occupied(t.id, day_reservations, date, start, end, excluding)
                    && !locks.is_locked(t.id, start_dt, end_dt)
            })
            .collect();

        if let Some(forced_id) = forced_table {
            let forced = layout
                .iter()
                .find(|t| t.id == forced_id)
                .ok_or(AssignmentError::TableNotFound(forced_id))?;
            // Occupancy outranks the advisory lock the occupier also holds
            if Self::is_table_occupied(forced_id, day_reservations, date, start, end, excluding) {
                tracing::debug!(table_id = forced_id, "Forced table is occupied");
                return Err(AssignmentError::InsufficientTables);
            }
            if locks.is_locked(forced_id, start_dt, end_dt) {
                return Err(AssignmentError::TableLocked(forced_id));
            }
            let block = Self::grow_block(forced, &free, party_size);
            return if Self::seats(&block) >= party_size {
                Ok(block)
            } else {
                Err(AssignmentError::InsufficientTables)
            };
        }

        if free.is_empty() {
            return Err(AssignmentError::NoTablesLeft);
        }

        // Single table first, in preference order
        if let Some(table) = free.iter().find(|t| t.max_capacity >= party_size) {
            return Ok(vec![(*table).clone()]);
        }

        // Grow a contiguous block from each free table; keep the first that
        // seats the party
        for seed in &free {
            let block = Self::grow_block(seed, &free, party_size);
            if Self::seats(&block) >= party_size {
                tracing::debug!(
                    party_size,
                    tables = ?block.iter().map(|t| t.id).collect::<Vec<_>>(),
                    "Assigned contiguous block"
                );
                return Ok(block);
            }
        }

        Err(AssignmentError::InsufficientTables)
    }

    fn seats(tables: &[Table]) -> i32 {
        tables.iter().map(|t| t.max_capacity).sum()
    }

    /// Breadth-first expansion from `seed` over adjacent free tables,
    /// stopping as soon as the block seats the party.
    fn grow_block(seed: &Table, free: &[&Table], party_size: i32) -> Vec<Table> {
        let mut block = vec![seed.clone()];
        let mut taken: HashSet<i64> = HashSet::from([seed.id]);
        let mut queue = VecDeque::from([seed.clone()]);

        while Self::seats(&block) < party_size {
            let Some(current) = queue.pop_front() else {
                break;
            };
            for candidate in free {
                if taken.contains(&candidate.id) || !current.is_adjacent(candidate) {
                    continue;
                }
                taken.insert(candidate.id);
                block.push((*candidate).clone());
                queue.push_back((*candidate).clone());
                if Self::seats(&block) >= party_size {
                    break;
                }
            }
        }
        block
    }
}
