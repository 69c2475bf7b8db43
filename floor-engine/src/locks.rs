//! Advisory table locks
//!
//! Time-ranged, process-local, cooperative: a lock makes a table unavailable
//! to new assignments whose window intersects the lock window, but never
//! evicts an assignment that already exists. Locks are taken when an edit
//! session starts holding tables and released when it concludes or the
//! reservation's window changes. Nothing here survives a restart.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use parking_lot::RwLock;

#[derive(Debug, Default)]
pub struct LockManager {
    intervals: RwLock<HashMap<i64, Vec<(NaiveDateTime, NaiveDateTime)>>>,
}

impl LockManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self, table_id: i64, start: NaiveDateTime, end: NaiveDateTime) {
        let mut intervals = self.intervals.write();
        intervals.entry(table_id).or_default().push((start, end));
        tracing::debug!(table_id, %start, %end, "Table locked");
    }

    /// Remove the lock matching the exact interval, if held.
    pub fn unlock(&self, table_id: i64, start: NaiveDateTime, end: NaiveDateTime) {
        let mut intervals = self.intervals.write();
        if let Some(held) = intervals.get_mut(&table_id) {
            held.retain(|(s, e)| !(*s == start && *e == end));
            if held.is_empty() {
                intervals.remove(&table_id);
            }
        }
    }

    pub fn unlock_all(&self) {
        self.intervals.write().clear();
    }

    /// Whether any held lock on the table overlaps `[start, end)`.
    pub fn is_locked(&self, table_id: i64, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        let intervals = self.intervals.read();
        intervals
            .get(&table_id)
            .is_some_and(|held| held.iter().any(|(s, e)| start < *e && *s < end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn overlapping_window_is_locked() {
        let locks = LockManager::new();
        locks.lock(1, dt(19, 0), dt(21, 0));

        assert!(locks.is_locked(1, dt(20, 0), dt(22, 0)));
        assert!(locks.is_locked(1, dt(18, 0), dt(19, 30)));
        // Half-open: a window starting exactly at the lock's end is free
        assert!(!locks.is_locked(1, dt(21, 0), dt(23, 0)));
        assert!(!locks.is_locked(2, dt(19, 0), dt(21, 0)));
    }

    #[test]
    fn unlock_removes_exact_interval_only() {
        let locks = LockManager::new();
        locks.lock(1, dt(12, 0), dt(14, 0));
        locks.lock(1, dt(19, 0), dt(21, 0));

        locks.unlock(1, dt(12, 0), dt(14, 0));
        assert!(!locks.is_locked(1, dt(12, 0), dt(14, 0)));
        assert!(locks.is_locked(1, dt(19, 0), dt(21, 0)));

        locks.unlock_all();
        assert!(!locks.is_locked(1, dt(19, 0), dt(21, 0)));
    }
}
