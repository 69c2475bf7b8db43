//! Time parsing and layout fingerprint helpers

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};

use crate::models::Table;
use crate::types::ServiceCategory;

/// Parse a wall-clock time in `"HH:MM"` form.
pub fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").ok()
}

/// Half-open interval overlap: `[start1, end1)` intersects `[start2, end2)`.
pub fn time_ranges_overlap(
    start1: NaiveTime,
    end1: NaiveTime,
    start2: NaiveTime,
    end2: NaiveTime,
) -> bool {
    start1 < end2 && start2 < end1
}

/// Cache key for per-(day, category) layouts and cluster sets:
/// `"<ISO-date>-<category>"`, e.g. `2026-03-14-dinner`.
pub fn layout_key(date: NaiveDate, category: ServiceCategory) -> String {
    format!("{}-{}", date.format("%Y-%m-%d"), category)
}

/// Fingerprint over all table positions.
///
/// SHA-256 of `id:row:col` triples sorted by table id, hex encoded. Two
/// layouts share a signature iff every table sits on the same cell, which is
/// exactly the condition under which cached clusters stay valid.
pub fn layout_signature(tables: &[Table]) -> String {
    let mut sorted: Vec<&Table> = tables.iter().collect();
    sorted.sort_by_key(|t| t.id);

    let mut hasher = Sha256::new();
    for table in sorted {
        hasher.update(format!("{}:{}:{};", table.id, table.row, table.column));
    }
    hex::encode(hasher.finalize())
}

/// Memoization cache for parsed `(start, end)` time pairs.
///
/// Time strings arrive from the outer layers on every draft and on every
/// decode, and the same handful of windows repeats all day. Readers proceed
/// in parallel; a miss takes the write lock once to fill the entry.
#[derive(Debug, Default)]
pub struct TimeCache {
    cache: RwLock<HashMap<String, (NaiveTime, NaiveTime)>>,
}

impl TimeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `("HH:MM", "HH:MM")` window, memoized.
    pub fn parse_window(&self, start: &str, end: &str) -> Option<(NaiveTime, NaiveTime)> {
        let key = format!("{start}-{end}");
        if let Some(hit) = self.cache.read().get(&key) {
            return Some(*hit);
        }
        let parsed = (parse_time(start)?, parse_time(end)?);
        self.cache.write().insert(key, parsed);
        Some(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn parses_clock_times() {
        assert_eq!(parse_time("19:30"), Some(t(19, 30)));
        assert_eq!(parse_time(" 08:05 "), Some(t(8, 5)));
        assert_eq!(parse_time("25:00"), None);
        assert_eq!(parse_time("lunch"), None);
    }

    #[test]
    fn overlap_is_half_open() {
        // Touching intervals do not overlap
        assert!(!time_ranges_overlap(t(12, 0), t(14, 0), t(14, 0), t(15, 0)));
        assert!(time_ranges_overlap(t(12, 0), t(14, 1), t(14, 0), t(15, 0)));
        assert!(time_ranges_overlap(t(12, 0), t(15, 0), t(13, 0), t(14, 0)));
    }

    #[test]
    fn signature_tracks_positions_only() {
        let a = Table::new(1, "T1", 2, 1, 1);
        let b = Table::new(2, "T2", 2, 1, 4);
        let sig = layout_signature(&[a.clone(), b.clone()]);

        // Order of the slice does not matter
        assert_eq!(sig, layout_signature(&[b.clone(), a.clone()]));

        // A moved table changes the fingerprint
        let mut moved = a.clone();
        moved.row = 5;
        assert_ne!(sig, layout_signature(&[moved, b]));
    }

    #[test]
    fn time_cache_memoizes() {
        let cache = TimeCache::new();
        assert_eq!(
            cache.parse_window("19:00", "21:00"),
            Some((t(19, 0), t(21, 0)))
        );
        // Second lookup hits the memoized entry
        assert_eq!(
            cache.parse_window("19:00", "21:00"),
            Some((t(19, 0), t(21, 0)))
        );
        assert_eq!(cache.parse_window("19:00", "bad"), None);
    }
}
