//! Reservation cache
//!
//! Two-tier in-memory index over reservations: a per-day list, and under it
//! a minute-of-day map so "who is seated right now" is a single lookup. The
//! cache holds a sliding window of days around a focal date; refocusing the
//! window evicts both tiers for days that fall outside it.
//!
//! The minute tier is always rebuilt wholesale from the day list after a
//! mutation. Day lists are small, and a full rebuild cannot drift from the
//! source of truth the way incremental patching can.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use parking_lot::RwLock;
use shared::models::Reservation;
use shared::types::{
    Acceptance, ReservationStatus, ServiceCategory, LATE_THRESHOLD_MIN, NEARING_END_THRESHOLD_MIN,
};
use uuid::Uuid;

#[derive(Default)]
pub struct ReservationCache {
    days: RwLock<HashMap<NaiveDate, Vec<Reservation>>>,
    by_minute: RwLock<HashMap<NaiveDate, HashMap<u32, Vec<Reservation>>>>,
}

fn minute_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

impl ReservationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Days currently held.
    pub fn cached_days(&self) -> Vec<NaiveDate> {
        let mut days: Vec<NaiveDate> = self.days.read().keys().copied().collect();
        days.sort();
        days
    }

    /// Reservations for a day, unordered.
    pub fn day(&self, date: NaiveDate) -> Vec<Reservation> {
        self.days.read().get(&date).cloned().unwrap_or_default()
    }

    /// Focus the cache on `around ± range` days, filling the window from
    /// `all` and evicting everything outside it. The window always holds
    /// exactly `2 * range + 1` day entries, empty days included.
    pub fn preload(&self, around: NaiveDate, range: i64, all: &[Reservation]) {
        let first = around - Duration::days(range);
        let last = around + Duration::days(range);

        let mut days = self.days.write();
        let mut minutes = self.by_minute.write();
        days.retain(|d, _| *d >= first && *d <= last);
        minutes.retain(|d, _| *d >= first && *d <= last);

        for offset in -range..=range {
            let date = around + Duration::days(offset);
            let for_day: Vec<Reservation> = all
                .iter()
                .filter(|r| r.date == date && r.is_indexable())
                .cloned()
                .collect();
            minutes.insert(date, Self::build_minute_index(&for_day));
            days.insert(date, for_day);
        }
        tracing::debug!(around = %around, range, days = days.len(), "Reservation window preloaded");
    }

    fn build_minute_index(for_day: &[Reservation]) -> HashMap<u32, Vec<Reservation>> {
        let mut index: HashMap<u32, Vec<Reservation>> = HashMap::new();
        for res in for_day {
            for minute in minute_of_day(res.start_time)..minute_of_day(res.end_time) {
                index.entry(minute).or_default().push(res.clone());
            }
        }
        index
    }

    fn rebuild_day(&self, date: NaiveDate) {
        let for_day = self.day(date);
        self.by_minute
            .write()
            .insert(date, Self::build_minute_index(&for_day));
    }

    /// Insert or replace a reservation in the cache.
    ///
    /// Non-indexable reservations are removed instead: a cancellation must
    /// evict the stale entry it replaces, not sit beside it.
    pub fn add_or_update(&self, reservation: Reservation) {
        if !reservation.is_indexable() {
            tracing::debug!(
                reservation_id = %reservation.id,
                status = ?reservation.status,
                "Dropping non-indexable reservation from cache"
            );
            self.remove(reservation.id, reservation.date);
            return;
        }

        {
            let mut days = self.days.write();
            let for_day = days.entry(reservation.date).or_default();
            match for_day.iter_mut().find(|r| r.id == reservation.id) {
                Some(slot) => *slot = reservation.clone(),
                None => for_day.push(reservation.clone()),
            }
        }
        self.rebuild_day(reservation.date);
    }

    pub fn remove(&self, id: Uuid, date: NaiveDate) {
        let removed = {
            let mut days = self.days.write();
            match days.get_mut(&date) {
                Some(for_day) => {
                    let before = for_day.len();
                    for_day.retain(|r| r.id != id);
                    for_day.len() != before
                }
                None => false,
            }
        };
        if removed {
            self.rebuild_day(date);
        }
    }

    pub fn clear_day(&self, date: NaiveDate) {
        self.days.write().remove(&date);
        self.by_minute.write().remove(&date);
    }

    pub fn clear_all(&self) {
        self.days.write().clear();
        self.by_minute.write().clear();
    }

    /// Reservations active at a given minute. One hash lookup.
    pub fn active_reservations(&self, date: NaiveDate, time: NaiveTime) -> Vec<Reservation> {
        self.by_minute
            .read()
            .get(&date)
            .and_then(|index| index.get(&minute_of_day(time)))
            .cloned()
            .unwrap_or_default()
    }

    /// The reservation seated at a table at a given minute, if any.
    pub fn reservation_at(
        &self,
        table_id: i64,
        date: NaiveDate,
        time: NaiveTime,
        category: ServiceCategory,
    ) -> Option<Reservation> {
        self.active_reservations(date, time)
            .into_iter()
            .find(|r| r.category == category && r.occupies_tables() && r.has_table(table_id))
    }

    /// Earliest confirmed reservation for a table starting strictly after
    /// `time`, still inside the category's service window.
    pub fn first_upcoming(
        &self,
        table_id: i64,
        date: NaiveDate,
        time: NaiveTime,
        category: ServiceCategory,
    ) -> Option<Reservation> {
        let (window_start, window_end) = category.window()?;
        self.day(date)
            .into_iter()
            .filter(|r| {
                r.category == category
                    && r.acceptance == Acceptance::Confirmed
                    && r.has_table(table_id)
                    && r.start_time > time
                    && r.start_time >= window_start
                    && r.start_time < window_end
            })
            .min_by_key(|r| r.start_time)
    }

    /// Reservations whose grace period after start has elapsed without the
    /// party being seated.
    pub fn late(&self, now: NaiveDateTime) -> Vec<Reservation> {
        let threshold = Duration::minutes(LATE_THRESHOLD_MIN);
        self.day(now.date())
            .into_iter()
            .filter(|r| {
                r.status != ReservationStatus::ShowedUp
                    && r.start_datetime() + threshold <= now
                    && now < r.end_datetime()
            })
            .collect()
    }

    /// Reservations within the closing margin of their end time.
    pub fn nearing_end(&self, now: NaiveDateTime) -> Vec<Reservation> {
        let margin = Duration::minutes(NEARING_END_THRESHOLD_MIN);
        self.day(now.date())
            .into_iter()
            .filter(|r| r.end_datetime() - margin <= now && now < r.end_datetime())
            .collect()
    }

    /// Consistency sweep: purge entries that are no longer indexable (status
    /// flips applied by bulk population paths can leave them behind).
    /// Returns the number of entries removed.
    pub fn validate(&self) -> usize {
        let mut purged = 0;
        let mut dirty_days = Vec::new();
        {
            let mut days = self.days.write();
            for (date, for_day) in days.iter_mut() {
                let before = for_day.len();
                for_day.retain(|r| r.is_indexable());
                if for_day.len() != before {
                    purged += before - for_day.len();
                    dirty_days.push(*date);
                }
            }
        }
        for date in dirty_days {
            self.rebuild_day(date);
        }
        if purged > 0 {
            tracing::warn!(purged, "Removed stale non-indexable cache entries");
        }
        purged
    }
}
