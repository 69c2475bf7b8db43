//! Reservation model (预订)

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Table;
use crate::types::{Acceptance, ReservationKind, ReservationStatus, ServiceCategory};

/// Serialize times in the `"HH:MM"` wire form used by stored layouts and
/// outer layers.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(de)?;
        NaiveTime::parse_from_str(&s, "%H:%M").map_err(serde::de::Error::custom)
    }
}

/// A booking for a party, bound to a date, a time window, and the tables
/// serving it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub party_size: i32,
    pub date: NaiveDate,
    pub category: ServiceCategory,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub acceptance: Acceptance,
    pub status: ReservationStatus,
    pub kind: ReservationKind,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tables: Vec<Table>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    /// Whether this reservation physically occupies its tables.
    ///
    /// Canceled, deleted, no-show, to-handle, and waiting-list entries keep
    /// their table list for history but do not block the tables.
    pub fn occupies_tables(&self) -> bool {
        !matches!(
            self.status,
            ReservationStatus::Canceled
                | ReservationStatus::NoShow
                | ReservationStatus::Deleted
                | ReservationStatus::ToHandle
        ) && self.kind != ReservationKind::WaitingList
    }

    /// Whether this reservation belongs in the temporal index's active view.
    /// Excluded entries remain retrievable from the backing store.
    pub fn is_indexable(&self) -> bool {
        !matches!(
            self.status,
            ReservationStatus::Canceled | ReservationStatus::Deleted | ReservationStatus::ToHandle
        ) && self.kind != ReservationKind::WaitingList
    }

    /// Active at `time` iff `start <= time < end` (end exclusive).
    pub fn is_active_at(&self, time: NaiveTime) -> bool {
        self.start_time <= time && time < self.end_time
    }

    pub fn start_datetime(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }

    pub fn end_datetime(&self) -> NaiveDateTime {
        self.date.and_time(self.end_time)
    }

    pub fn has_table(&self, table_id: i64) -> bool {
        self.tables.iter().any(|t| t.id == table_id)
    }

    /// Assign tables, keeping the waiting-list invariant: waiting-list
    /// reservations never hold tables.
    pub fn set_tables(&mut self, tables: Vec<Table>) {
        self.tables = if self.kind == ReservationKind::WaitingList {
            if !tables.is_empty() {
                tracing::debug!(
                    reservation_id = %self.id,
                    discarded = tables.len(),
                    "Discarding table assignment for waiting-list reservation"
                );
            }
            Vec::new()
        } else {
            tables
        };
    }
}

/// Incoming reservation data from the outer layer, before table assignment.
///
/// Times arrive as `"HH:MM"` strings and are resolved through the engine's
/// time cache; a draft that fails to parse never reaches the assignment path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationDraft {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub party_size: i32,
    pub date: NaiveDate,
    pub category: ServiceCategory,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub acceptance: Acceptance,
    pub status: ReservationStatus,
    pub kind: ReservationKind,
}

impl ReservationDraft {
    /// Materialize a reservation from this draft with resolved times and an
    /// assigned table set.
    pub fn into_reservation(
        self,
        start_time: NaiveTime,
        end_time: NaiveTime,
        tables: Vec<Table>,
        now: DateTime<Utc>,
    ) -> Reservation {
        let mut reservation = Reservation {
            id: self.id,
            name: self.name,
            phone: self.phone,
            party_size: self.party_size,
            date: self.date,
            category: self.category,
            start_time,
            end_time,
            acceptance: self.acceptance,
            status: self.status,
            kind: self.kind,
            notes: self.notes,
            tables: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        reservation.set_tables(tables);
        reservation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn sample(status: ReservationStatus, kind: ReservationKind) -> Reservation {
        Reservation {
            id: Uuid::new_v4(),
            name: "Rossi".into(),
            phone: "333 1234567".into(),
            party_size: 2,
            date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            category: ServiceCategory::Dinner,
            start_time: t(19, 0),
            end_time: t(21, 0),
            acceptance: Acceptance::Confirmed,
            status,
            kind,
            notes: None,
            tables: vec![Table::new(1, "T1", 2, 1, 14)],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn end_time_is_exclusive() {
        let r = sample(ReservationStatus::Pending, ReservationKind::InAdvance);
        assert!(r.is_active_at(t(19, 0)));
        assert!(r.is_active_at(t(20, 0)));
        assert!(!r.is_active_at(t(21, 0)));
        assert!(!r.is_active_at(t(18, 59)));
    }

    #[test]
    fn canceled_reservations_release_tables() {
        assert!(!sample(ReservationStatus::Canceled, ReservationKind::InAdvance).occupies_tables());
        assert!(!sample(ReservationStatus::NoShow, ReservationKind::InAdvance).occupies_tables());
        assert!(sample(ReservationStatus::Pending, ReservationKind::InAdvance).occupies_tables());
        // No-show still shows in the index even though the table is free
        assert!(sample(ReservationStatus::NoShow, ReservationKind::InAdvance).is_indexable());
        assert!(!sample(ReservationStatus::ToHandle, ReservationKind::InAdvance).is_indexable());
    }

    #[test]
    fn waiting_list_never_holds_tables() {
        let mut r = sample(ReservationStatus::Pending, ReservationKind::WaitingList);
        r.set_tables(vec![Table::new(2, "T2", 2, 1, 10)]);
        assert!(r.tables.is_empty());
        assert!(!r.is_indexable());
    }

    #[test]
    fn round_trips_hhmm_times() {
        let r = sample(ReservationStatus::Pending, ReservationKind::InAdvance);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["start_time"], "19:00");
        let back: Reservation = serde_json::from_value(json).unwrap();
        assert_eq!(back.start_time, r.start_time);
    }
}
