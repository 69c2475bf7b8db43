//! Common enums and constants for the reservation domain

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Minutes after the start time before a reservation counts as late.
pub const LATE_THRESHOLD_MIN: i64 = 15;

/// Minutes before the end time at which a reservation is "nearing end".
pub const NEARING_END_THRESHOLD_MIN: i64 = 30;

/// Meal-service window (服务时段)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCategory {
    Lunch,
    Dinner,
    /// Outside any bookable service window
    NoBookingZone,
}

impl ServiceCategory {
    /// Fixed clock boundaries of the service window, if any.
    ///
    /// Lunch runs 12:00-15:00, dinner 18:00-23:45. `NoBookingZone` has no
    /// window and never admits upcoming-reservation queries.
    pub fn window(&self) -> Option<(NaiveTime, NaiveTime)> {
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).expect("valid clock time");
        match self {
            ServiceCategory::Lunch => Some((t(12, 0), t(15, 0))),
            ServiceCategory::Dinner => Some((t(18, 0), t(23, 45))),
            ServiceCategory::NoBookingZone => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceCategory::Lunch => "lunch",
            ServiceCategory::Dinner => "dinner",
            ServiceCategory::NoBookingZone => "no_booking_zone",
        }
    }
}

impl std::fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Booking lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    ShowedUp,
    Late,
    NoShow,
    Canceled,
    Deleted,
    ToHandle,
    Na,
}

/// Whether the booking has been confirmed by staff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Acceptance {
    Confirmed,
    ToConfirm,
    Na,
}

/// How the booking entered the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationKind {
    InAdvance,
    WalkIn,
    WaitingList,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_windows() {
        let (start, end) = ServiceCategory::Lunch.window().unwrap();
        assert_eq!(start, NaiveTime::from_hms_opt(12, 0, 0).unwrap());
        assert_eq!(end, NaiveTime::from_hms_opt(15, 0, 0).unwrap());

        let (start, end) = ServiceCategory::Dinner.window().unwrap();
        assert_eq!(start, NaiveTime::from_hms_opt(18, 0, 0).unwrap());
        assert_eq!(end, NaiveTime::from_hms_opt(23, 45, 0).unwrap());

        assert!(ServiceCategory::NoBookingZone.window().is_none());
    }
}
