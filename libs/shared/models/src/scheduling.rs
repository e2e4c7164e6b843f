use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::time::hms;

// ==============================================================================
// DOCTORS & USERS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Doctor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub specialty: Option<String>,
    pub clinic_name: Option<String>,
    pub phone: Option<String>,
}

/// Display profile owned by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
}

// ==============================================================================
// AVAILABILITY
// ==============================================================================

/// Recurring weekly window during which a doctor accepts appointments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailabilityWindow {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub day_of_week: u8, // 0 = Sunday, 1 = Monday, etc.
    #[serde(with = "hms")]
    pub start_time: NaiveTime,
    #[serde(with = "hms")]
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAvailability {
    pub doctor_id: Uuid,
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AvailabilityChanges {
    pub day_of_week: Option<u8>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

impl AvailabilityChanges {
    pub fn is_empty(&self) -> bool {
        self.day_of_week.is_none() && self.start_time.is_none() && self.end_time.is_none()
    }

    /// The window as it would look after applying these changes.
    pub fn apply_to(&self, window: &AvailabilityWindow) -> AvailabilityWindow {
        AvailabilityWindow {
            id: window.id,
            doctor_id: window.doctor_id,
            day_of_week: self.day_of_week.unwrap_or(window.day_of_week),
            start_time: self.start_time.unwrap_or(window.start_time),
            end_time: self.end_time.unwrap_or(window.end_time),
        }
    }
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        intervals_overlap(self.start_datetime, self.end_datetime, start, end)
    }
}

/// Half-open intervals `[s1, e1)` and `[s2, e2)` intersect. Touching
/// endpoints do not count, so back-to-back bookings are allowed.
pub fn intervals_overlap(
    start1: DateTime<Utc>,
    end1: DateTime<Utc>,
    start2: DateTime<Utc>,
    end2: DateTime<Utc>,
) -> bool {
    start1 < end2 && start2 < end1
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Canceled,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 4] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Completed,
        AppointmentStatus::Canceled,
    ];

    /// Active appointments occupy the doctor's calendar.
    pub fn is_active(self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
#[error("unknown appointment status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for AppointmentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AppointmentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Row to insert; the store always creates it as `pending`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAppointment {
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
}

// ==============================================================================
// LISTING VIEWS
// ==============================================================================

/// Appointment as seen by the patient, with the doctor's display info.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientAppointment {
    pub id: Uuid,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub doctor_id: Uuid,
    pub doctor_name: Option<String>,
    pub specialty: Option<String>,
}

/// Appointment as seen by the doctor, with the patient's name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorAppointment {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub patient_id: Uuid,
    pub patient_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 6, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_back_to_back_intervals_do_not_overlap() {
        assert!(!intervals_overlap(at(9, 0), at(9, 30), at(9, 30), at(10, 0)));
        assert!(!intervals_overlap(at(9, 30), at(10, 0), at(9, 0), at(9, 30)));
    }

    #[test]
    fn test_intersecting_intervals_overlap() {
        assert!(intervals_overlap(at(9, 0), at(9, 30), at(9, 15), at(9, 45)));
        assert!(intervals_overlap(at(9, 0), at(10, 0), at(9, 15), at(9, 30)));
        assert!(intervals_overlap(at(9, 0), at(9, 30), at(9, 0), at(9, 30)));
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("pending".parse::<AppointmentStatus>(), Ok(AppointmentStatus::Pending));
        assert_eq!("canceled".parse::<AppointmentStatus>(), Ok(AppointmentStatus::Canceled));
        assert_eq!(
            "cancelled".parse::<AppointmentStatus>(),
            Err(UnknownStatus("cancelled".to_string()))
        );
        assert!("Pending".parse::<AppointmentStatus>().is_err());
    }

    #[test]
    fn test_active_statuses() {
        let active: Vec<_> = AppointmentStatus::ALL
            .into_iter()
            .filter(|status| status.is_active())
            .collect();
        assert_eq!(active, vec![AppointmentStatus::Pending, AppointmentStatus::Confirmed]);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_value(AppointmentStatus::Confirmed).unwrap();
        assert_eq!(json, serde_json::json!("confirmed"));
    }

    #[test]
    fn test_availability_window_serializes_hms() {
        let window = AvailabilityWindow {
            id: Uuid::nil(),
            doctor_id: Uuid::nil(),
            day_of_week: 1,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        };
        let json = serde_json::to_value(&window).unwrap();
        assert_eq!(json["start_time"], "09:00:00");
        assert_eq!(json["end_time"], "17:00:00");

        let back: AvailabilityWindow = serde_json::from_value(json).unwrap();
        assert_eq!(back, window);
    }

    #[test]
    fn test_availability_changes_merge() {
        let window = AvailabilityWindow {
            id: Uuid::nil(),
            doctor_id: Uuid::nil(),
            day_of_week: 1,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        };
        let changes = AvailabilityChanges {
            end_time: NaiveTime::from_hms_opt(12, 0, 0),
            ..Default::default()
        };
        assert!(!changes.is_empty());

        let merged = changes.apply_to(&window);
        assert_eq!(merged.day_of_week, 1);
        assert_eq!(merged.start_time, window.start_time);
        assert_eq!(merged.end_time, NaiveTime::from_hms_opt(12, 0, 0).unwrap());
        assert!(AvailabilityChanges::default().is_empty());
    }
}
