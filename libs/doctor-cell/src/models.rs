use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

/// `doctor_id` is the doctor's user id; it is resolved to the doctor record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateAvailabilityRequest {
    pub doctor_id: Option<String>,
    pub day_of_week: Option<i64>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAvailabilityRequest {
    pub day_of_week: Option<i64>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedAvailability {
    pub message: String,
    pub id: Uuid,
}

// ==============================================================================
// AVAILABILITY CHECK
// ==============================================================================

/// Outcome of checking a candidate window against a doctor's weekly windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AvailabilityCheck {
    Available,
    NoWindowsForDay { day_of_week: u8 },
    OutsideWindows { day_of_week: u8 },
    SpansMidnight,
}

impl AvailabilityCheck {
    pub fn is_available(&self) -> bool {
        matches!(self, AvailabilityCheck::Available)
    }

    pub fn describe(&self) -> String {
        match self {
            AvailabilityCheck::Available => "Doctor is available".to_string(),
            AvailabilityCheck::NoWindowsForDay { day_of_week } => {
                format!("Doctor has no availability on day {}", day_of_week)
            }
            AvailabilityCheck::OutsideWindows { day_of_week } => {
                format!("Requested time is outside the doctor's availability on day {}", day_of_week)
            }
            AvailabilityCheck::SpansMidnight => {
                "Requested time must start and end on the same day".to_string()
            }
        }
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Doctor not found for this user")]
    NotFoundForUser,

    #[error("Availability not found")]
    AvailabilityNotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<StoreError> for DoctorError {
    fn from(e: StoreError) -> Self {
        DoctorError::DatabaseError(e.to_string())
    }
}
