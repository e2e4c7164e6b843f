use serde::{Deserialize, Serialize};
use thiserror::Error;

use doctor_cell::models::DoctorError;
use shared_database::StoreError;
use shared_models::scheduling::{Appointment, AppointmentStatus};

/// Length of an appointment booked without an explicit end.
pub const DEFAULT_APPOINTMENT_MINUTES: i64 = 30;

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Booking payload. `doctor_id` is the doctor record id; timestamps are
/// ISO-8601 and `end_datetime` defaults to thirty minutes after the start.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: Option<String>,
    pub patient_id: Option<String>,
    pub start_datetime: Option<String>,
    pub end_datetime: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

// ==============================================================================
// CONFLICT DETECTION
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictCheckResponse {
    pub has_conflict: bool,
    pub conflicting_appointments: Vec<Appointment>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Doctor not found for this user")]
    DoctorNotFoundForUser,

    #[error("Invalid appointment time: {0}")]
    InvalidTime(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Cannot change appointment status from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Appointment status changed concurrently, retry the request")]
    StatusChanged,

    #[error("Appointment conflicts with existing booking")]
    ConflictDetected,

    #[error("Doctor not available at requested time: {0}")]
    DoctorNotAvailable(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<StoreError> for AppointmentError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(_) => AppointmentError::ConflictDetected,
            other => AppointmentError::DatabaseError(other.to_string()),
        }
    }
}

impl From<DoctorError> for AppointmentError {
    fn from(e: DoctorError) -> Self {
        match e {
            DoctorError::NotFound => AppointmentError::DoctorNotFound,
            DoctorError::NotFoundForUser => AppointmentError::DoctorNotFoundForUser,
            DoctorError::ValidationError(msg) => AppointmentError::ValidationError(msg),
            DoctorError::AvailabilityNotFound | DoctorError::DatabaseError(_) => {
                AppointmentError::DatabaseError(e.to_string())
            }
        }
    }
}
