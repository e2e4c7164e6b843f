use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use shared_models::scheduling::{
    Appointment, AppointmentStatus, AvailabilityChanges, AvailabilityWindow, Doctor,
    DoctorAppointment, NewAppointment, NewAvailability, PatientAppointment,
};

#[derive(Error, Debug)]
pub enum StoreError {
    /// A write was rejected by a uniqueness/exclusion constraint or a failed
    /// status precondition.
    #[error("write rejected: {0}")]
    Conflict(String),

    #[error("store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("store returned {status}: {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("failed to decode store response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("store misconfigured: {0}")]
    Configuration(String),
}

/// Storage operations the scheduling engine needs.
///
/// Implementations own the check-then-insert guarantee of
/// [`SchedulingStore::insert_appointment`]: an insert whose window intersects
/// an active appointment of the same doctor must fail with
/// [`StoreError::Conflict`], even when two inserts race.
#[async_trait]
pub trait SchedulingStore: Send + Sync {
    async fn list_doctors(&self) -> Result<Vec<Doctor>, StoreError>;

    async fn find_doctor(&self, doctor_id: Uuid) -> Result<Option<Doctor>, StoreError>;

    async fn find_doctor_by_user_id(&self, user_id: Uuid) -> Result<Option<Doctor>, StoreError>;

    /// Windows ordered by day of week, then start time.
    async fn availability_windows(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<AvailabilityWindow>, StoreError>;

    async fn find_availability(
        &self,
        availability_id: Uuid,
    ) -> Result<Option<AvailabilityWindow>, StoreError>;

    async fn insert_availability(
        &self,
        availability: NewAvailability,
    ) -> Result<AvailabilityWindow, StoreError>;

    async fn update_availability(
        &self,
        availability_id: Uuid,
        changes: AvailabilityChanges,
    ) -> Result<Option<AvailabilityWindow>, StoreError>;

    async fn delete_availability(
        &self,
        availability_id: Uuid,
    ) -> Result<Option<AvailabilityWindow>, StoreError>;

    /// Pending or confirmed appointments of the doctor intersecting `[start, end)`.
    async fn find_active_appointments_overlapping(
        &self,
        doctor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, StoreError>;

    /// Insert a `pending` appointment.
    async fn insert_appointment(
        &self,
        appointment: NewAppointment,
    ) -> Result<Appointment, StoreError>;

    async fn find_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Option<Appointment>, StoreError>;

    /// Set the status. With `expected`, only applies while the stored status
    /// still equals it and fails with [`StoreError::Conflict`] otherwise.
    /// `Ok(None)` means the appointment does not exist.
    async fn update_appointment_status(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
        expected: Option<AppointmentStatus>,
    ) -> Result<Option<Appointment>, StoreError>;

    /// Appointments of a patient in creation order, with doctor display info.
    async fn appointments_for_patient(
        &self,
        patient_id: Uuid,
    ) -> Result<Vec<PatientAppointment>, StoreError>;

    /// Appointments of a doctor in creation order, with patient names.
    async fn appointments_for_doctor(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<DoctorAppointment>, StoreError>;
}
