use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::services::{AvailabilityValidator, DoctorService};
use shared_database::{SchedulingStore, StoreError};
use shared_models::scheduling::{
    Appointment, DoctorAppointment, NewAppointment, PatientAppointment,
};
use shared_models::time::parse_timestamp;
use shared_models::validation::{parse_id, required};
use shared_utils::AppState;

use crate::models::{
    AppointmentError, BookAppointmentRequest, UpdateStatusRequest, DEFAULT_APPOINTMENT_MINUTES,
};
use crate::services::conflict::ConflictDetectionService;
use crate::services::lifecycle::{AppointmentLifecycleService, TransitionPolicy};

pub struct AppointmentBookingService {
    store: Arc<dyn SchedulingStore>,
    conflict_service: ConflictDetectionService,
    lifecycle_service: AppointmentLifecycleService,
    availability_validator: AvailabilityValidator,
    doctor_service: DoctorService,
    enforce_availability: bool,
}

/// A validated booking request.
#[derive(Debug, Clone, Copy, PartialEq)]
struct BookingSlot {
    doctor_id: Uuid,
    patient_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl AppointmentBookingService {
    pub fn new(state: &AppState) -> Self {
        let store = Arc::clone(&state.store);

        Self {
            conflict_service: ConflictDetectionService::new(Arc::clone(&store)),
            lifecycle_service: AppointmentLifecycleService::new(TransitionPolicy::from_config(&state.config)),
            availability_validator: AvailabilityValidator::new(Arc::clone(&store)),
            doctor_service: DoctorService::new(Arc::clone(&store)),
            enforce_availability: state.config.enforce_availability,
            store,
        }
    }

    /// Book a new appointment in `pending` status.
    ///
    /// Checks run in a fixed order and the first failure wins: required
    /// fields, start time, end time, doctor existence, declared availability
    /// (when enforced), then overlap with the doctor's active appointments.
    /// Nothing is written unless every check passes.
    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let slot = validate_booking_request(&request)?;

        debug!(
            "Booking appointment for patient {} with doctor {} from {} to {}",
            slot.patient_id, slot.doctor_id, slot.start, slot.end
        );

        self.doctor_service.get_doctor(slot.doctor_id).await?;

        if self.enforce_availability {
            let check = self
                .availability_validator
                .check_window(slot.doctor_id, slot.start, slot.end)
                .await?;

            if !check.is_available() {
                warn!("Booking rejected for doctor {}: {}", slot.doctor_id, check.describe());
                return Err(AppointmentError::DoctorNotAvailable(check.describe()));
            }
        }

        let conflicts = self
            .conflict_service
            .check_conflicts(slot.doctor_id, slot.start, slot.end)
            .await?;

        if conflicts.has_conflict {
            return Err(AppointmentError::ConflictDetected);
        }

        // The store rejects the insert if a concurrent booking won the slot
        let appointment = self
            .store
            .insert_appointment(NewAppointment {
                doctor_id: slot.doctor_id,
                patient_id: slot.patient_id,
                start_datetime: slot.start,
                end_datetime: slot.end,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(reason) => {
                    warn!("Booking for doctor {} lost the slot: {}", slot.doctor_id, reason);
                    AppointmentError::ConflictDetected
                }
                other => AppointmentError::from(other),
            })?;

        info!(
            "Appointment {} booked for patient {} with doctor {}",
            appointment.id, appointment.patient_id, appointment.doctor_id
        );
        Ok(appointment)
    }

    /// Move an appointment to a new status.
    pub async fn update_status(
        &self,
        appointment_id: Uuid,
        request: UpdateStatusRequest,
    ) -> Result<Appointment, AppointmentError> {
        let status = required("status", request.status.as_deref())
            .map_err(AppointmentError::ValidationError)?;
        let new_status = self.lifecycle_service.parse_status(status)?;

        debug!("Updating appointment {} to {}", appointment_id, new_status);

        let current = self
            .store
            .find_appointment(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        self.lifecycle_service
            .validate_status_transition(current.status, new_status)?;

        // Under the strict policy the write only lands if nobody changed the
        // status since it was checked
        let expected = match self.lifecycle_service.policy() {
            TransitionPolicy::Strict => Some(current.status),
            TransitionPolicy::Permissive => None,
        };

        let updated = self
            .store
            .update_appointment_status(appointment_id, new_status, expected)
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) if expected.is_some() => AppointmentError::StatusChanged,
                StoreError::Conflict(_) => {
                    warn!("Reactivating appointment {} would double-book its slot", appointment_id);
                    AppointmentError::ConflictDetected
                }
                other => AppointmentError::from(other),
            })?
            .ok_or(AppointmentError::NotFound)?;

        info!(
            "Appointment {} status changed from {} to {}",
            appointment_id, current.status, updated.status
        );
        Ok(updated)
    }

    pub async fn get_patient_appointments(
        &self,
        patient_id: Uuid,
    ) -> Result<Vec<PatientAppointment>, AppointmentError> {
        debug!("Fetching appointments for patient: {}", patient_id);
        Ok(self.store.appointments_for_patient(patient_id).await?)
    }

    /// Appointments of the doctor owned by `doctor_user_id`.
    pub async fn get_doctor_appointments(
        &self,
        doctor_user_id: Uuid,
    ) -> Result<Vec<DoctorAppointment>, AppointmentError> {
        let doctor = self.doctor_service.resolve_user(doctor_user_id).await?;

        debug!("Fetching appointments for doctor: {}", doctor.id);
        Ok(self.store.appointments_for_doctor(doctor.id).await?)
    }
}

fn validate_booking_request(request: &BookAppointmentRequest) -> Result<BookingSlot, AppointmentError> {
    let doctor_id = required("doctor_id", request.doctor_id.as_deref());
    let patient_id = required("patient_id", request.patient_id.as_deref());
    let start = required("start_datetime", request.start_datetime.as_deref());

    let (doctor_id, patient_id, start) = match (doctor_id, patient_id, start) {
        (Ok(d), Ok(p), Ok(s)) => (d, p, s),
        _ => {
            return Err(AppointmentError::ValidationError(
                "doctor_id, patient_id and start_datetime are required".to_string(),
            ))
        }
    };

    let doctor_id = parse_id("doctor_id", doctor_id).map_err(AppointmentError::ValidationError)?;
    let patient_id = parse_id("patient_id", patient_id).map_err(AppointmentError::ValidationError)?;

    let start = parse_timestamp(start)
        .ok_or_else(|| AppointmentError::InvalidTime("Invalid start_datetime".to_string()))?;

    let end = match request.end_datetime.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => parse_timestamp(value)
            .ok_or_else(|| AppointmentError::InvalidTime("Invalid end_datetime".to_string()))?,
        _ => start
            .checked_add_signed(Duration::minutes(DEFAULT_APPOINTMENT_MINUTES))
            .ok_or_else(|| AppointmentError::InvalidTime("end_datetime is out of range".to_string()))?,
    };

    if end <= start {
        return Err(AppointmentError::InvalidTime(
            "end_datetime must be after start_datetime".to_string(),
        ));
    }

    Ok(BookingSlot {
        doctor_id,
        patient_id,
        start,
        end,
    })
}
