use std::sync::Arc;

use chrono::NaiveTime;
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::SchedulingStore;
use shared_models::scheduling::{AvailabilityChanges, AvailabilityWindow, NewAvailability};
use shared_models::time::{parse_time_of_day, DAYS_PER_WEEK};
use shared_models::validation::{parse_id, required};

use crate::models::{CreateAvailabilityRequest, DoctorError, UpdateAvailabilityRequest};
use crate::services::doctor::DoctorService;

pub struct AvailabilityService {
    store: Arc<dyn SchedulingStore>,
    doctors: DoctorService,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn SchedulingStore>) -> Self {
        Self {
            doctors: DoctorService::new(store.clone()),
            store,
        }
    }

    /// Windows of the doctor owned by `user_id`.
    pub async fn get_for_doctor_user(&self, user_id: Uuid) -> Result<Vec<AvailabilityWindow>, DoctorError> {
        let doctor = self.doctors.resolve_user(user_id).await?;
        Ok(self.store.availability_windows(doctor.id).await?)
    }

    /// Windows by doctor record id. An unknown doctor simply has none.
    pub async fn get_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<AvailabilityWindow>, DoctorError> {
        debug!("Fetching availability for doctor: {}", doctor_id);
        Ok(self.store.availability_windows(doctor_id).await?)
    }

    pub async fn create_availability(
        &self,
        request: CreateAvailabilityRequest,
    ) -> Result<AvailabilityWindow, DoctorError> {
        let user_id = required("doctor_id", request.doctor_id.as_deref())
            .and_then(|v| parse_id("doctor_id", v))
            .map_err(DoctorError::ValidationError)?;

        let day_of_week = match request.day_of_week {
            Some(day) => parse_day(day)?,
            None => return Err(DoctorError::ValidationError("day_of_week is required".to_string())),
        };
        let start_time = parse_required_time("start_time", request.start_time.as_deref())?;
        let end_time = parse_required_time("end_time", request.end_time.as_deref())?;
        validate_range(start_time, end_time)?;

        let doctor = self.doctors.resolve_user(user_id).await?;
        debug!("Creating availability for doctor {} on day {}", doctor.id, day_of_week);

        let window = self
            .store
            .insert_availability(NewAvailability {
                doctor_id: doctor.id,
                day_of_week,
                start_time,
                end_time,
            })
            .await?;

        info!("Availability {} created for doctor {}", window.id, doctor.id);
        Ok(window)
    }

    pub async fn update_availability(
        &self,
        availability_id: Uuid,
        request: UpdateAvailabilityRequest,
    ) -> Result<AvailabilityWindow, DoctorError> {
        debug!("Updating availability: {}", availability_id);

        let changes = AvailabilityChanges {
            day_of_week: request.day_of_week.map(parse_day).transpose()?,
            start_time: request
                .start_time
                .as_deref()
                .map(|v| parse_time("start_time", v))
                .transpose()?,
            end_time: request
                .end_time
                .as_deref()
                .map(|v| parse_time("end_time", v))
                .transpose()?,
        };

        if changes.is_empty() {
            return Err(DoctorError::ValidationError(
                "At least one of day_of_week, start_time or end_time is required".to_string(),
            ));
        }

        let existing = self
            .store
            .find_availability(availability_id)
            .await?
            .ok_or(DoctorError::AvailabilityNotFound)?;

        let merged = changes.apply_to(&existing);
        validate_range(merged.start_time, merged.end_time)?;

        let updated = self
            .store
            .update_availability(availability_id, changes)
            .await?
            .ok_or(DoctorError::AvailabilityNotFound)?;

        info!("Availability {} updated", availability_id);
        Ok(updated)
    }

    pub async fn delete_availability(&self, availability_id: Uuid) -> Result<AvailabilityWindow, DoctorError> {
        debug!("Deleting availability: {}", availability_id);

        let deleted = self
            .store
            .delete_availability(availability_id)
            .await?
            .ok_or(DoctorError::AvailabilityNotFound)?;

        info!("Availability {} deleted", availability_id);
        Ok(deleted)
    }
}

fn parse_day(day: i64) -> Result<u8, DoctorError> {
    u8::try_from(day)
        .ok()
        .filter(|d| *d < DAYS_PER_WEEK)
        .ok_or_else(|| {
            DoctorError::ValidationError("day_of_week must be between 0 (Sunday) and 6 (Saturday)".to_string())
        })
}

fn parse_time(field: &str, value: &str) -> Result<NaiveTime, DoctorError> {
    parse_time_of_day(value)
        .ok_or_else(|| DoctorError::ValidationError(format!("Invalid {}, expected HH:MM:SS", field)))
}

fn parse_required_time(field: &str, value: Option<&str>) -> Result<NaiveTime, DoctorError> {
    let value = required(field, value).map_err(DoctorError::ValidationError)?;
    parse_time(field, value)
}

fn validate_range(start_time: NaiveTime, end_time: NaiveTime) -> Result<(), DoctorError> {
    if start_time >= end_time {
        return Err(DoctorError::ValidationError("start_time must be before end_time".to_string()));
    }
    Ok(())
}
