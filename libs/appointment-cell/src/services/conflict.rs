use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::SchedulingStore;
use shared_models::scheduling::Appointment;

use crate::models::{AppointmentError, ConflictCheckResponse};

pub struct ConflictDetectionService {
    store: Arc<dyn SchedulingStore>,
}

impl ConflictDetectionService {
    pub fn new(store: Arc<dyn SchedulingStore>) -> Self {
        Self { store }
    }

    /// Active appointments of the doctor intersecting `[start_time, end_time)`.
    /// Back-to-back appointments do not conflict.
    pub async fn check_conflicts(
        &self,
        doctor_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<ConflictCheckResponse, AppointmentError> {
        debug!("Checking conflicts for doctor {} from {} to {}", doctor_id, start_time, end_time);

        let candidates = self
            .store
            .find_active_appointments_overlapping(doctor_id, start_time, end_time)
            .await?;

        let conflicting_appointments = filter_conflicts(candidates, doctor_id, start_time, end_time);
        let has_conflict = !conflicting_appointments.is_empty();

        if has_conflict {
            warn!(
                "Conflict detected for doctor {} - {} conflicting appointments",
                doctor_id,
                conflicting_appointments.len()
            );
        }

        Ok(ConflictCheckResponse {
            has_conflict,
            conflicting_appointments,
        })
    }
}

/// Keep only active appointments of `doctor_id` that really intersect the window.
fn filter_conflicts(
    candidates: Vec<Appointment>,
    doctor_id: Uuid,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
) -> Vec<Appointment> {
    candidates
        .into_iter()
        .filter(|a| a.doctor_id == doctor_id && a.is_active() && a.overlaps(start_time, end_time))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use shared_models::scheduling::AppointmentStatus;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 6, hour, minute, 0).unwrap()
    }

    fn appointment(doctor_id: Uuid, start: DateTime<Utc>, status: AppointmentStatus) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            doctor_id,
            patient_id: Uuid::new_v4(),
            start_datetime: start,
            end_datetime: start + Duration::minutes(30),
            status,
            created_at: at(0, 0),
        }
    }

    #[test]
    fn test_filter_drops_touching_and_inactive() {
        let doctor_id = Uuid::new_v4();
        let candidates = vec![
            appointment(doctor_id, at(9, 0), AppointmentStatus::Pending),
            appointment(doctor_id, at(9, 30), AppointmentStatus::Confirmed),
            appointment(doctor_id, at(10, 0), AppointmentStatus::Confirmed),
            appointment(doctor_id, at(9, 45), AppointmentStatus::Canceled),
            appointment(doctor_id, at(9, 45), AppointmentStatus::Completed),
            appointment(Uuid::new_v4(), at(9, 45), AppointmentStatus::Pending),
        ];

        let conflicts = filter_conflicts(candidates, doctor_id, at(9, 30), at(10, 0));
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].start_datetime, at(9, 30));
    }
}
