use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_models::scheduling::{
    Appointment, AppointmentStatus, AvailabilityChanges, AvailabilityWindow, Doctor,
    DoctorAppointment, NewAppointment, NewAvailability, PatientAppointment, UserProfile,
};

use crate::store::{SchedulingStore, StoreError};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, UserProfile>,
    doctors: Vec<Doctor>,
    availabilities: Vec<AvailabilityWindow>,
    appointments: Vec<Appointment>,
}

/// Process-local `SchedulingStore` for development and tests.
///
/// Every write holds the table lock for its whole check-and-write, so the
/// overlap check in [`SchedulingStore::insert_appointment`] and the insert
/// are a single step.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register_user(&self, name: &str) -> UserProfile {
        let user = UserProfile {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        self.tables.write().await.users.insert(user.id, user.clone());
        user
    }

    /// Create a user and the doctor record linked to it.
    pub async fn register_doctor(
        &self,
        name: &str,
        specialty: Option<&str>,
        clinic_name: Option<&str>,
        phone: Option<&str>,
    ) -> Doctor {
        let user = self.register_user(name).await;
        let doctor = Doctor {
            id: Uuid::new_v4(),
            user_id: user.id,
            name: user.name,
            specialty: specialty.map(str::to_string),
            clinic_name: clinic_name.map(str::to_string),
            phone: phone.map(str::to_string),
        };
        self.tables.write().await.doctors.push(doctor.clone());
        doctor
    }

    /// Snapshot of every stored appointment, in insertion order.
    pub async fn appointments(&self) -> Vec<Appointment> {
        self.tables.read().await.appointments.clone()
    }
}

fn sort_windows(windows: &mut [AvailabilityWindow]) {
    windows.sort_by_key(|w| (w.day_of_week, w.start_time));
}

#[async_trait]
impl SchedulingStore for InMemoryStore {
    async fn list_doctors(&self) -> Result<Vec<Doctor>, StoreError> {
        Ok(self.tables.read().await.doctors.clone())
    }

    async fn find_doctor(&self, doctor_id: Uuid) -> Result<Option<Doctor>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.doctors.iter().find(|d| d.id == doctor_id).cloned())
    }

    async fn find_doctor_by_user_id(&self, user_id: Uuid) -> Result<Option<Doctor>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.doctors.iter().find(|d| d.user_id == user_id).cloned())
    }

    async fn availability_windows(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<AvailabilityWindow>, StoreError> {
        let tables = self.tables.read().await;
        let mut windows: Vec<_> = tables
            .availabilities
            .iter()
            .filter(|w| w.doctor_id == doctor_id)
            .cloned()
            .collect();
        sort_windows(&mut windows);
        Ok(windows)
    }

    async fn find_availability(
        &self,
        availability_id: Uuid,
    ) -> Result<Option<AvailabilityWindow>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.availabilities.iter().find(|w| w.id == availability_id).cloned())
    }

    async fn insert_availability(
        &self,
        availability: NewAvailability,
    ) -> Result<AvailabilityWindow, StoreError> {
        let window = AvailabilityWindow {
            id: Uuid::new_v4(),
            doctor_id: availability.doctor_id,
            day_of_week: availability.day_of_week,
            start_time: availability.start_time,
            end_time: availability.end_time,
        };
        self.tables.write().await.availabilities.push(window.clone());
        Ok(window)
    }

    async fn update_availability(
        &self,
        availability_id: Uuid,
        changes: AvailabilityChanges,
    ) -> Result<Option<AvailabilityWindow>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .availabilities
            .iter_mut()
            .find(|w| w.id == availability_id)
            .map(|window| {
                *window = changes.apply_to(window);
                window.clone()
            }))
    }

    async fn delete_availability(
        &self,
        availability_id: Uuid,
    ) -> Result<Option<AvailabilityWindow>, StoreError> {
        let mut tables = self.tables.write().await;
        let position = tables.availabilities.iter().position(|w| w.id == availability_id);
        Ok(position.map(|index| tables.availabilities.remove(index)))
    }

    async fn find_active_appointments_overlapping(
        &self,
        doctor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, StoreError> {
        let tables = self.tables.read().await;
        let mut overlapping: Vec<_> = tables
            .appointments
            .iter()
            .filter(|a| a.doctor_id == doctor_id && a.is_active() && a.overlaps(start, end))
            .cloned()
            .collect();
        overlapping.sort_by_key(|a| a.start_datetime);
        Ok(overlapping)
    }

    async fn insert_appointment(
        &self,
        appointment: NewAppointment,
    ) -> Result<Appointment, StoreError> {
        let mut tables = self.tables.write().await;

        let clash = tables.appointments.iter().find(|a| {
            a.doctor_id == appointment.doctor_id
                && a.is_active()
                && a.overlaps(appointment.start_datetime, appointment.end_datetime)
        });
        if let Some(existing) = clash {
            debug!(
                "Rejecting insert for doctor {}: overlaps appointment {}",
                appointment.doctor_id, existing.id
            );
            return Err(StoreError::Conflict(format!(
                "overlaps active appointment {}",
                existing.id
            )));
        }

        let stored = Appointment {
            id: Uuid::new_v4(),
            doctor_id: appointment.doctor_id,
            patient_id: appointment.patient_id,
            start_datetime: appointment.start_datetime,
            end_datetime: appointment.end_datetime,
            status: AppointmentStatus::Pending,
            created_at: Utc::now(),
        };
        tables.appointments.push(stored.clone());
        Ok(stored)
    }

    async fn find_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Option<Appointment>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.appointments.iter().find(|a| a.id == appointment_id).cloned())
    }

    async fn update_appointment_status(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
        expected: Option<AppointmentStatus>,
    ) -> Result<Option<Appointment>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(index) = tables.appointments.iter().position(|a| a.id == appointment_id) else {
            return Ok(None);
        };
        let current = tables.appointments[index].clone();

        if let Some(expected) = expected {
            if current.status != expected {
                return Err(StoreError::Conflict(format!(
                    "appointment status changed from {} to {}",
                    expected, current.status
                )));
            }
        }

        // Reactivating must not put two active appointments on the same slot
        if status.is_active() && !current.is_active() {
            let clash = tables.appointments.iter().find(|a| {
                a.id != current.id
                    && a.doctor_id == current.doctor_id
                    && a.is_active()
                    && a.overlaps(current.start_datetime, current.end_datetime)
            });
            if let Some(existing) = clash {
                return Err(StoreError::Conflict(format!(
                    "overlaps active appointment {}",
                    existing.id
                )));
            }
        }

        let appointment = &mut tables.appointments[index];
        appointment.status = status;
        Ok(Some(appointment.clone()))
    }

    async fn appointments_for_patient(
        &self,
        patient_id: Uuid,
    ) -> Result<Vec<PatientAppointment>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .appointments
            .iter()
            .filter(|a| a.patient_id == patient_id)
            .map(|a| {
                let doctor = tables.doctors.iter().find(|d| d.id == a.doctor_id);
                PatientAppointment {
                    id: a.id,
                    start_datetime: a.start_datetime,
                    end_datetime: a.end_datetime,
                    status: a.status,
                    doctor_id: a.doctor_id,
                    doctor_name: doctor.map(|d| d.name.clone()),
                    specialty: doctor.and_then(|d| d.specialty.clone()),
                }
            })
            .collect())
    }

    async fn appointments_for_doctor(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<DoctorAppointment>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .appointments
            .iter()
            .filter(|a| a.doctor_id == doctor_id)
            .map(|a| DoctorAppointment {
                id: a.id,
                doctor_id: a.doctor_id,
                start_datetime: a.start_datetime,
                end_datetime: a.end_datetime,
                status: a.status,
                patient_id: a.patient_id,
                patient_name: tables.users.get(&a.patient_id).map(|u| u.name.clone()),
            })
            .collect())
    }
}
