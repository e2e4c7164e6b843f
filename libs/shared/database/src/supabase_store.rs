use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::scheduling::{
    Appointment, AppointmentStatus, AvailabilityChanges, AvailabilityWindow, Doctor,
    DoctorAppointment, NewAppointment, NewAvailability, PatientAppointment,
};

use crate::store::{SchedulingStore, StoreError};
use crate::supabase::SupabaseClient;

const DOCTOR_SELECT: &str = "id,user_id,specialty,clinic_name,phone,user:users(name)";
const PATIENT_VIEW_SELECT: &str =
    "id,start_datetime,end_datetime,status,doctor_id,doctor:doctors(specialty,user:users(name))";
const DOCTOR_VIEW_SELECT: &str =
    "id,doctor_id,start_datetime,end_datetime,status,patient_id,patient:users(name)";

/// `SchedulingStore` backed by Supabase's PostgREST API.
///
/// Double-booking is prevented by the `appointments_no_overlap` exclusion
/// constraint (see `migrations/001_scheduling.sql`); a losing insert comes
/// back as SQLSTATE 23P01 and is reported as [`StoreError::Conflict`].
pub struct SupabaseStore {
    supabase: SupabaseClient,
}

#[derive(Debug, Deserialize)]
struct NameEmbed {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DoctorRow {
    id: Uuid,
    user_id: Uuid,
    specialty: Option<String>,
    clinic_name: Option<String>,
    phone: Option<String>,
    user: Option<NameEmbed>,
}

impl From<DoctorRow> for Doctor {
    fn from(row: DoctorRow) -> Self {
        Doctor {
            id: row.id,
            user_id: row.user_id,
            name: row.user.and_then(|u| u.name).unwrap_or_default(),
            specialty: row.specialty,
            clinic_name: row.clinic_name,
            phone: row.phone,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DoctorEmbed {
    specialty: Option<String>,
    user: Option<NameEmbed>,
}

#[derive(Debug, Deserialize)]
struct PatientViewRow {
    id: Uuid,
    start_datetime: DateTime<Utc>,
    end_datetime: DateTime<Utc>,
    status: AppointmentStatus,
    doctor_id: Uuid,
    doctor: Option<DoctorEmbed>,
}

impl From<PatientViewRow> for PatientAppointment {
    fn from(row: PatientViewRow) -> Self {
        let (doctor_name, specialty) = match row.doctor {
            Some(doctor) => (doctor.user.and_then(|u| u.name), doctor.specialty),
            None => (None, None),
        };
        PatientAppointment {
            id: row.id,
            start_datetime: row.start_datetime,
            end_datetime: row.end_datetime,
            status: row.status,
            doctor_id: row.doctor_id,
            doctor_name,
            specialty,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DoctorViewRow {
    id: Uuid,
    doctor_id: Uuid,
    start_datetime: DateTime<Utc>,
    end_datetime: DateTime<Utc>,
    status: AppointmentStatus,
    patient_id: Uuid,
    patient: Option<NameEmbed>,
}

impl From<DoctorViewRow> for DoctorAppointment {
    fn from(row: DoctorViewRow) -> Self {
        DoctorAppointment {
            id: row.id,
            doctor_id: row.doctor_id,
            start_datetime: row.start_datetime,
            end_datetime: row.end_datetime,
            status: row.status,
            patient_id: row.patient_id,
            patient_name: row.patient.and_then(|p| p.name),
        }
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    // `Z` suffix keeps the value free of `+`, which would need escaping in a query string
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn first_row<T>(rows: Vec<T>, what: &str) -> Result<T, StoreError> {
    rows.into_iter().next().ok_or_else(|| StoreError::Api {
        status: 200,
        code: None,
        message: format!("{} write returned no representation", what),
    })
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    async fn find_doctor_where(&self, filter: String) -> Result<Option<Doctor>, StoreError> {
        let path = format!("/rest/v1/doctors?select={}&{}&limit=1", DOCTOR_SELECT, filter);
        let rows: Vec<DoctorRow> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(rows.into_iter().next().map(Doctor::from))
    }
}

#[async_trait]
impl SchedulingStore for SupabaseStore {
    async fn list_doctors(&self) -> Result<Vec<Doctor>, StoreError> {
        let path = format!("/rest/v1/doctors?select={}&order=id.asc", DOCTOR_SELECT);
        let rows: Vec<DoctorRow> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(rows.into_iter().map(Doctor::from).collect())
    }

    async fn find_doctor(&self, doctor_id: Uuid) -> Result<Option<Doctor>, StoreError> {
        self.find_doctor_where(format!("id=eq.{}", doctor_id)).await
    }

    async fn find_doctor_by_user_id(&self, user_id: Uuid) -> Result<Option<Doctor>, StoreError> {
        self.find_doctor_where(format!("user_id=eq.{}", user_id)).await
    }

    async fn availability_windows(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<AvailabilityWindow>, StoreError> {
        let path = format!(
            "/rest/v1/availabilities?doctor_id=eq.{}&order=day_of_week.asc,start_time.asc",
            doctor_id
        );
        self.supabase.request(Method::GET, &path, None).await
    }

    async fn find_availability(
        &self,
        availability_id: Uuid,
    ) -> Result<Option<AvailabilityWindow>, StoreError> {
        let path = format!("/rest/v1/availabilities?id=eq.{}", availability_id);
        let rows: Vec<AvailabilityWindow> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_availability(
        &self,
        availability: NewAvailability,
    ) -> Result<AvailabilityWindow, StoreError> {
        let body = json!({
            "doctor_id": availability.doctor_id,
            "day_of_week": availability.day_of_week,
            "start_time": availability.start_time.format("%H:%M:%S").to_string(),
            "end_time": availability.end_time.format("%H:%M:%S").to_string(),
        });

        let rows: Vec<AvailabilityWindow> = self
            .supabase
            .request_representation(Method::POST, "/rest/v1/availabilities", Some(body))
            .await?;
        first_row(rows, "availability")
    }

    async fn update_availability(
        &self,
        availability_id: Uuid,
        changes: AvailabilityChanges,
    ) -> Result<Option<AvailabilityWindow>, StoreError> {
        let mut update_data = Map::new();
        if let Some(day) = changes.day_of_week {
            update_data.insert("day_of_week".to_string(), json!(day));
        }
        if let Some(start_time) = changes.start_time {
            update_data.insert("start_time".to_string(), json!(start_time.format("%H:%M:%S").to_string()));
        }
        if let Some(end_time) = changes.end_time {
            update_data.insert("end_time".to_string(), json!(end_time.format("%H:%M:%S").to_string()));
        }

        let path = format!("/rest/v1/availabilities?id=eq.{}", availability_id);
        let rows: Vec<AvailabilityWindow> = self
            .supabase
            .request_representation(Method::PATCH, &path, Some(Value::Object(update_data)))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn delete_availability(
        &self,
        availability_id: Uuid,
    ) -> Result<Option<AvailabilityWindow>, StoreError> {
        let path = format!("/rest/v1/availabilities?id=eq.{}", availability_id);
        let rows: Vec<AvailabilityWindow> = self
            .supabase
            .request_representation(Method::DELETE, &path, None)
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn find_active_appointments_overlapping(
        &self,
        doctor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, StoreError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&status=in.(pending,confirmed)&start_datetime=lt.{}&end_datetime=gt.{}&order=start_datetime.asc",
            doctor_id,
            timestamp(end),
            timestamp(start),
        );
        self.supabase.request(Method::GET, &path, None).await
    }

    async fn insert_appointment(
        &self,
        appointment: NewAppointment,
    ) -> Result<Appointment, StoreError> {
        let body = json!({
            "doctor_id": appointment.doctor_id,
            "patient_id": appointment.patient_id,
            "start_datetime": timestamp(appointment.start_datetime),
            "end_datetime": timestamp(appointment.end_datetime),
            "status": AppointmentStatus::Pending,
        });

        let rows: Vec<Appointment> = self
            .supabase
            .request_representation(Method::POST, "/rest/v1/appointments", Some(body))
            .await?;
        first_row(rows, "appointment")
    }

    async fn find_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Option<Appointment>, StoreError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let rows: Vec<Appointment> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(rows.into_iter().next())
    }

    async fn update_appointment_status(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
        expected: Option<AppointmentStatus>,
    ) -> Result<Option<Appointment>, StoreError> {
        let mut path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        if let Some(expected) = expected {
            path.push_str(&format!("&status=eq.{}", expected));
        }

        let rows: Vec<Appointment> = self
            .supabase
            .request_representation(Method::PATCH, &path, Some(json!({ "status": status })))
            .await?;

        if let Some(updated) = rows.into_iter().next() {
            return Ok(Some(updated));
        }

        // Nothing matched: either the row is gone or the precondition failed
        match (expected, self.find_appointment(appointment_id).await?) {
            (Some(expected), Some(current)) => {
                debug!(
                    "Status precondition failed for appointment {}: expected {}, found {}",
                    appointment_id, expected, current.status
                );
                Err(StoreError::Conflict(format!(
                    "appointment status changed from {} to {}",
                    expected, current.status
                )))
            }
            _ => Ok(None),
        }
    }

    async fn appointments_for_patient(
        &self,
        patient_id: Uuid,
    ) -> Result<Vec<PatientAppointment>, StoreError> {
        let path = format!(
            "/rest/v1/appointments?select={}&patient_id=eq.{}&order=created_at.asc",
            PATIENT_VIEW_SELECT, patient_id
        );
        let rows: Vec<PatientViewRow> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(rows.into_iter().map(PatientAppointment::from).collect())
    }

    async fn appointments_for_doctor(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<DoctorAppointment>, StoreError> {
        let path = format!(
            "/rest/v1/appointments?select={}&doctor_id=eq.{}&order=created_at.asc",
            DOCTOR_VIEW_SELECT, doctor_id
        );
        let rows: Vec<DoctorViewRow> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(rows.into_iter().map(DoctorAppointment::from).collect())
    }
}
