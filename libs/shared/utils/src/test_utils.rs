use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::InMemoryStore;
use shared_models::scheduling::{Doctor, UserProfile};

use crate::state::AppState;

/// Monday 2025-01-06 at the given UTC wall-clock time.
pub fn monday_at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 6, hour, minute, 0)
        .single()
        .unwrap_or_else(|| panic!("invalid test time {:02}:{:02}", hour, minute))
}

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub enforce_availability: bool,
    pub strict_status_transitions: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            enforce_availability: false,
            strict_status_transitions: false,
        }
    }
}

impl TestConfig {
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn enforcing_availability(mut self) -> Self {
        self.enforce_availability = true;
        self
    }

    pub fn strict_transitions(mut self) -> Self {
        self.strict_status_transitions = true;
        self
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_service_role_key: String::new(),
            enforce_availability: self.enforce_availability,
            strict_status_transitions: self.strict_status_transitions,
            ..AppConfig::default()
        }
    }
}

/// In-memory clinic with one doctor and one patient.
pub struct TestClinic {
    pub store: Arc<InMemoryStore>,
    pub doctor: Doctor,
    pub patient: UserProfile,
}

impl TestClinic {
    pub async fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let doctor = store
            .register_doctor("Dr. Test", Some("General Practice"), Some("Test Clinic"), Some("555-0100"))
            .await;
        let patient = store.register_user("Test Patient").await;

        Self { store, doctor, patient }
    }

    pub fn state(&self, config: &TestConfig) -> Arc<AppState> {
        Arc::new(AppState::new(config.to_app_config(), self.store.clone()))
    }
}

/// PostgREST row payloads for wiremock-backed store tests.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn doctor_response(doctor_id: Uuid, user_id: Uuid, name: &str, specialty: &str) -> serde_json::Value {
        json!({
            "id": doctor_id,
            "user_id": user_id,
            "specialty": specialty,
            "clinic_name": "Test Clinic",
            "phone": "555-0100",
            "user": { "name": name }
        })
    }

    pub fn availability_response(
        availability_id: Uuid,
        doctor_id: Uuid,
        day_of_week: u8,
        start_time: &str,
        end_time: &str,
    ) -> serde_json::Value {
        json!({
            "id": availability_id,
            "doctor_id": doctor_id,
            "day_of_week": day_of_week,
            "start_time": start_time,
            "end_time": end_time
        })
    }

    pub fn appointment_response(
        appointment_id: Uuid,
        doctor_id: Uuid,
        patient_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        status: &str,
    ) -> serde_json::Value {
        json!({
            "id": appointment_id,
            "doctor_id": doctor_id,
            "patient_id": patient_id,
            "start_datetime": start.to_rfc3339(),
            "end_datetime": end.to_rfc3339(),
            "status": status,
            "created_at": "2025-01-01T00:00:00+00:00"
        })
    }

    pub fn error_response(code: &str, message: &str) -> serde_json::Value {
        json!({
            "code": code,
            "message": message,
            "details": null,
            "hint": null
        })
    }
}
