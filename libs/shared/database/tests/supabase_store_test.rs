use assert_matches::assert_matches;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_config::AppConfig;
use shared_database::{SchedulingStore, StoreError, SupabaseStore};
use shared_models::scheduling::{AppointmentStatus, NewAppointment};

fn config_for(server: &MockServer) -> AppConfig {
    AppConfig {
        supabase_url: server.uri(),
        supabase_anon_key: "test-anon-key".to_string(),
        ..AppConfig::default()
    }
}

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 6, hour, minute, 0).unwrap()
}

fn appointment_row(id: Uuid, doctor_id: Uuid, patient_id: Uuid, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "doctor_id": doctor_id,
        "patient_id": patient_id,
        "start_datetime": "2025-01-06T09:00:00+00:00",
        "end_datetime": "2025-01-06T09:30:00+00:00",
        "status": status,
        "created_at": "2025-01-01T00:00:00+00:00"
    })
}

#[tokio::test]
async fn test_insert_appointment_returns_stored_row() {
    let server = MockServer::start().await;
    let (id, doctor_id, patient_id) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .and(header("apikey", "test-anon-key"))
        .and(header("Prefer", "return=representation"))
        .and(body_partial_json(json!({ "status": "pending", "doctor_id": doctor_id })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!([appointment_row(id, doctor_id, patient_id, "pending")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = SupabaseStore::new(&config_for(&server));
    let stored = store
        .insert_appointment(NewAppointment {
            doctor_id,
            patient_id,
            start_datetime: at(9, 0),
            end_datetime: at(9, 30),
        })
        .await
        .unwrap();

    assert_eq!(stored.id, id);
    assert_eq!(stored.status, AppointmentStatus::Pending);
    assert_eq!(stored.start_datetime, at(9, 0));
    assert_eq!(stored.end_datetime, at(9, 30));
}

#[tokio::test]
async fn test_exclusion_violation_on_insert_is_conflict() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23P01",
            "message": "conflicting key value violates exclusion constraint \"appointments_no_overlap\"",
            "details": null,
            "hint": null
        })))
        .mount(&server)
        .await;

    let store = SupabaseStore::new(&config_for(&server));
    let result = store
        .insert_appointment(NewAppointment {
            doctor_id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            start_datetime: at(9, 0),
            end_datetime: at(9, 30),
        })
        .await;

    assert_matches!(result, Err(StoreError::Conflict(_)));
}

#[tokio::test]
async fn test_server_error_is_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let store = SupabaseStore::new(&config_for(&server));
    let result = store.list_doctors().await;

    assert_matches!(result, Err(StoreError::Api { status: 500, .. }));
}

#[tokio::test]
async fn test_overlap_query_filters_active_statuses() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .and(query_param("status", "in.(pending,confirmed)"))
        .and(query_param("start_datetime", "lt.2025-01-06T09:30:00.000000Z"))
        .and(query_param("end_datetime", "gt.2025-01-06T09:00:00.000000Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            appointment_row(Uuid::new_v4(), doctor_id, Uuid::new_v4(), "confirmed")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let store = SupabaseStore::new(&config_for(&server));
    let found = store
        .find_active_appointments_overlapping(doctor_id, at(9, 0), at(9, 30))
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].status, AppointmentStatus::Confirmed);
}

#[tokio::test]
async fn test_find_doctor_by_user_id_maps_embedded_name() {
    let server = MockServer::start().await;
    let (doctor_id, user_id) = (Uuid::new_v4(), Uuid::new_v4());

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("user_id", format!("eq.{}", user_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": doctor_id,
            "user_id": user_id,
            "specialty": "Cardiology",
            "clinic_name": "Heart Clinic",
            "phone": null,
            "user": { "name": "Dr. Heart" }
        }])))
        .mount(&server)
        .await;

    let store = SupabaseStore::new(&config_for(&server));
    let doctor = store.find_doctor_by_user_id(user_id).await.unwrap().unwrap();

    assert_eq!(doctor.id, doctor_id);
    assert_eq!(doctor.name, "Dr. Heart");
    assert_eq!(doctor.specialty.as_deref(), Some("Cardiology"));
    assert!(doctor.phone.is_none());
}

#[tokio::test]
async fn test_status_update_precondition_failure_is_conflict() {
    let server = MockServer::start().await;
    let (id, doctor_id, patient_id) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "eq.pending"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            appointment_row(id, doctor_id, patient_id, "canceled")
        ])))
        .mount(&server)
        .await;

    let store = SupabaseStore::new(&config_for(&server));
    let result = store
        .update_appointment_status(id, AppointmentStatus::Confirmed, Some(AppointmentStatus::Pending))
        .await;

    assert_matches!(result, Err(StoreError::Conflict(_)));
}

#[tokio::test]
async fn test_status_update_on_missing_row_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let store = SupabaseStore::new(&config_for(&server));
    let result = store
        .update_appointment_status(Uuid::new_v4(), AppointmentStatus::Canceled, None)
        .await
        .unwrap();

    assert!(result.is_none());
}

#[tokio::test]
async fn test_patient_listing_flattens_doctor_info() {
    let server = MockServer::start().await;
    let (id, doctor_id, patient_id) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("patient_id", format!("eq.{}", patient_id)))
        .and(query_param("order", "created_at.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": id,
            "start_datetime": "2025-01-06T09:00:00+00:00",
            "end_datetime": "2025-01-06T09:30:00+00:00",
            "status": "pending",
            "doctor_id": doctor_id,
            "doctor": { "specialty": "Dermatology", "user": { "name": "Dr. Skin" } }
        }])))
        .mount(&server)
        .await;

    let store = SupabaseStore::new(&config_for(&server));
    let listed = store.appointments_for_patient(patient_id).await.unwrap();

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].doctor_name.as_deref(), Some("Dr. Skin"));
    assert_eq!(listed[0].specialty.as_deref(), Some("Dermatology"));
    assert_eq!(listed[0].start_datetime, at(9, 0));
}

#[tokio::test]
async fn test_availability_rows_parse_postgres_time() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/availabilities"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .and(query_param("order", "day_of_week.asc,start_time.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": Uuid::new_v4(),
            "doctor_id": doctor_id,
            "day_of_week": 1,
            "start_time": "09:00:00",
            "end_time": "17:00:00"
        }])))
        .mount(&server)
        .await;

    let store = SupabaseStore::new(&config_for(&server));
    let windows = store.availability_windows(doctor_id).await.unwrap();

    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0].day_of_week, 1);
    assert_eq!(windows[0].end_time.format("%H:%M:%S").to_string(), "17:00:00");
}
