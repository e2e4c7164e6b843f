use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_models::error::AppError;
use shared_models::validation::parse_id;
use shared_utils::AppState;

use crate::models::{AppointmentError, BookAppointmentRequest, UpdateStatusRequest};
use crate::services::booking::AppointmentBookingService;

fn to_app_error(e: AppointmentError) -> AppError {
    match e {
        AppointmentError::NotFound
        | AppointmentError::DoctorNotFound
        | AppointmentError::DoctorNotFoundForUser => AppError::NotFound(e.to_string()),
        AppointmentError::ValidationError(msg) => AppError::BadRequest(msg),
        AppointmentError::InvalidTime(_)
        | AppointmentError::InvalidStatus(_)
        | AppointmentError::InvalidStatusTransition { .. }
        | AppointmentError::StatusChanged => AppError::BadRequest(e.to_string()),
        AppointmentError::ConflictDetected | AppointmentError::DoctorNotAvailable(_) => {
            AppError::Conflict(e.to_string())
        }
        AppointmentError::DatabaseError(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BookAppointmentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(request) = payload?;
    let booking_service = AppointmentBookingService::new(&state);

    let appointment = booking_service
        .book_appointment(request)
        .await
        .map_err(to_app_error)?;

    Ok((StatusCode::CREATED, Json(json!(appointment))))
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<String>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let appointment_id = parse_id("appointment id", &appointment_id).map_err(AppError::BadRequest)?;
    let Json(request) = payload?;
    let booking_service = AppointmentBookingService::new(&state);

    let appointment = booking_service
        .update_status(appointment_id, request)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn get_patient_appointments(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let patient_id = parse_id("patient_id", &patient_id).map_err(AppError::BadRequest)?;
    let booking_service = AppointmentBookingService::new(&state);

    let appointments = booking_service
        .get_patient_appointments(patient_id)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!(appointments)))
}

#[axum::debug_handler]
pub async fn get_doctor_appointments(
    State(state): State<Arc<AppState>>,
    Path(doctor_user_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let doctor_user_id = parse_id("doctor_id", &doctor_user_id).map_err(AppError::BadRequest)?;
    let booking_service = AppointmentBookingService::new(&state);

    let appointments = booking_service
        .get_doctor_appointments(doctor_user_id)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!(appointments)))
}
