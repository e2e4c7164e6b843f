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

use crate::models::{
    CreateAvailabilityRequest, DeletedAvailability, DoctorError, UpdateAvailabilityRequest,
};
use crate::services::{availability::AvailabilityService, doctor::DoctorService};

fn to_app_error(e: DoctorError) -> AppError {
    match e {
        DoctorError::NotFound | DoctorError::NotFoundForUser | DoctorError::AvailabilityNotFound => {
            AppError::NotFound(e.to_string())
        }
        DoctorError::ValidationError(msg) => AppError::BadRequest(msg),
        DoctorError::DatabaseError(msg) => AppError::Database(msg),
    }
}

// ==============================================================================
// DOCTOR HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, AppError> {
    let doctor_service = DoctorService::new(state.store.clone());

    let doctors = doctor_service.list_doctors().await.map_err(to_app_error)?;

    Ok(Json(json!(doctors)))
}

#[axum::debug_handler]
pub async fn get_doctor_availability(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let doctor_id = parse_id("doctor_id", &doctor_id).map_err(AppError::BadRequest)?;
    let availability_service = AvailabilityService::new(state.store.clone());

    let windows = availability_service
        .get_for_doctor(doctor_id)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!(windows)))
}

// ==============================================================================
// AVAILABILITY HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_availabilities_for_doctor(
    State(state): State<Arc<AppState>>,
    Path(doctor_user_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let user_id = parse_id("doctor_id", &doctor_user_id).map_err(AppError::BadRequest)?;
    let availability_service = AvailabilityService::new(state.store.clone());

    let windows = availability_service
        .get_for_doctor_user(user_id)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!(windows)))
}

#[axum::debug_handler]
pub async fn create_availability(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateAvailabilityRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(request) = payload?;
    let availability_service = AvailabilityService::new(state.store.clone());

    let window = availability_service
        .create_availability(request)
        .await
        .map_err(to_app_error)?;

    Ok((StatusCode::CREATED, Json(json!(window))))
}

#[axum::debug_handler]
pub async fn update_availability(
    State(state): State<Arc<AppState>>,
    Path(availability_id): Path<String>,
    payload: Result<Json<UpdateAvailabilityRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let availability_id = parse_id("availability id", &availability_id).map_err(AppError::BadRequest)?;
    let Json(request) = payload?;
    let availability_service = AvailabilityService::new(state.store.clone());

    let window = availability_service
        .update_availability(availability_id, request)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!(window)))
}

#[axum::debug_handler]
pub async fn delete_availability(
    State(state): State<Arc<AppState>>,
    Path(availability_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let availability_id = parse_id("availability id", &availability_id).map_err(AppError::BadRequest)?;
    let availability_service = AvailabilityService::new(state.store.clone());

    let deleted = availability_service
        .delete_availability(availability_id)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!(DeletedAvailability {
        message: "Availability deleted".to_string(),
        id: deleted.id,
    })))
}
