use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use shared_utils::AppState;

use crate::handlers;

/// Mounted under `/appointments`.
pub fn appointment_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/patient/{patient_id}", get(handlers::get_patient_appointments))
        .route("/doctor/{doctor_id}", get(handlers::get_doctor_appointments))
        .route("/{appointment_id}/status", patch(handlers::update_appointment_status))
        .with_state(state)
}
