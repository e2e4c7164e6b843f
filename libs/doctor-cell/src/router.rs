use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use shared_utils::AppState;

use crate::handlers;

/// Mounted under `/doctors`.
pub fn doctor_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::list_doctors))
        .route("/{doctor_id}/availability", get(handlers::get_doctor_availability))
        .with_state(state)
}

/// Mounted under `/availabilities`.
pub fn availability_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(handlers::create_availability))
        .route("/doctor/{doctor_id}", get(handlers::get_availabilities_for_doctor))
        .route(
            "/{availability_id}",
            patch(handlers::update_availability).delete(handlers::delete_availability),
        )
        .with_state(state)
}
