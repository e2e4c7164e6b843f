use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::router::appointment_routes;
use doctor_cell::router::{availability_routes, doctor_routes};
use shared_utils::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Apointa API running" }))
        .nest("/doctors", doctor_routes(state.clone()))
        .nest("/availabilities", availability_routes(state.clone()))
        .nest("/appointments", appointment_routes(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use shared_utils::test_utils::{TestClinic, TestConfig};

    #[tokio::test]
    async fn test_liveness_message() {
        let clinic = TestClinic::new().await;
        let app = create_router(clinic.state(&TestConfig::default()));

        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Apointa API running");
    }

    #[tokio::test]
    async fn test_cells_are_mounted() {
        let clinic = TestClinic::new().await;
        let app = create_router(clinic.state(&TestConfig::default()));

        let request = Request::builder().uri("/doctors").body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let uri = format!("/availabilities/doctor/{}", clinic.doctor.user_id);
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let request = Request::builder()
            .method("POST")
            .uri("/appointments")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({
                    "doctor_id": clinic.doctor.id,
                    "patient_id": clinic.patient.id,
                    "start_datetime": "2025-01-06T09:00:00Z"
                })
                .to_string(),
            ))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}
