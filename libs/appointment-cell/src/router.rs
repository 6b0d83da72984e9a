// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppConfig>) -> Router {
    // All appointment operations require authentication
    let protected_routes = Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/{appointment_id}", get(handlers::get_appointment))

        // Status workflow
        .route("/{appointment_id}/approve", put(handlers::approve_appointment))
        .route("/{appointment_id}/reject", put(handlers::reject_appointment))
        .route("/{appointment_id}/cancel", put(handlers::cancel_appointment))
        .route("/{appointment_id}/complete", put(handlers::complete_appointment))

        // Negotiation thread and feedback
        .route("/{appointment_id}/messages", post(handlers::append_message))
        .route("/{appointment_id}/feedback", post(handlers::submit_feedback))

        // Appointment listings
        .route("/patients/{medical_id}", get(handlers::get_patient_appointments))
        .route("/doctors/{medical_id}", get(handlers::get_doctor_appointments))

        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
