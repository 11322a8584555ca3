use axum::{middleware, routing::get, Router};

use admin_cell::router::admin_routes;
use appointment_cell::router::appointment_routes;
use doctor_cell::router::doctor_routes;
use notification_cell::router::notification_routes;
use patient_cell::router::create_patient_router;
use shared_utils::extractor::db_connection_check;
use shared_utils::AppState;

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/doctors", doctor_routes(state.clone()))
        .nest("/patients", create_patient_router(state.clone()))
        .nest("/notifications", notification_routes(state.clone()))
        .nest("/admins", admin_routes(state.clone()))
        .layer(middleware::from_fn_with_state(state, db_connection_check));

    Router::new()
        .route("/", get(|| async { "Clinic API is running!" }))
        .nest("/api", api)
}
