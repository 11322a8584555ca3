use axum::{
    middleware,
    routing::{delete, get, put},
    Router,
};

use shared_utils::extractor::auth_middleware;
use shared_utils::AppState;

use crate::handlers;

pub fn notification_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::list_notifications))
        .route("/read-all", put(handlers::mark_all_notifications_read))
        .route("/{notification_id}/read", put(handlers::mark_notification_read))
        .route("/{notification_id}", delete(handlers::delete_notification))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
