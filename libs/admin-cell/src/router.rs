use axum::{middleware, routing::get, Router};

use shared_utils::extractor::auth_middleware;
use shared_utils::AppState;

use crate::handlers;

pub fn admin_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::list_admins).post(handlers::create_admin))
        .route(
            "/{admin_id}",
            get(handlers::get_admin)
                .put(handlers::update_admin)
                .delete(handlers::delete_admin),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
