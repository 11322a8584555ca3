use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use tracing::debug;

use shared_database::CONNECTION_LOST_MESSAGE;
use shared_models::error::AppError;

use crate::jwt::AuthenticationService;
use crate::state::AppState;

/// Verifies the bearer token and stores the caller's `Credentials` in the
/// request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = auth.as_ref().map(|TypedHeader(header)| header.token());

    let credentials = AuthenticationService::new(state.config.jwt_secret.clone()).authenticate(token)?;

    request.extensions_mut().insert(credentials);
    Ok(next.run(request).await)
}

/// Answers 503 while the document store is disconnected.
pub async fn db_connection_check(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    if !state.connection.is_connected().await {
        debug!("Rejecting {} {}: store disconnected", request.method(), request.uri());
        return Err(AppError::ServiceUnavailable(CONNECTION_LOST_MESSAGE.to_string()));
    }
    Ok(next.run(request).await)
}
