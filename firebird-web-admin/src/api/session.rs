//! Public endpoints and the session-token guard

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

use super::{error_response, AdminState};
use crate::database::traits::AdminRepository;
use crate::schema::{ConfigResponse, ConnectResponse, ConnectionParams};

/// Handler for GET /api/config
pub async fn config_handler<R: AdminRepository>(
    State(state): State<Arc<AdminState<R>>>,
) -> Response {
    Json(ConfigResponse {
        demo: state.config.demo_mode,
        version: state.config.version.clone(),
    })
    .into_response()
}

/// Handler for POST /api/connect
///
/// Tests the credentials against the server and returns a session token
/// carrying them. In demo mode only the configured database is accepted and
/// the check happens before any connection attempt.
pub async fn connect_handler<R: AdminRepository>(
    State(state): State<Arc<AdminState<R>>>,
    body: Result<Json<ConnectionParams>, JsonRejection>,
) -> Response {
    let Json(params) = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "malformed connect request");
            return error_response(StatusCode::BAD_REQUEST, "Invalid request body");
        }
    };

    if !state.config.permits_database(&params.database) {
        tracing::warn!(database = %params.database, "demo mode rejected connect request");
        return error_response(
            StatusCode::FORBIDDEN,
            format!("Demo mode: only {} allowed", state.config.demo_database),
        );
    }

    if let Err(error) = state.service.connect(&params).await {
        if error.is_client_error() {
            tracing::warn!(database = %params.database, %error, "rejected connect request");
            return error_response(StatusCode::BAD_REQUEST, error.to_string());
        }
        tracing::warn!(database = %params.database, user = %params.user, %error, "connection test failed");
        return error_response(
            StatusCode::UNAUTHORIZED,
            format!("Connection failed: {}", error),
        );
    }

    match state.tokens.issue(&params) {
        Ok(token) => {
            tracing::info!(database = %params.database, user = %params.user, "session opened");
            (StatusCode::OK, Json(ConnectResponse { token })).into_response()
        }
        Err(error) => {
            tracing::error!(%error, "failed to sign session token");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
        }
    }
}

/// Middleware guarding every route except `/config` and `/connect`
///
/// On success the decoded [`ConnectionParams`] are inserted as a request
/// extension for the handler.
pub async fn require_token<R: AdminRepository>(
    State(state): State<Arc<AdminState<R>>>,
    mut request: Request,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match state.tokens.validate_header(header) {
        Ok(params) => {
            request.extensions_mut().insert(params);
            next.run(request).await
        }
        Err(error) => {
            tracing::debug!(path = %request.uri().path(), %error, "unauthenticated request");
            error_response(StatusCode::UNAUTHORIZED, error.to_string())
        }
    }
}
