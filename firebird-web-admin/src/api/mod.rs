//! REST API endpoints
//!
//! Handlers are generic over the [`AdminRepository`] so the router can be
//! driven by an in-memory repository in tests.

use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::auth::TokenIssuer;
use crate::config::AdminConfig;
use crate::database::traits::{AdminRepository, DatabaseError};
use crate::service::AdminService;

pub mod procedures;
pub mod query;
pub mod rows;
pub mod session;
pub mod tables;

// Re-export handlers for convenience
pub use procedures::{
    execute_procedure_handler, get_procedure_parameters_handler, get_procedure_source_handler,
};
pub use query::execute_query_handler;
pub use rows::{delete_row_handler, get_data_handler, insert_row_handler, update_row_handler};
pub use session::{config_handler, connect_handler, require_token};
pub use tables::{list_procedures_handler, list_tables_handler, list_views_handler, metadata_handler};

/// Shared state of every API handler
pub struct AdminState<R: AdminRepository> {
    pub service: AdminService<R>,
    pub tokens: TokenIssuer,
    pub config: AdminConfig,
}

impl<R: AdminRepository> AdminState<R> {
    pub fn new(config: AdminConfig, repository: Arc<R>) -> Self {
        Self {
            service: AdminService::new(repository),
            tokens: TokenIssuer::new(&config.jwt_secret),
            config,
        }
    }
}

/// Create the API router with all endpoints
///
/// `/config` and `/connect` are public; every other route requires a session
/// token and receives the decoded [`ConnectionParams`](crate::schema::ConnectionParams)
/// as a request extension.
pub fn create_api_router<R: AdminRepository>(state: Arc<AdminState<R>>) -> Router {
    // Axum 0.8 uses {param} syntax instead of :param
    let protected = Router::new()
        .route("/tables", get(tables::list_tables_handler::<R>))
        .route("/views", get(tables::list_views_handler::<R>))
        .route("/procedures", get(tables::list_procedures_handler::<R>))
        .route("/metadata", get(tables::metadata_handler::<R>))
        .route(
            "/procedure/{name}/source",
            get(procedures::get_procedure_source_handler::<R>),
        )
        .route(
            "/procedure/{name}/parameters",
            get(procedures::get_procedure_parameters_handler::<R>),
        )
        .route(
            "/procedure/{name}/execute",
            post(procedures::execute_procedure_handler::<R>),
        )
        .route(
            "/table/{name}/data",
            get(rows::get_data_handler::<R>)
                .put(rows::update_row_handler::<R>)
                .post(rows::insert_row_handler::<R>)
                .delete(rows::delete_row_handler::<R>),
        )
        .route("/execute", post(query::execute_query_handler::<R>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::require_token::<R>,
        ));

    Router::new()
        .route("/config", get(session::config_handler::<R>))
        .route("/connect", post(session::connect_handler::<R>))
        .merge(protected)
        .with_state(state)
}

/// `{"error": message}` with the given status
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(serde_json::json!({
            "error": message.into()
        })),
    )
        .into_response()
}

/// Map a repository failure to a response, logging it with the operation name
pub(crate) fn database_error_response(operation: &str, error: DatabaseError) -> Response {
    let status = if error.is_client_error() {
        StatusCode::BAD_REQUEST
    } else if matches!(error, DatabaseError::NotFound(_)) {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    if status.is_server_error() {
        tracing::error!(operation, %error, "database operation failed");
    } else {
        tracing::warn!(operation, %error, "rejected request");
    }

    error_response(status, error.to_string())
}
