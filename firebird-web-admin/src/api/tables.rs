//! Catalog listing endpoints

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

use super::{database_error_response, AdminState};
use crate::database::traits::AdminRepository;
use crate::schema::ConnectionParams;

/// Handler for GET /api/tables
///
/// User tables sorted by name; system tables are excluded.
pub async fn list_tables_handler<R: AdminRepository>(
    State(state): State<Arc<AdminState<R>>>,
    Extension(params): Extension<ConnectionParams>,
) -> Response {
    match state.service.list_tables(&params).await {
        Ok(tables) => (StatusCode::OK, Json(tables)).into_response(),
        Err(error) => database_error_response("list_tables", error),
    }
}

/// Handler for GET /api/views
pub async fn list_views_handler<R: AdminRepository>(
    State(state): State<Arc<AdminState<R>>>,
    Extension(params): Extension<ConnectionParams>,
) -> Response {
    match state.service.list_views(&params).await {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(error) => database_error_response("list_views", error),
    }
}

/// Handler for GET /api/procedures
pub async fn list_procedures_handler<R: AdminRepository>(
    State(state): State<Arc<AdminState<R>>>,
    Extension(params): Extension<ConnectionParams>,
) -> Response {
    match state.service.list_procedures(&params).await {
        Ok(procedures) => (StatusCode::OK, Json(procedures)).into_response(),
        Err(error) => database_error_response("list_procedures", error),
    }
}

/// Handler for GET /api/metadata
///
/// Every table and view with its columns and every procedure with its input
/// parameters, used by the SQL editor for completion.
pub async fn metadata_handler<R: AdminRepository>(
    State(state): State<Arc<AdminState<R>>>,
    Extension(params): Extension<ConnectionParams>,
) -> Response {
    match state.service.get_all_metadata(&params).await {
        Ok(metadata) => (StatusCode::OK, Json(metadata)).into_response(),
        Err(error) => database_error_response("get_all_metadata", error),
    }
}
