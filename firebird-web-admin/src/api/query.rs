//! Ad-hoc SQL execution endpoint

use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

use super::{database_error_response, error_response, AdminState};
use crate::database::traits::AdminRepository;
use crate::schema::{ConnectionParams, ExecuteRequest};

/// Handler for POST /api/execute
///
/// Runs one statement with the caller's credentials. Statements starting with
/// `SELECT` or `WITH` return their rows; anything else returns an empty
/// result once executed.
///
/// Request body:
/// ```json
/// { "sql": "SELECT FIRST 10 * FROM EMPLOYEE" }
/// ```
///
/// Response:
/// ```json
/// { "data": [...], "columns": [...], "total": 10 }
/// ```
pub async fn execute_query_handler<R: AdminRepository>(
    State(state): State<Arc<AdminState<R>>>,
    Extension(params): Extension<ConnectionParams>,
    body: Result<Json<ExecuteRequest>, JsonRejection>,
) -> Response {
    let sql = match body {
        Ok(Json(request)) => request.sql,
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "malformed execute request");
            return error_response(StatusCode::BAD_REQUEST, "Invalid request body");
        }
    };

    let sql = sql.trim();
    if sql.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Missing SQL statement");
    }

    tracing::debug!(sql, "executing ad-hoc statement");

    match state.service.execute_query(&params, sql).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(error) => database_error_response("execute_query", error),
    }
}
