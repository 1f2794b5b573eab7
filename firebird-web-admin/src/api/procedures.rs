//! Stored procedure endpoints

use axum::{
    body::Bytes,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

use super::{database_error_response, AdminState};
use crate::database::traits::AdminRepository;
use crate::database::value::Row;
use crate::schema::{ConnectionParams, SourceResponse};

/// Handler for GET /api/procedure/{name}/source
pub async fn get_procedure_source_handler<R: AdminRepository>(
    State(state): State<Arc<AdminState<R>>>,
    Extension(params): Extension<ConnectionParams>,
    Path(procedure): Path<String>,
) -> Response {
    match state.service.get_procedure_source(&params, &procedure).await {
        Ok(source) => (StatusCode::OK, Json(SourceResponse { source })).into_response(),
        Err(error) => database_error_response("get_procedure_source", error),
    }
}

/// Handler for GET /api/procedure/{name}/parameters
///
/// Input parameters in declaration order.
pub async fn get_procedure_parameters_handler<R: AdminRepository>(
    State(state): State<Arc<AdminState<R>>>,
    Extension(params): Extension<ConnectionParams>,
    Path(procedure): Path<String>,
) -> Response {
    match state
        .service
        .get_procedure_parameters(&params, &procedure)
        .await
    {
        Ok(parameters) => (StatusCode::OK, Json(parameters)).into_response(),
        Err(error) => database_error_response("get_procedure_parameters", error),
    }
}

/// Handler for POST /api/procedure/{name}/execute
///
/// The body maps parameter names to values. An empty or unparsable body runs
/// the procedure with every parameter bound to NULL.
pub async fn execute_procedure_handler<R: AdminRepository>(
    State(state): State<Arc<AdminState<R>>>,
    Extension(params): Extension<ConnectionParams>,
    Path(procedure): Path<String>,
    body: Bytes,
) -> Response {
    let arguments = parse_arguments(&body);

    match state
        .service
        .execute_procedure(&params, &procedure, &arguments)
        .await
    {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(error) => database_error_response("execute_procedure", error),
    }
}

fn parse_arguments(body: &[u8]) -> Row {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Row::new();
    }

    serde_json::from_slice(body).unwrap_or_else(|error| {
        tracing::debug!(%error, "ignoring unparsable procedure arguments");
        Row::new()
    })
}
