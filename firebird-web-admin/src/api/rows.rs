//! Table data endpoints: paginated reads and row mutations by row-key

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

use super::{database_error_response, error_response, AdminState};
use crate::database::traits::AdminRepository;
use crate::schema::{
    ConnectionParams, DataQuery, DeleteRequest, InsertRequest, StatusResponse, UpdateRequest,
};

/// Handler for GET /api/table/{name}/data
///
/// Query parameters:
/// - limit: rows per page (default 100; invalid or non-positive values fall back)
/// - offset: rows to skip (default 0; invalid or negative values fall back)
/// - sortField: column to order by (optional)
/// - sortOrder: "asc" or "desc" (optional, default ascending)
pub async fn get_data_handler<R: AdminRepository>(
    State(state): State<Arc<AdminState<R>>>,
    Extension(params): Extension<ConnectionParams>,
    Path(table_name): Path<String>,
    Query(query): Query<DataQuery>,
) -> Response {
    match state.service.get_data(&params, &table_name, &query).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(error) => database_error_response("get_data", error),
    }
}

/// Handler for PUT /api/table/{name}/data
///
/// Body: `{"db_key": "<hex>", "data": {"COLUMN": value, ...}}`
pub async fn update_row_handler<R: AdminRepository>(
    State(state): State<Arc<AdminState<R>>>,
    Extension(params): Extension<ConnectionParams>,
    Path(table_name): Path<String>,
    body: Result<Json<UpdateRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => return invalid_body(rejection),
    };

    if request.db_key.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Missing db_key");
    }

    match state
        .service
        .update_row(&params, &table_name, request.db_key.trim(), &request.data)
        .await
    {
        Ok(()) => (StatusCode::OK, Json(StatusResponse::success())).into_response(),
        Err(error) => database_error_response("update_row", error),
    }
}

/// Handler for POST /api/table/{name}/data
///
/// Body: `{"data": {"COLUMN": value, ...}}`
pub async fn insert_row_handler<R: AdminRepository>(
    State(state): State<Arc<AdminState<R>>>,
    Extension(params): Extension<ConnectionParams>,
    Path(table_name): Path<String>,
    body: Result<Json<InsertRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => return invalid_body(rejection),
    };

    match state
        .service
        .insert_row(&params, &table_name, &request.data)
        .await
    {
        Ok(()) => (StatusCode::OK, Json(StatusResponse::success())).into_response(),
        Err(error) => database_error_response("insert_row", error),
    }
}

/// Handler for DELETE /api/table/{name}/data
///
/// Body: `{"db_key": "<hex>"}`
pub async fn delete_row_handler<R: AdminRepository>(
    State(state): State<Arc<AdminState<R>>>,
    Extension(params): Extension<ConnectionParams>,
    Path(table_name): Path<String>,
    body: Result<Json<DeleteRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => return invalid_body(rejection),
    };

    if request.db_key.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Missing db_key");
    }

    match state
        .service
        .delete_row(&params, &table_name, request.db_key.trim())
        .await
    {
        Ok(()) => (StatusCode::OK, Json(StatusResponse::success())).into_response(),
        Err(error) => database_error_response("delete_row", error),
    }
}

fn invalid_body(rejection: JsonRejection) -> Response {
    tracing::warn!(error = %rejection.body_text(), "malformed row request");
    error_response(StatusCode::BAD_REQUEST, "Invalid request body")
}
