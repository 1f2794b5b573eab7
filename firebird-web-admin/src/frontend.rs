//! Frontend asset serving
//!
//! The single-page frontend is built separately and served from disk. Any
//! path that does not match a file falls back to `index.html` so client-side
//! routes survive a reload.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use std::path::Path;
use tower_http::services::{ServeDir, ServeFile};

/// Create a router serving the frontend build in `static_directory`
///
/// Serves `/`, `/assets/*`, `/favicon.svg` and every other file in the
/// directory. When no `index.html` exists there, every path returns a short
/// page explaining that the frontend has not been built.
pub fn create_frontend_router(static_directory: &Path) -> Router {
    let index = static_directory.join("index.html");

    if index.is_file() {
        tracing::info!(directory = %static_directory.display(), "serving frontend");
        let files = ServeDir::new(static_directory).fallback(ServeFile::new(index));
        Router::new().fallback_service(files)
    } else {
        tracing::warn!(
            directory = %static_directory.display(),
            "frontend build not found, only the API is available"
        );
        Router::new().fallback(serve_fallback_page)
    }
}

/// Page shown when the frontend build directory is missing
async fn serve_fallback_page() -> Response {
    let html = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Firebird Web Admin - Frontend Not Built</title>
    <style>
        body { font-family: system-ui, sans-serif; max-width: 720px; margin: 80px auto; padding: 20px; }
        code { background: #f5f5f5; padding: 2px 6px; border-radius: 4px; }
    </style>
</head>
<body>
    <h1>Firebird Web Admin</h1>
    <p>The frontend has not been built. Build it and point <code>STATIC_DIR</code> at the output directory.</p>
    <p>The REST API is available under <code>/api</code>:</p>
    <ul>
        <li><code>GET /api/config</code></li>
        <li><code>POST /api/connect</code></li>
        <li><code>GET /api/tables</code>, <code>/api/views</code>, <code>/api/procedures</code></li>
        <li><code>GET /api/table/{name}/data</code></li>
        <li><code>POST /api/execute</code></li>
    </ul>
</body>
</html>
"#;

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        html,
    )
        .into_response()
}
