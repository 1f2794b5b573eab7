//! AdminLayer - assembles the complete HTTP application
//!
//! The REST API is mounted under `/api`, the frontend build is served for
//! every other path.

use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::{create_api_router, AdminState};
use crate::config::AdminConfig;
use crate::database::firebird::FirebirdRepository;
use crate::database::traits::AdminRepository;
use crate::frontend::create_frontend_router;

/// Firebird admin backend as an Axum application
///
/// # Example
///
/// ```rust,no_run
/// use firebird_web_admin::{AdminConfig, AdminLayer};
///
/// # async fn example() {
/// let config = AdminConfig::default();
/// let listener = tokio::net::TcpListener::bind(config.bind_address).await.unwrap();
/// let app = AdminLayer::firebird(config).into_router();
/// axum::serve(listener, app).await.unwrap();
/// # }
/// ```
pub struct AdminLayer<R: AdminRepository> {
    config: AdminConfig,
    repository: Arc<R>,
}

impl<R: AdminRepository> AdminLayer<R> {
    /// Create the application around any repository implementation
    pub fn new(config: AdminConfig, repository: R) -> Self {
        Self {
            config,
            repository: Arc::new(repository),
        }
    }

    /// Convert into an Axum Router
    ///
    /// The returned router includes:
    /// - API endpoints at `/api/*`
    /// - Frontend serving for every other path
    /// - Request tracing and permissive CORS
    pub fn into_router(self) -> Router {
        let frontend_router = create_frontend_router(&self.config.static_directory);
        let state = Arc::new(AdminState::new(self.config, self.repository));

        Router::new()
            .nest("/api", create_api_router(state))
            .merge(frontend_router)
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
    }
}

impl AdminLayer<FirebirdRepository> {
    /// Create the application backed by real Firebird connections
    pub fn firebird(config: AdminConfig) -> Self {
        Self::new(config, FirebirdRepository::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenIssuer;
    use crate::testing::{sample_params, MockRepository};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use axum::response::Response;
    use serde_json::{json, Value};
    use std::path::PathBuf;
    use tower::ServiceExt;

    const SECRET: &str = "router-test-secret";

    fn test_config() -> AdminConfig {
        AdminConfig {
            jwt_secret: SECRET.to_string(),
            static_directory: PathBuf::from("/nonexistent/fbadmin-dist"),
            version: "1.2.3".to_string(),
            ..AdminConfig::default()
        }
    }

    /// Router over a shared mock so tests can inspect recorded calls
    fn router(config: AdminConfig, repository: Arc<MockRepository>) -> Router {
        let state = Arc::new(AdminState::new(config, repository));
        Router::new().nest("/api", create_api_router(state))
    }

    fn bearer() -> String {
        let token = TokenIssuer::new(SECRET).issue(&sample_params()).unwrap();
        format!("Bearer {}", token)
    }

    fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, bearer());
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_config_endpoint_is_public() {
        let repository = Arc::new(MockRepository::with_rows(0));
        let response = router(test_config(), repository)
            .oneshot(Request::get("/api/config").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"demo": false, "version": "1.2.3"})
        );
    }

    #[tokio::test]
    async fn test_demo_mode_rejects_other_databases() {
        let repository = Arc::new(MockRepository::with_rows(0));
        let config = AdminConfig {
            demo_mode: true,
            ..test_config()
        };

        let body = json!({"database": "firebird5:other", "user": "SYSDBA", "password": "x"});
        let response = router(config, repository.clone())
            .oneshot(
                Request::post("/api/connect")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            json_body(response).await["error"],
            "Demo mode: only firebird5:employee allowed"
        );
        assert!(repository.calls().is_empty());
    }

    #[tokio::test]
    async fn test_connect_issues_usable_token() {
        let repository = Arc::new(MockRepository::with_rows(3));
        let app = router(test_config(), repository.clone());

        let body = serde_json::to_string(&sample_params()).unwrap();
        let response = app
            .clone()
            .oneshot(
                Request::post("/api/connect")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let token = json_body(response).await["token"]
            .as_str()
            .unwrap()
            .to_string();

        // bare token without the Bearer prefix
        let response = app
            .oneshot(
                Request::get("/api/tables")
                    .header(header::AUTHORIZATION, token)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!([{"name": "EMPLOYEE"}]));
        assert_eq!(
            repository.calls(),
            vec!["test_connection firebird5:employee", "list_tables"]
        );
    }

    #[tokio::test]
    async fn test_connect_failure_is_unauthorized() {
        let repository = Arc::new(MockRepository::with_rows(0));
        let body = json!({"database": "firebird5:employee", "user": "SYSDBA", "password": "wrong"});

        let response = router(test_config(), repository)
            .oneshot(
                Request::post("/api/connect")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let error = json_body(response).await["error"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(error.starts_with("Connection failed: "));
    }

    #[tokio::test]
    async fn test_unparsable_locator_is_bad_request() {
        let repository = Arc::new(MockRepository::with_rows(0));
        let body = json!({"database": "db-host/not-a-port:employee", "user": "SYSDBA", "password": "masterkey"});

        let response = router(test_config(), repository)
            .oneshot(
                Request::post("/api/connect")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error = json_body(response).await["error"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(error.starts_with("invalid database locator"));
    }

    #[tokio::test]
    async fn test_malformed_connect_body_is_bad_request() {
        let repository = Arc::new(MockRepository::with_rows(0));
        let response = router(test_config(), repository.clone())
            .oneshot(
                Request::post("/api/connect")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{\"database\": 1"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(repository.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let repository = Arc::new(MockRepository::with_rows(5));
        let response = router(test_config(), repository.clone())
            .oneshot(Request::get("/api/tables").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await, json!({"error": "Missing token"}));
        assert!(repository.calls().is_empty());
    }

    #[tokio::test]
    async fn test_token_signed_with_other_secret_is_rejected() {
        let repository = Arc::new(MockRepository::with_rows(5));
        let token = TokenIssuer::new("other").issue(&sample_params()).unwrap();

        let response = router(test_config(), repository)
            .oneshot(
                Request::get("/api/views")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await, json!({"error": "Invalid token"}));
    }

    #[tokio::test]
    async fn test_pagination_carries_total() {
        let repository = Arc::new(MockRepository::with_rows(57));
        let response = router(test_config(), repository.clone())
            .oneshot(request(
                Method::GET,
                "/api/table/EMPLOYEE/data?limit=10&offset=20&sortField=ID&sortOrder=desc",
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let page = json_body(response).await;
        assert_eq!(page["total"], 57);
        assert_eq!(page["limit"], 10);
        assert_eq!(page["offset"], 20);
        assert_eq!(page["sortField"], "ID");
        assert_eq!(page["sortOrder"], "desc");
        assert_eq!(page["data"].as_array().unwrap().len(), 10);
        assert_eq!(page["data"][0]["ID"], 21);
        assert_eq!(page["columns"][0]["read_only"], true);
        assert_eq!(
            repository.calls(),
            vec!["get_data EMPLOYEE 10/20", "get_total_count EMPLOYEE"]
        );
    }

    #[tokio::test]
    async fn test_invalid_pagination_falls_back_to_defaults() {
        let repository = Arc::new(MockRepository::with_rows(5));
        let response = router(test_config(), repository.clone())
            .oneshot(request(
                Method::GET,
                "/api/table/EMPLOYEE/data?limit=abc&offset=-4",
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(repository.calls()[0], "get_data EMPLOYEE 100/0");
    }

    #[tokio::test]
    async fn test_update_requires_db_key() {
        let repository = Arc::new(MockRepository::with_rows(5));
        let response = router(test_config(), repository.clone())
            .oneshot(request(
                Method::PUT,
                "/api/table/EMPLOYEE/data",
                Some(json!({"data": {"FIRST_NAME": "Robert"}})),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await, json!({"error": "Missing db_key"}));
        assert!(repository.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_row() {
        let repository = Arc::new(MockRepository::with_rows(5));
        let response = router(test_config(), repository.clone())
            .oneshot(request(
                Method::PUT,
                "/api/table/EMPLOYEE/data",
                Some(json!({"db_key": "0000000000000001", "data": {"FIRST_NAME": "Robert", "PHONE_EXT": null}})),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"status": "success"}));
        assert_eq!(
            repository.calls(),
            vec!["update_row EMPLOYEE 0000000000000001 2"]
        );
    }

    #[tokio::test]
    async fn test_insert_and_delete_rows() {
        let repository = Arc::new(MockRepository::with_rows(5));
        let app = router(test_config(), repository.clone());

        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/table/COUNTRY/data",
                Some(json!({"data": {"COUNTRY": "Iceland", "CURRENCY": "Krona"}})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(request(
                Method::DELETE,
                "/api/table/COUNTRY/data",
                Some(json!({"db_key": ""})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(request(
                Method::DELETE,
                "/api/table/COUNTRY/data",
                Some(json!({"db_key": "00000000000000aa"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        assert_eq!(
            repository.calls(),
            vec!["insert_row COUNTRY 2", "delete_row COUNTRY 00000000000000aa"]
        );
    }

    #[tokio::test]
    async fn test_empty_sql_is_bad_request() {
        let repository = Arc::new(MockRepository::with_rows(5));
        let response = router(test_config(), repository.clone())
            .oneshot(request(
                Method::POST,
                "/api/execute",
                Some(json!({"sql": "   "})),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            json!({"error": "Missing SQL statement"})
        );
        assert!(repository.calls().is_empty());
    }

    #[tokio::test]
    async fn test_execute_returns_rows() {
        let repository = Arc::new(MockRepository::with_rows(5));
        let response = router(test_config(), repository)
            .oneshot(request(
                Method::POST,
                "/api/execute",
                Some(json!({"sql": "SELECT * FROM EMPLOYEE"})),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let outcome = json_body(response).await;
        assert_eq!(outcome["total"], 3);
        assert_eq!(outcome["data"][2]["ID"], 3);
    }

    #[tokio::test]
    async fn test_repository_error_is_internal() {
        let repository = Arc::new(MockRepository::failing("Table unknown"));
        let response = router(test_config(), repository)
            .oneshot(request(Method::GET, "/api/table/MISSING/data", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await, json!({"error": "Table unknown"}));
    }

    #[tokio::test]
    async fn test_procedure_endpoints() {
        let repository = Arc::new(MockRepository::with_rows(0));
        let app = router(test_config(), repository.clone());

        let response = app
            .clone()
            .oneshot(request(Method::GET, "/api/procedure/GET_EMP_PROJ/source", None))
            .await
            .unwrap();
        assert_eq!(
            json_body(response).await,
            json!({"source": "BEGIN SUSPEND; END"})
        );

        let response = app
            .clone()
            .oneshot(request(
                Method::GET,
                "/api/procedure/GET_EMP_PROJ/parameters",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(
            json_body(response).await,
            json!([{"name": "EMP_NO", "type": "SMALLINT"}])
        );

        // empty body runs with no arguments
        let response = app
            .oneshot(request(
                Method::POST,
                "/api/procedure/GET_EMP_PROJ/execute",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["data"][0]["PROJ_ID"], "VBASE");

        assert_eq!(
            repository.calls(),
            vec![
                "get_procedure_source GET_EMP_PROJ",
                "get_procedure_parameters GET_EMP_PROJ",
                "execute_procedure GET_EMP_PROJ 0",
            ]
        );
    }

    #[tokio::test]
    async fn test_metadata_endpoint() {
        let repository = Arc::new(MockRepository::with_rows(0));
        let response = router(test_config(), repository)
            .oneshot(request(Method::GET, "/api/metadata", None))
            .await
            .unwrap();

        assert_eq!(
            json_body(response).await,
            json!([{"name": "EMPLOYEE", "type": "TABLE", "columns": ["EMP_NO", "FIRST_NAME"]}])
        );
    }

    #[tokio::test]
    async fn test_full_router_serves_api_and_frontend_notice() {
        let app = AdminLayer::new(test_config(), MockRepository::with_rows(0)).into_router();

        let response = app
            .clone()
            .oneshot(Request::get("/api/config").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
