//! # firebird-web-admin
//!
//! REST backend for a browser-based Firebird administration tool, built as an
//! Axum application.
//!
//! ## Features
//!
//! - Connect with a database locator and credentials, receive a session token
//! - List tables, views and stored procedures
//! - Paginated, sortable table data with edits, inserts and deletes by row-key
//! - Stored procedure source, parameters and execution
//! - Ad-hoc SQL execution and a metadata aggregate for editor completion
//! - Optional demo mode restricting connections to one database
//!
//! ## Security Warning
//!
//! The session token carries the database credentials (signed, not
//! encrypted). Serve the backend over TLS and set a real `JWT_SECRET`.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use firebird_web_admin::{AdminConfig, AdminLayer};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AdminConfig::from_env().unwrap();
//!     let listener = tokio::net::TcpListener::bind(config.bind_address)
//!         .await
//!         .unwrap();
//!
//!     axum::serve(listener, AdminLayer::firebird(config).into_router())
//!         .await
//!         .unwrap();
//! }
//! ```

// Public modules
pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod frontend;
pub mod layer;
pub mod schema;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

// Public exports
pub use auth::{AuthError, TokenIssuer};
pub use config::{AdminConfig, ConfigError};
pub use layer::AdminLayer;
pub use schema::{Column, ConnectionParams, DataPage, QueryOutcome, Table, TableMetadata};
pub use service::AdminService;

// Re-export the repository seam
pub use database::traits::{AdminRepository, DatabaseError};
pub use database::FirebirdRepository;

// Error type
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
