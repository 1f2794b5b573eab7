//! Repository trait
//!
//! This trait defines one method per administrative operation. Every call
//! receives the caller's connection parameters and works against the live
//! database; implementations keep no state between calls.

use crate::database::value::Row;
use crate::schema::{
    Column, ConnectionParams, PageRequest, ProcedureParameter, QueryOutcome, Table, TableMetadata,
};
use async_trait::async_trait;
use thiserror::Error;

/// Data access for the admin API
#[async_trait]
pub trait AdminRepository: Send + Sync + 'static {
    /// Open a connection and close it again, to validate credentials
    async fn test_connection(&self, params: &ConnectionParams) -> Result<(), DatabaseError>;

    /// List user tables, ordered by name
    async fn list_tables(&self, params: &ConnectionParams) -> Result<Vec<Table>, DatabaseError>;

    /// List user views, ordered by name
    async fn list_views(&self, params: &ConnectionParams) -> Result<Vec<Table>, DatabaseError>;

    /// List user stored procedures, ordered by name
    async fn list_procedures(&self, params: &ConnectionParams)
        -> Result<Vec<Table>, DatabaseError>;

    /// Fetch one page of rows, each carrying its hex row-key, plus column metadata
    async fn get_data(
        &self,
        params: &ConnectionParams,
        table: &str,
        page: &PageRequest,
    ) -> Result<(Vec<Row>, Vec<Column>), DatabaseError>;

    /// Count all rows of a table
    async fn get_total_count(
        &self,
        params: &ConnectionParams,
        table: &str,
    ) -> Result<u64, DatabaseError>;

    /// Update the row identified by `row_key` with the given column values
    ///
    /// The row-key column is never written, even when present in `data`.
    async fn update_row(
        &self,
        params: &ConnectionParams,
        table: &str,
        row_key: &str,
        data: &Row,
    ) -> Result<(), DatabaseError>;

    /// Insert a new row
    async fn insert_row(
        &self,
        params: &ConnectionParams,
        table: &str,
        data: &Row,
    ) -> Result<(), DatabaseError>;

    /// Delete the row identified by `row_key`
    async fn delete_row(
        &self,
        params: &ConnectionParams,
        table: &str,
        row_key: &str,
    ) -> Result<(), DatabaseError>;

    /// PSQL source of a procedure (empty if the source is not stored)
    async fn get_procedure_source(
        &self,
        params: &ConnectionParams,
        procedure: &str,
    ) -> Result<String, DatabaseError>;

    /// Declared input parameters in declaration order
    async fn get_procedure_parameters(
        &self,
        params: &ConnectionParams,
        procedure: &str,
    ) -> Result<Vec<ProcedureParameter>, DatabaseError>;

    /// Call a procedure, selecting from it or executing it depending on its source
    async fn execute_procedure(
        &self,
        params: &ConnectionParams,
        procedure: &str,
        arguments: &Row,
    ) -> Result<QueryOutcome, DatabaseError>;

    /// Run an arbitrary statement without validation
    ///
    /// # Security Warning
    ///
    /// This executes anything the connected user is allowed to run.
    async fn execute_query(
        &self,
        params: &ConnectionParams,
        sql: &str,
    ) -> Result<QueryOutcome, DatabaseError>;

    /// Tables, views and procedures with their column or parameter names
    async fn get_all_metadata(
        &self,
        params: &ConnectionParams,
    ) -> Result<Vec<TableMetadata>, DatabaseError>;
}

/// Database error type
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The server could not be reached or refused the credentials
    #[error("{0}")]
    Connection(String),

    /// Error reported by the driver while running a statement
    #[error("{0}")]
    Query(String),

    /// Catalog object does not exist
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Client-supplied row-key is not valid hex
    #[error("invalid db_key format: {0:?}")]
    InvalidRowKey(String),

    /// Database locator could not be parsed
    #[error("invalid database locator: {0}")]
    InvalidLocator(String),

    /// Blocking task running the statement failed to complete
    #[error("database task failed: {0}")]
    Task(String),
}

impl DatabaseError {
    /// Whether the error was caused by client input rather than the database
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DatabaseError::InvalidRowKey(_) | DatabaseError::InvalidLocator(_)
        )
    }
}

impl From<rsfbclient::FbError> for DatabaseError {
    fn from(error: rsfbclient::FbError) -> Self {
        DatabaseError::Query(error.to_string())
    }
}

impl From<tokio::task::JoinError> for DatabaseError {
    fn from(error: tokio::task::JoinError) -> Self {
        DatabaseError::Task(error.to_string())
    }
}
