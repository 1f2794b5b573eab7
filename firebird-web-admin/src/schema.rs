//! Request and response types for the admin API
//!
//! These types mirror Firebird catalog rows and the JSON bodies exchanged with
//! the web frontend. They are created fresh per request and never persisted.

use serde::{Deserialize, Serialize};

use crate::database::value::Row;

/// Credentials and locator needed to open a Firebird connection
///
/// Carried inside the bearer token; the server keeps no copy.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionParams {
    /// Locator such as `localhost:/var/lib/firebird/data/employee.fdb`,
    /// `host/3050:alias` or a bare alias
    pub database: String,

    /// Database user
    pub user: String,

    /// Database password
    pub password: String,
}

impl std::fmt::Debug for ConnectionParams {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ConnectionParams")
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A named catalog object (table, view or procedure)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Table {
    pub name: String,
}

/// Column metadata returned alongside row data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Column {
    /// Column name as reported by the driver
    pub name: String,

    /// Human readable SQL type (e.g. "VARCHAR(40)", "INTEGER")
    #[serde(rename = "type")]
    pub data_type: String,

    /// Computed columns and the row-key cannot be edited
    pub read_only: bool,
}

/// Input parameter of a stored procedure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcedureParameter {
    pub name: String,

    #[serde(rename = "type")]
    pub data_type: String,
}

/// Kind of object listed in the metadata aggregate
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum MetadataKind {
    Table,
    View,
    Procedure,
}

/// Object metadata used by the SQL editor for autocompletion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableMetadata {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: MetadataKind,

    /// Column names for relations, input parameter names for procedures
    pub columns: Vec<String>,
}

/// Sort direction for paged data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    /// Parse the `sortOrder` query parameter; anything but `desc` sorts ascending
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("desc") {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

/// Resolved pagination and sorting for a data page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u32,
    pub offset: u32,
    pub sort_field: Option<String>,
    pub sort_order: SortOrder,
}

/// Default number of rows returned when `limit` is absent or invalid
pub const DEFAULT_PAGE_LIMIT: u32 = 100;

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
            sort_field: None,
            sort_order: SortOrder::Ascending,
        }
    }
}

/// Raw query string of `GET /api/table/{name}/data`
///
/// Values are kept as strings so that malformed numbers fall back to the
/// defaults instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub sort_field: Option<String>,
    pub sort_order: Option<String>,
}

impl DataQuery {
    pub fn to_page_request(&self) -> PageRequest {
        let limit = self
            .limit
            .as_deref()
            .and_then(|value| value.trim().parse::<i64>().ok())
            .filter(|value| *value > 0)
            .map(|value| value.min(u32::MAX as i64) as u32)
            .unwrap_or(DEFAULT_PAGE_LIMIT);

        let offset = self
            .offset
            .as_deref()
            .and_then(|value| value.trim().parse::<i64>().ok())
            .filter(|value| *value >= 0)
            .map(|value| value.min(u32::MAX as i64) as u32)
            .unwrap_or(0);

        let sort_field = self
            .sort_field
            .as_deref()
            .map(str::trim)
            .filter(|field| !field.is_empty())
            .map(str::to_string);

        let sort_order = self
            .sort_order
            .as_deref()
            .map(SortOrder::parse)
            .unwrap_or_default();

        PageRequest {
            limit,
            offset,
            sort_field,
            sort_order,
        }
    }
}

/// One page of table data plus the unfiltered row count
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPage {
    pub data: Vec<Row>,
    pub columns: Vec<Column>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
    /// Echo of the requested sort field ("" when unsorted)
    pub sort_field: String,
    /// Echo of the requested sort order ("" when absent)
    pub sort_order: String,
}

/// Rows produced by ad-hoc SQL or a procedure call
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryOutcome {
    pub data: Vec<Row>,
    pub columns: Vec<Column>,
    /// Number of rows in `data`
    pub total: usize,
}

impl QueryOutcome {
    pub fn new(data: Vec<Row>, columns: Vec<Column>) -> Self {
        let total = data.len();
        Self {
            data,
            columns,
            total,
        }
    }
}

/// Body of `PUT /api/table/{name}/data`
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRequest {
    #[serde(default)]
    pub db_key: String,

    #[serde(default)]
    pub data: Row,
}

/// Body of `POST /api/table/{name}/data`
#[derive(Debug, Clone, Deserialize)]
pub struct InsertRequest {
    #[serde(default)]
    pub data: Row,
}

/// Body of `DELETE /api/table/{name}/data`
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteRequest {
    #[serde(default)]
    pub db_key: String,
}

/// Body of `POST /api/execute`
#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteRequest {
    #[serde(default)]
    pub sql: String,
}

/// Response of `POST /api/connect`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectResponse {
    pub token: String,
}

/// Response of `GET /api/config`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigResponse {
    pub demo: bool,
    pub version: String,
}

/// Response of `GET /api/procedure/{name}/source`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceResponse {
    pub source: String,
}

/// Acknowledgement for row mutations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn success() -> Self {
        Self {
            status: "success".to_string(),
        }
    }
}
