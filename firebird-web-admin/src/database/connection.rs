//! Firebird connection-string handling
//!
//! Users type locators in the classic Firebird forms:
//! - `host:path` (e.g. `localhost:/data/employee.fdb`)
//! - `host/port:path` (e.g. `10.0.0.5/3051:employee`)
//! - a bare alias registered in `databases.conf`
//!
//! These are rewritten into the `host[:port]/path` form and split into the
//! parts the driver builder expects.

use crate::database::traits::DatabaseError;
use crate::schema::ConnectionParams;
use tracing::debug;

/// Host used when the locator is a bare alias
pub const DEFAULT_HOST: &str = "localhost";

/// Standard Firebird server port
pub const DEFAULT_PORT: u16 = 3050;

/// Open connection type produced by [`connect`]
pub type FirebirdConnection = rsfbclient::Connection<rsfbclient_rust::RustFbClient>;

/// The three accepted locator shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LocatorParts<'a> {
    Alias(&'a str),
    HostPath { host: &'a str, path: &'a str },
    HostPortPath { host: &'a str, port: &'a str, path: &'a str },
}

impl<'a> LocatorParts<'a> {
    /// Split at the first colon; a slash before it separates host and port
    fn split(locator: &'a str) -> Self {
        let Some(colon_index) = locator.find(':') else {
            return LocatorParts::Alias(locator);
        };

        let before_colon = &locator[..colon_index];
        let path = &locator[colon_index + 1..];

        match before_colon.rfind('/') {
            Some(slash_index) => LocatorParts::HostPortPath {
                host: &before_colon[..slash_index],
                port: &before_colon[slash_index + 1..],
                path,
            },
            None => LocatorParts::HostPath {
                host: before_colon,
                path,
            },
        }
    }
}

/// Rewrite a user-supplied locator into `host[:port]/path`, or leave an alias unchanged
pub fn normalize_locator(locator: &str) -> String {
    match LocatorParts::split(locator) {
        LocatorParts::Alias(alias) => alias.to_string(),
        LocatorParts::HostPath { host, path } => format!("{}/{}", host, path),
        LocatorParts::HostPortPath { host, port, path } => format!("{}:{}/{}", host, port, path),
    }
}

/// Driver-style connection string `user:password@host[:port]/path`
pub fn connection_string(params: &ConnectionParams) -> String {
    format!(
        "{}:{}@{}",
        params.user,
        params.password,
        normalize_locator(&params.database)
    )
}

/// Structured form of a locator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseLocator {
    /// `None` for an alias, which is resolved by the local server
    pub host: Option<String>,
    pub port: Option<u16>,
    /// File path or alias
    pub path: String,
}

impl DatabaseLocator {
    pub fn parse(locator: &str) -> Result<Self, DatabaseError> {
        let locator = locator.trim();
        if locator.is_empty() {
            return Err(DatabaseError::InvalidLocator(
                "database must not be empty".to_string(),
            ));
        }

        match LocatorParts::split(locator) {
            LocatorParts::Alias(alias) => Ok(Self {
                host: None,
                port: None,
                path: alias.to_string(),
            }),
            LocatorParts::HostPath { host, path } => Ok(Self {
                host: non_empty(host),
                port: None,
                path: path.to_string(),
            }),
            LocatorParts::HostPortPath { host, port, path } => {
                let port = port.parse::<u16>().map_err(|_| {
                    DatabaseError::InvalidLocator(format!("invalid port number: {:?}", port))
                })?;
                Ok(Self {
                    host: non_empty(host),
                    port: Some(port),
                    path: path.to_string(),
                })
            }
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Open a fresh connection for one operation
///
/// The connection is closed when the returned value is dropped.
pub fn connect(params: &ConnectionParams) -> Result<FirebirdConnection, DatabaseError> {
    let locator = DatabaseLocator::parse(&params.database)?;
    let host = locator.host.as_deref().unwrap_or(DEFAULT_HOST);
    let port = locator.port.unwrap_or(DEFAULT_PORT);

    debug!(
        host,
        port,
        database = %locator.path,
        locator = %normalize_locator(params.database.trim()),
        user = %params.user,
        "opening Firebird connection"
    );

    rsfbclient::builder_pure_rust()
        .host(host)
        .port(port)
        .db_name(locator.path.as_str())
        .user(params.user.as_str())
        .pass(params.password.as_str())
        .charset(rsfbclient::charset::UTF_8)
        .connect()
        .map_err(|error| DatabaseError::Connection(error.to_string()))
}
