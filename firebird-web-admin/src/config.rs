//! Server configuration
//!
//! Values come from environment variables and are passed explicitly into the
//! router; nothing reads the environment after startup.

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Locator allowed in demo mode unless `DEMO_DATABASE` overrides it
pub const DEFAULT_DEMO_DATABASE: &str = "firebird5:employee";

/// Signing key used when `JWT_SECRET` is not set; only fit for local use
pub const DEVELOPMENT_JWT_SECRET: &str = "super-secret-key-change-me";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: &'static str, message: String },
}

/// Runtime configuration of the admin backend
#[derive(Clone)]
pub struct AdminConfig {
    /// Address the HTTP server listens on
    pub bind_address: SocketAddr,

    /// Restrict connections to `demo_database`
    pub demo_mode: bool,

    /// The single locator accepted in demo mode
    pub demo_database: String,

    /// HS256 key for session tokens
    pub jwt_secret: String,

    /// Directory holding the built frontend (`index.html`, `assets/`)
    pub static_directory: PathBuf,

    /// Version reported by `GET /api/config`
    pub version: String,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("AdminConfig")
            .field("bind_address", &self.bind_address)
            .field("demo_mode", &self.demo_mode)
            .field("demo_database", &self.demo_database)
            .field("jwt_secret", &"<redacted>")
            .field("static_directory", &self.static_directory)
            .field("version", &self.version)
            .finish()
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8080)),
            demo_mode: false,
            demo_database: DEFAULT_DEMO_DATABASE.to_string(),
            jwt_secret: DEVELOPMENT_JWT_SECRET.to_string(),
            static_directory: PathBuf::from("./dist"),
            version: "unknown".to_string(),
        }
    }
}

impl AdminConfig {
    /// Load configuration from the process environment
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `BIND_ADDRESS` | `0.0.0.0:8080` |
    /// | `DEMO_MODE` | `false` |
    /// | `DEMO_DATABASE` | `firebird5:employee` |
    /// | `JWT_SECRET` | development secret |
    /// | `STATIC_DIR` | `./dist` |
    /// | `VERSION_FILE` | `VERSION` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let bind_address = match value("BIND_ADDRESS") {
            Some(address) => {
                address
                    .trim()
                    .parse()
                    .map_err(|error: std::net::AddrParseError| ConfigError::InvalidValue {
                        field: "BIND_ADDRESS",
                        message: error.to_string(),
                    })?
            }
            None => defaults.bind_address,
        };

        let version_file = value("VERSION_FILE").unwrap_or_else(|| "VERSION".to_string());

        Ok(Self {
            bind_address,
            demo_mode: value("DEMO_MODE")
                .map(|flag| flag.trim() == "true")
                .unwrap_or(false),
            demo_database: value("DEMO_DATABASE").unwrap_or(defaults.demo_database),
            jwt_secret: value("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            static_directory: value("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_directory),
            version: read_version(&version_file),
        })
    }

    /// Whether a connect request for `database` may proceed
    pub fn permits_database(&self, database: &str) -> bool {
        !self.demo_mode || database == self.demo_database
    }

    pub fn uses_development_secret(&self) -> bool {
        self.jwt_secret == DEVELOPMENT_JWT_SECRET
    }
}

/// Trimmed content of the version file, or `unknown`
fn read_version(path: &str) -> String {
    std::fs::read_to_string(path)
        .ok()
        .map(|content| content.trim().to_string())
        .filter(|version| !version.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}
