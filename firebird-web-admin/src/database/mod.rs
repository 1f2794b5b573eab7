//! Database access layer
//!
//! This module holds the Firebird-specific pieces: connection-string
//! normalization, SQL construction, value conversion and the repository.

pub mod connection;
pub mod firebird;
pub mod query;
pub mod traits;
pub mod value;

// Re-export the main trait
pub use firebird::FirebirdRepository;
pub use traits::{AdminRepository, DatabaseError};
pub use value::{CellValue, Row};
