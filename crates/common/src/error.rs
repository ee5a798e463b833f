//! Error types for dbfixture-common

use thiserror::Error;

/// Result type alias using the common Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by configuration loading and database access
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unsupported datasource driver: {0}")]
    UnsupportedDriver(String),

    #[error("Invalid table name: {0:?}")]
    InvalidTableName(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Row width mismatch in table {table}: expected {expected} values, got {actual}")]
    RowWidth {
        table: String,
        expected: usize,
        actual: usize,
    },
}
