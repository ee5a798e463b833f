//! dbfixture common library
//!
//! Configuration, the in-memory dataset model and SQLite access shared by the
//! fixture lifecycle manager and the command-line tool.

pub mod config;
pub mod dataset;
pub mod db;
pub mod error;

// Re-export commonly used types
pub use config::FixtureConfig;
pub use dataset::{ColumnExclusions, Fixture, Table, Value};
pub use db::Database;
pub use error::{Error, Result};
