//! Error types for fixture management

use std::path::PathBuf;
use thiserror::Error;

use crate::compare::AssertionReport;

#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Cannot open database connection: {0}")]
    Connection(#[source] dbfixture_common::Error),

    #[error("Snapshot backup to {} failed: {source}", path.display())]
    Backup {
        path: PathBuf,
        #[source]
        source: Box<FixtureError>,
    },

    #[error("Fixture not found: {name} (searched {})", dir.display())]
    FixtureNotFound { name: String, dir: PathBuf },

    #[error("Fixture parse error in {}: {reason}", path.display())]
    FixtureParse { path: PathBuf, reason: String },

    #[error("Applying fixture {name} failed: {source}")]
    FixtureApply {
        name: String,
        #[source]
        source: Box<FixtureError>,
    },

    #[error("Table contents differ from fixture:\n{0}")]
    AssertionMismatch(AssertionReport),

    #[error("No active database connection")]
    NotConnected,

    #[error("Invalid table name: {0:?}")]
    InvalidTableName(String),

    #[error("Invalid fixture content: {0}")]
    Format(String),

    #[error("{0}")]
    Common(#[from] dbfixture_common::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type FixtureResult<T> = Result<T, FixtureError>;
