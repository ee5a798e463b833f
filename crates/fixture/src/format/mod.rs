//! Fixture file formats
//!
//! Two on-disk layouts are understood, checked in a fixed order when a
//! fixture name is resolved: a flat XML file (`<name>.xml`) and a CSV
//! directory (`<name>/`). The order is part of the contract; the XML file wins
//! when both exist.

pub mod csv_dir;
pub mod flat_xml;

use dbfixture_common::Fixture;
use std::path::{Path, PathBuf};

use crate::error::FixtureResult;

/// Supported fixture layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixtureFormat {
    /// `<name>.xml`, one element per row
    FlatXml,

    /// `<name>/` holding `table-ordering.txt` and one `<table>.csv` per table
    CsvDirectory,
}

impl FixtureFormat {
    /// Order in which candidates are checked during resolution
    pub const RESOLUTION_ORDER: [FixtureFormat; 2] =
        [FixtureFormat::FlatXml, FixtureFormat::CsvDirectory];

    /// Candidate path for `name` inside `dir`
    pub fn candidate(&self, dir: &Path, name: &str) -> PathBuf {
        match self {
            Self::FlatXml => dir.join(format!("{}.xml", name)),
            Self::CsvDirectory => dir.join(name),
        }
    }

    /// Whether `path` holds a fixture in this format
    pub fn matches(&self, path: &Path) -> bool {
        match self {
            Self::FlatXml => path.is_file(),
            Self::CsvDirectory => path.join(csv_dir::TABLE_ORDERING).is_file(),
        }
    }

    /// Determine the format of an existing path
    pub fn detect(path: &Path) -> Option<Self> {
        if path.is_dir() {
            Self::CsvDirectory.matches(path).then_some(Self::CsvDirectory)
        } else if path.extension().map(|e| e == "xml").unwrap_or(false) {
            Some(Self::FlatXml)
        } else {
            None
        }
    }

    pub fn read(&self, path: &Path) -> FixtureResult<Fixture> {
        match self {
            Self::FlatXml => flat_xml::read_file(path),
            Self::CsvDirectory => csv_dir::read_dir(path),
        }
    }

    pub fn write(&self, fixture: &Fixture, path: &Path) -> FixtureResult<()> {
        match self {
            Self::FlatXml => flat_xml::write_file(fixture, path),
            Self::CsvDirectory => csv_dir::write_dir(fixture, path),
        }
    }
}

impl std::fmt::Display for FixtureFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FlatXml => write!(f, "flat XML"),
            Self::CsvDirectory => write!(f, "CSV directory"),
        }
    }
}
