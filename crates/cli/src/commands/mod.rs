//! CLI Commands

use anyhow::{Context as _, Result};
use dbfixture::{ColumnExclusions, Database, FixtureConfig, FixtureResolver};
use std::path::Path;
use std::sync::Arc;

use crate::output::OutputFormat;

pub mod check;
pub mod export;
pub mod list;
pub mod load;

/// State shared by every command
pub struct Context {
    pub config: Arc<FixtureConfig>,
    pub format: OutputFormat,
}

impl Context {
    pub fn data_dir(&self) -> &Path {
        &self.config.fixtures.data_dir
    }

    pub fn resolver(&self) -> FixtureResolver {
        FixtureResolver::new(self.data_dir())
    }

    pub fn connect(&self) -> Result<Database> {
        Database::connect(&self.config.datasource)
            .with_context(|| format!("connecting to {}", self.config.datasource.url))
    }
}

/// Parse a `table.column` exclusion argument
pub fn parse_column_ref(s: &str) -> Result<(String, String), String> {
    match s.split_once('.') {
        Some((table, column)) if !table.is_empty() && !column.is_empty() => {
            Ok((table.to_string(), column.to_string()))
        }
        _ => Err(format!("expected <table>.<column>, got {:?}", s)),
    }
}

pub fn exclusions(refs: &[(String, String)]) -> ColumnExclusions {
    let mut exclusions = ColumnExclusions::new();
    for (table, column) in refs {
        exclusions.insert(table, [column.as_str()]);
    }
    exclusions
}
