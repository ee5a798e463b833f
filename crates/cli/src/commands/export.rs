//! Export Command

use anyhow::{Context as _, Result};
use clap::Args;
use dbfixture::{Fixture, FixtureFormat};
use serde::Serialize;

use super::Context;
use crate::output::{print_list, print_success, TableDisplay};

#[derive(Args)]
pub struct ExportArgs {
    /// Fixture name to write
    pub name: String,

    /// Table to export, in load order (repeatable)
    #[arg(short, long = "table", required = true)]
    pub tables: Vec<String>,

    /// Write a CSV directory instead of a flat XML file
    #[arg(long)]
    pub csv: bool,
}

/// Row count summary of one table
#[derive(Serialize)]
pub struct TableSummary {
    pub table: String,
    pub columns: usize,
    pub rows: usize,
}

impl TableSummary {
    pub fn from_fixture(fixture: &Fixture) -> Vec<Self> {
        fixture
            .tables()
            .iter()
            .map(|t| Self {
                table: t.name().to_string(),
                columns: t.columns().len(),
                rows: t.row_count(),
            })
            .collect()
    }
}

impl TableDisplay for TableSummary {
    fn headers() -> Vec<&'static str> {
        vec!["Table", "Columns", "Rows"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.table.clone(),
            self.columns.to_string(),
            self.rows.to_string(),
        ]
    }
}

pub fn execute(args: ExportArgs, ctx: &Context) -> Result<()> {
    let database = ctx.connect()?;
    let fixture = database
        .export(args.tables.as_slice())
        .context("exporting tables")?;

    let format = if args.csv {
        FixtureFormat::CsvDirectory
    } else {
        FixtureFormat::FlatXml
    };
    let path = format.candidate(ctx.data_dir(), &args.name);
    format
        .write(&fixture, &path)
        .with_context(|| format!("writing {}", path.display()))?;
    database.close()?;

    print_list(&TableSummary::from_fixture(&fixture), ctx.format);
    print_success(
        &format!("Exported {} as {} to {}", args.name, format, path.display()),
        ctx.format,
    );
    Ok(())
}
