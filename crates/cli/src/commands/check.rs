//! Check Command

use anyhow::{Context as _, Result};
use clap::Args;
use dbfixture::{check_fixture, AssertionReport};
use serde::Serialize;

use super::{exclusions, parse_column_ref, Context};
use crate::output::{print_error, print_list, print_success, TableDisplay};

#[derive(Args)]
pub struct CheckArgs {
    /// Expected fixture name
    pub name: String,

    /// Only compare these tables (repeatable); defaults to the fixture's tables
    #[arg(short, long = "table")]
    pub tables: Vec<String>,

    /// Column to ignore, as table.column (repeatable)
    #[arg(long = "exclude", value_parser = parse_column_ref)]
    pub exclude: Vec<(String, String)>,
}

/// Outcome for one compared table
#[derive(Serialize)]
pub struct CheckRow {
    pub table: String,
    pub matches: bool,
    pub detail: String,
}

impl TableDisplay for CheckRow {
    fn headers() -> Vec<&'static str> {
        vec!["Table", "Result", "Detail"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.table.clone(),
            if self.matches { "ok" } else { "differs" }.to_string(),
            self.detail.clone(),
        ]
    }
}

fn rows(tables: &[String], report: &AssertionReport) -> Vec<CheckRow> {
    tables
        .iter()
        .map(|table| {
            let mismatch = report.mismatches.iter().find(|m| &m.table == table);
            CheckRow {
                table: table.clone(),
                matches: mismatch.is_none(),
                detail: mismatch
                    .map(|m| m.discrepancy.to_string())
                    .unwrap_or_default(),
            }
        })
        .collect()
}

/// Returns whether every compared table matched
pub fn execute(args: CheckArgs, ctx: &Context) -> Result<bool> {
    let exclusions = exclusions(&args.exclude);
    let expected = ctx.resolver().load(&args.name, &exclusions)?;
    let targets = if args.tables.is_empty() {
        expected.table_names()
    } else {
        args.tables
    };

    let database = ctx.connect()?;
    let report = check_fixture(&database, &args.name, &expected, Some(targets.as_slice()), &exclusions)
        .with_context(|| format!("checking {}", args.name))?;
    database.close()?;

    print_list(&rows(&targets, &report), ctx.format);
    if report.is_empty() {
        print_success(&format!("Database matches {}", args.name), ctx.format);
        Ok(true)
    } else {
        print_error(&report.to_string());
        Ok(false)
    }
}
