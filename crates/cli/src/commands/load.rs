//! Load Command

use anyhow::{Context as _, Result};
use clap::Args;

use super::export::TableSummary;
use super::{exclusions, parse_column_ref, Context};
use crate::output::{print_list, print_success};

#[derive(Args)]
pub struct LoadArgs {
    /// Fixture name
    pub name: String,

    /// Column to leave out, as table.column (repeatable)
    #[arg(long = "exclude", value_parser = parse_column_ref)]
    pub exclude: Vec<(String, String)>,
}

/// Clean-insert without snapshot or restore; the database keeps the fixture.
pub fn execute(args: LoadArgs, ctx: &Context) -> Result<()> {
    let fixture = ctx
        .resolver()
        .load(&args.name, &exclusions(&args.exclude))?;

    let mut database = ctx.connect()?;
    database
        .clean_insert(&fixture)
        .with_context(|| format!("clean-inserting {}", args.name))?;
    database.close()?;

    print_list(&TableSummary::from_fixture(&fixture), ctx.format);
    print_success(&format!("Loaded {}", args.name), ctx.format);
    Ok(())
}
