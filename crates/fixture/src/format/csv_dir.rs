//! CSV directory datasets
//!
//! A fixture named `orders_seed` is the directory `orders_seed/` holding
//! `table-ordering.txt` (one table per line) and `<table>.csv` for each listed
//! table. Every CSV starts with a header row; the literal `null` is NULL.

use csv::{ReaderBuilder, Writer};
use dbfixture_common::dataset::render;
use dbfixture_common::{Fixture, Table, Value};
use std::path::Path;
use tracing::debug;

use crate::error::FixtureResult;

pub const TABLE_ORDERING: &str = "table-ordering.txt";
pub const NULL: &str = "null";

/// Read every table listed in `table-ordering.txt`, in listed order
pub fn read_dir(dir: &Path) -> FixtureResult<Fixture> {
    let ordering = std::fs::read_to_string(dir.join(TABLE_ORDERING))?;

    let mut fixture = Fixture::new();
    for line in ordering.lines() {
        let name = line.trim();
        if name.is_empty() || name.starts_with('#') {
            continue;
        }
        fixture.push_table(read_table(name, &dir.join(format!("{}.csv", name)))?);
    }

    debug!("Read {} table(s) from {}", fixture.tables().len(), dir.display());
    Ok(fixture)
}

fn read_table(name: &str, path: &Path) -> FixtureResult<Table> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_path(path)?;

    let columns = reader
        .headers()?
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>();
    let mut table = Table::new(name, columns);

    for record in reader.records() {
        let record = record?;
        let values = record
            .iter()
            .map(|field| {
                if field == NULL {
                    Value::Null
                } else {
                    Value::Text(field.to_string())
                }
            })
            .collect();
        table.push_row(values)?;
    }

    Ok(table)
}

/// Write a fixture as a CSV directory, creating it when absent
pub fn write_dir(fixture: &Fixture, dir: &Path) -> FixtureResult<()> {
    std::fs::create_dir_all(dir)?;

    let mut ordering = String::new();
    for table in fixture.tables() {
        ordering.push_str(table.name());
        ordering.push('\n');

        let mut writer = Writer::from_path(dir.join(format!("{}.csv", table.name())))?;
        writer.write_record(table.columns())?;
        for values in table.rows() {
            writer.write_record(
                values
                    .iter()
                    .map(|v| render(v).unwrap_or_else(|| NULL.to_string())),
            )?;
        }
        writer.flush()?;
    }

    std::fs::write(dir.join(TABLE_ORDERING), ordering)?;
    Ok(())
}
