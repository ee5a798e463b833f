//! In-memory dataset model: tables, fixtures and column exclusions

use base64::Engine;
use std::collections::{BTreeMap, BTreeSet};

use crate::{Error, Result};

/// A single cell. Values parsed from fixture files are `Text` or `Null`;
/// values read from the database keep their SQLite storage class.
pub use rusqlite::types::Value;

/// Render a cell the way it is compared and written to fixture files.
/// `None` means NULL.
pub fn render(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Integer(i) => Some(i.to_string()),
        Value::Real(f) => Some(f.to_string()),
        Value::Text(s) => Some(s.clone()),
        Value::Blob(b) => Some(base64::engine::general_purpose::STANDARD.encode(b)),
    }
}

/// Whether an expected cell matches an actual one.
///
/// Cells match when their rendered text is equal. When either side is a
/// numeric storage class, numerically equal text also matches, so a fixture
/// value of `1.50` matches a REAL column holding `1.5`.
pub fn values_match(expected: &Value, actual: &Value) -> bool {
    let (e, a) = (render(expected), render(actual));
    if e == a {
        return true;
    }
    let numeric = |v: &Value| matches!(v, Value::Integer(_) | Value::Real(_));
    if !(numeric(expected) || numeric(actual)) {
        return false;
    }
    match (e, a) {
        (Some(e), Some(a)) => match (e.trim().parse::<f64>(), a.trim().parse::<f64>()) {
            (Ok(e), Ok(a)) => e == a,
            _ => false,
        },
        _ => false,
    }
}

/// An ordered table snapshot. Every row holds one value per column.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column, matched ASCII-case-insensitively
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
    }

    /// Cell at `row` for `column`
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// Append a row; its width must equal the column count
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::RowWidth {
                table: self.name.clone(),
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Add a column, back-filling existing rows with NULL.
    /// Returns the index of the (possibly pre-existing) column.
    pub fn ensure_column(&mut self, column: &str) -> usize {
        if let Some(idx) = self.column_index(column) {
            return idx;
        }
        self.columns.push(column.to_string());
        for row in &mut self.rows {
            row.push(Value::Null);
        }
        self.columns.len() - 1
    }

    /// Copy of this table without the columns excluded for it
    pub fn without_columns(&self, exclusions: &ColumnExclusions) -> Table {
        let keep: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| !exclusions.is_excluded(&self.name, c))
            .map(|(i, _)| i)
            .collect();

        if keep.len() == self.columns.len() {
            return self.clone();
        }

        Table {
            name: self.name.clone(),
            columns: keep.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| keep.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        }
    }
}

/// A named, ordered collection of tables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fixture {
    tables: Vec<Table>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tables(tables: Vec<Table>) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables.iter().map(|t| t.name.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Table by name, matched ASCII-case-insensitively
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Table by name, created empty at the end when absent
    pub fn table_entry(&mut self, name: &str) -> &mut Table {
        let idx = match self
            .tables
            .iter()
            .position(|t| t.name.eq_ignore_ascii_case(name))
        {
            Some(idx) => idx,
            None => {
                self.tables.push(Table::new(name, Vec::new()));
                self.tables.len() - 1
            }
        };
        &mut self.tables[idx]
    }

    /// Append a table. A table with the same name is replaced in place.
    pub fn push_table(&mut self, table: Table) {
        match self
            .tables
            .iter()
            .position(|t| t.name.eq_ignore_ascii_case(&table.name))
        {
            Some(idx) => self.tables[idx] = table,
            None => self.tables.push(table),
        }
    }

    /// Copy of this fixture with excluded columns removed from every table
    pub fn filtered(&self, exclusions: &ColumnExclusions) -> Fixture {
        if exclusions.is_empty() {
            return self.clone();
        }
        Fixture {
            tables: self
                .tables
                .iter()
                .map(|t| t.without_columns(exclusions))
                .collect(),
        }
    }
}

/// Per-table column names left out of inserts and comparisons.
///
/// Table and column names are matched ASCII-case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnExclusions {
    tables: BTreeMap<String, BTreeSet<String>>,
}

impl ColumnExclusions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`ColumnExclusions::insert`]
    pub fn exclude<I, S>(mut self, table: &str, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.insert(table, columns);
        self
    }

    pub fn insert<I, S>(&mut self, table: &str, columns: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entry = self.tables.entry(table.to_ascii_lowercase()).or_default();
        entry.extend(columns.into_iter().map(|c| c.as_ref().to_ascii_lowercase()));
    }

    pub fn is_excluded(&self, table: &str, column: &str) -> bool {
        self.tables
            .get(&table.to_ascii_lowercase())
            .map(|cols| cols.contains(&column.to_ascii_lowercase()))
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.values().all(|cols| cols.is_empty())
    }
}
