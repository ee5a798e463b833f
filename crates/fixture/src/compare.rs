//! Order-sensitive table comparison

use dbfixture_common::dataset::{render, values_match};
use dbfixture_common::{ColumnExclusions, Database, Fixture, Table};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// First difference found between an expected and an actual table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Discrepancy {
    RowCount {
        expected: usize,
        actual: usize,
    },
    Columns {
        expected: Vec<String>,
        actual: Vec<String>,
    },
    Cell {
        row: usize,
        column: String,
        expected: Option<String>,
        actual: Option<String>,
    },
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RowCount { expected, actual } => {
                write!(f, "expected {} row(s) but found {}", expected, actual)
            }
            Self::Columns { expected, actual } => write!(
                f,
                "expected columns [{}] but found [{}]",
                expected.join(", "),
                actual.join(", ")
            ),
            Self::Cell {
                row,
                column,
                expected,
                actual,
            } => write!(
                f,
                "row {}, column {}: expected {} but was {}",
                row,
                column,
                display_cell(expected),
                display_cell(actual)
            ),
        }
    }
}

fn display_cell(cell: &Option<String>) -> String {
    match cell {
        Some(text) => format!("{:?}", text),
        None => "NULL".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableMismatch {
    pub table: String,
    pub discrepancy: Discrepancy,
}

/// Every failing table of one assertion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssertionReport {
    pub fixture: String,
    pub mismatches: Vec<TableMismatch>,
}

impl AssertionReport {
    pub fn is_empty(&self) -> bool {
        self.mismatches.is_empty()
    }

    pub fn failing_tables(&self) -> Vec<&str> {
        self.mismatches.iter().map(|m| m.table.as_str()).collect()
    }
}

impl fmt::Display for AssertionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fixture {}: {} table(s) differ",
            self.fixture,
            self.mismatches.len()
        )?;
        for mismatch in &self.mismatches {
            write!(f, "\n  {}: {}", mismatch.table, mismatch.discrepancy)?;
        }
        Ok(())
    }
}

/// Compare row count, then column set, then cells by row index.
///
/// Two empty tables are equal regardless of their columns, so a fixture can
/// state "no rows" without listing any.
pub fn compare_tables(expected: &Table, actual: &Table) -> Option<TableMismatch> {
    let mismatch = |discrepancy| {
        Some(TableMismatch {
            table: expected.name().to_string(),
            discrepancy,
        })
    };

    if expected.row_count() != actual.row_count() {
        return mismatch(Discrepancy::RowCount {
            expected: expected.row_count(),
            actual: actual.row_count(),
        });
    }
    if expected.is_empty() {
        return None;
    }

    let (expected_columns, actual_columns) = (column_set(expected), column_set(actual));
    if expected_columns != actual_columns {
        return mismatch(Discrepancy::Columns {
            expected: expected_columns,
            actual: actual_columns,
        });
    }

    let positions: Vec<Option<usize>> = expected
        .columns()
        .iter()
        .map(|c| actual.column_index(c))
        .collect();

    for (row, (want, got)) in expected.rows().iter().zip(actual.rows()).enumerate() {
        for ((column, value), position) in expected.columns().iter().zip(want).zip(&positions) {
            let Some(idx) = *position else { continue };
            if !values_match(value, &got[idx]) {
                return mismatch(Discrepancy::Cell {
                    row,
                    column: column.clone(),
                    expected: render(value),
                    actual: render(&got[idx]),
                });
            }
        }
    }

    None
}

/// Compare `targets` (every table of `expected` when `None`) against the
/// live database. A target missing from `expected` must be empty.
pub fn check_fixture(
    database: &Database,
    name: &str,
    expected: &Fixture,
    targets: Option<&[String]>,
    exclusions: &ColumnExclusions,
) -> dbfixture_common::Result<AssertionReport> {
    let targets = match targets {
        Some(tables) => tables.to_vec(),
        None => expected.table_names(),
    };

    let mut mismatches = Vec::new();
    for table in &targets {
        let actual = database.fetch_table(table)?.without_columns(exclusions);
        let mismatch = match expected.table(table) {
            Some(want) => compare_tables(want, &actual),
            None => compare_tables(&Table::new(table.as_str(), Vec::new()), &actual),
        };
        match mismatch {
            Some(mismatch) => {
                warn!("Table {} differs from {}: {}", table, name, mismatch.discrepancy);
                mismatches.push(mismatch);
            }
            None => debug!("Table {} matches {}", table, name),
        }
    }

    Ok(AssertionReport {
        fixture: name.to_string(),
        mismatches,
    })
}

fn column_set(table: &Table) -> Vec<String> {
    let mut columns: Vec<String> = table
        .columns()
        .iter()
        .map(|c| c.to_ascii_lowercase())
        .collect();
    columns.sort();
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbfixture_common::Value;

    fn ppap(text: &str) -> Table {
        let mut table = Table::new("ppap", vec!["id".into(), "text".into()]);
        table
            .push_row(vec![Value::Text("1".into()), Value::Text(text.into())])
            .unwrap();
        table
    }

    #[test]
    fn test_equal_tables() {
        let expected = ppap("pen pineapple apple pen.");
        let mut actual = Table::new("ppap", vec!["TEXT".into(), "ID".into()]);
        actual
            .push_row(vec![Value::Text("pen pineapple apple pen.".into()), Value::Integer(1)])
            .unwrap();
        assert_eq!(compare_tables(&expected, &actual), None);
    }

    #[test]
    fn test_cell_mismatch() {
        let mismatch = compare_tables(
            &ppap("pen pineapple apple pen."),
            &ppap("pen pineapple apple pineapple."),
        )
        .unwrap();
        assert_eq!(
            mismatch.discrepancy,
            Discrepancy::Cell {
                row: 0,
                column: "text".into(),
                expected: Some("pen pineapple apple pen.".into()),
                actual: Some("pen pineapple apple pineapple.".into()),
            }
        );
    }

    #[test]
    fn test_row_count_checked_first() {
        let mut actual = ppap("x");
        actual.ensure_column("extra");
        actual
            .push_row(vec![Value::Integer(2), Value::Null, Value::Null])
            .unwrap();
        let mismatch = compare_tables(&ppap("x"), &actual).unwrap();
        assert_eq!(mismatch.discrepancy, Discrepancy::RowCount { expected: 1, actual: 2 });
    }

    #[test]
    fn test_column_set_mismatch() {
        let mut actual = ppap("x");
        actual.ensure_column("extra");
        let mismatch = compare_tables(&ppap("x"), &actual).unwrap();
        assert!(matches!(mismatch.discrepancy, Discrepancy::Columns { .. }));
    }

    #[test]
    fn test_empty_tables_ignore_columns() {
        let expected = Table::new("ppap", vec![]);
        let actual = Table::new("ppap", vec!["id".into()]);
        assert_eq!(compare_tables(&expected, &actual), None);
    }

    #[test]
    fn test_order_sensitive() {
        let mut expected = Table::new("t", vec!["v".into()]);
        expected.push_row(vec![Value::Text("a".into())]).unwrap();
        expected.push_row(vec![Value::Text("b".into())]).unwrap();
        let mut actual = Table::new("t", vec!["v".into()]);
        actual.push_row(vec![Value::Text("b".into())]).unwrap();
        actual.push_row(vec![Value::Text("a".into())]).unwrap();

        let mismatch = compare_tables(&expected, &actual).unwrap();
        assert!(matches!(mismatch.discrepancy, Discrepancy::Cell { row: 0, .. }));
    }

    #[test]
    fn test_check_fixture_targets() {
        let db = Database::open_memory().unwrap();
        db.execute_batch("CREATE TABLE a (v TEXT); CREATE TABLE b (v TEXT); INSERT INTO b VALUES ('x');")
            .unwrap();
        let mut a = Table::new("a", vec!["v".into()]);
        a.push_row(vec![Value::Text("1".into())]).unwrap();
        let expected = Fixture::from_tables(vec![a]);
        let none = ColumnExclusions::new();

        let report = check_fixture(&db, "expected", &expected, None, &none).unwrap();
        assert_eq!(report.failing_tables(), vec!["a"]);

        let report =
            check_fixture(&db, "expected", &expected, Some(["b".to_string()].as_slice()), &none).unwrap();
        assert_eq!(
            report.mismatches[0].discrepancy,
            Discrepancy::RowCount { expected: 0, actual: 1 }
        );
    }

    #[test]
    fn test_mismatch_serializes_with_kind() {
        let json = serde_json::to_value(TableMismatch {
            table: "orders".into(),
            discrepancy: Discrepancy::RowCount { expected: 2, actual: 0 },
        })
        .unwrap();
        assert_eq!(json["table"], "orders");
        assert_eq!(json["discrepancy"]["kind"], "row_count");
        assert_eq!(json["discrepancy"]["expected"], 2);
    }

    #[test]
    fn test_report_display() {
        let report = AssertionReport {
            fixture: "result".into(),
            mismatches: vec![TableMismatch {
                table: "ppap".into(),
                discrepancy: Discrepancy::Cell {
                    row: 0,
                    column: "text".into(),
                    expected: Some("a".into()),
                    actual: None,
                },
            }],
        };
        assert_eq!(
            report.to_string(),
            "fixture result: 1 table(s) differ\n  ppap: row 0, column text: expected \"a\" but was NULL"
        );
    }
}
