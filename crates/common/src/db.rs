//! SQLite access for fixture export and clean-insert

use base64::Engine;
use rusqlite::{params_from_iter, Connection};
use std::path::Path;
use tracing::{debug, info};

use crate::config::DatasourceConfig;
use crate::dataset::{Fixture, Table, Value};
use crate::{Error, Result};

const DRIVERS: &[&str] = &["sqlite", "sqlite3", "org.sqlite.jdbc"];
const URL_PREFIXES: &[&str] = &["jdbc:sqlite:", "sqlite://", "sqlite:"];

/// Column metadata from `PRAGMA table_info`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub declared_type: String,
    /// 1-based position in the primary key, 0 when not part of it
    pub pk: i64,
}

impl ColumnInfo {
    fn is_blob(&self) -> bool {
        self.declared_type.to_ascii_uppercase().contains("BLOB")
    }
}

/// Exclusively owned database connection
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open a connection from datasource parameters
    pub fn connect(datasource: &DatasourceConfig) -> Result<Self> {
        let driver = datasource.driver_class_name.trim().to_ascii_lowercase();
        if !DRIVERS.contains(&driver.as_str()) {
            return Err(Error::UnsupportedDriver(datasource.driver_class_name.clone()));
        }
        if datasource.username.is_some() || datasource.password.is_some() {
            debug!("SQLite ignores datasource credentials");
        }

        let url = datasource.url.trim();
        let location = URL_PREFIXES
            .iter()
            .find_map(|prefix| url.strip_prefix(prefix))
            .unwrap_or(url);

        if location.is_empty() || location == ":memory:" {
            Self::open_memory()
        } else {
            Self::open(location)
        }
    }

    /// Open or create database at path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        info!("Opened database at {:?}", path.as_ref());
        Ok(Self { conn })
    }

    /// Open in-memory database
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        debug!("Opened in-memory database");
        Ok(Self { conn })
    }

    /// Wrap an already open connection
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Underlying connection, for test bodies that mutate protected tables
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    /// Columns of `table` in declaration order
    pub fn columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        validate_table_name(table)?;
        table_info(&self.conn, table)
    }

    /// Current contents of `table`, ordered by primary key (rowid when there is none)
    pub fn fetch_table(&self, table: &str) -> Result<Table> {
        let columns = self.columns(table)?;

        let mut pk: Vec<&ColumnInfo> = columns.iter().filter(|c| c.pk > 0).collect();
        pk.sort_by_key(|c| c.pk);
        let order_by = if pk.is_empty() {
            "rowid".to_string()
        } else {
            pk.iter()
                .map(|c| quote_ident(&c.name))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let select = columns
            .iter()
            .map(|c| quote_ident(&c.name))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {} FROM {} ORDER BY {}",
            select,
            quote_ident(table),
            order_by
        );

        let names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
        let width = names.len();
        let mut result = Table::new(table, names);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let values = (0..width)
                .map(|i| row.get::<_, Value>(i))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            result.push_row(values)?;
        }

        debug!("Fetched {} row(s) from {}", result.row_count(), table);
        Ok(result)
    }

    /// Query-based export of the given tables, in the given order
    pub fn export<S: AsRef<str>>(&self, tables: &[S]) -> Result<Fixture> {
        let mut fixture = Fixture::new();
        for table in tables {
            fixture.push_table(self.fetch_table(table.as_ref())?);
        }
        Ok(fixture)
    }

    /// Delete every fixture table's rows (reverse order), then insert the
    /// fixture's rows (fixture order), all inside one transaction.
    pub fn clean_insert(&mut self, fixture: &Fixture) -> Result<()> {
        let tx = self.conn.transaction()?;

        for table in fixture.tables().iter().rev() {
            validate_table_name(table.name())?;
            let deleted = tx.execute(&format!("DELETE FROM {}", quote_ident(table.name())), [])?;
            debug!("Deleted {} row(s) from {}", deleted, table.name());
        }

        for table in fixture.tables() {
            insert_rows(&tx, table)?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Close the connection, reporting the driver's close error
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| Error::Database(e))
    }
}

fn insert_rows(conn: &Connection, table: &Table) -> Result<()> {
    if table.columns().is_empty() || table.is_empty() {
        return Ok(());
    }

    let live = table_info(conn, table.name())?;
    let blob_columns: Vec<bool> = table
        .columns()
        .iter()
        .map(|c| {
            live.iter()
                .any(|l| l.name.eq_ignore_ascii_case(c) && l.is_blob())
        })
        .collect();

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table.name()),
        table
            .columns()
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", "),
        (1..=table.columns().len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ")
    );

    let mut stmt = conn.prepare(&sql)?;
    for row in table.rows() {
        let values = row
            .iter()
            .zip(&blob_columns)
            .map(|(value, &is_blob)| match value {
                Value::Text(s) if is_blob => base64::engine::general_purpose::STANDARD
                    .decode(s)
                    .map(Value::Blob)
                    .unwrap_or_else(|_| value.clone()),
                _ => value.clone(),
            });
        stmt.execute(params_from_iter(values))?;
    }

    debug!("Inserted {} row(s) into {}", table.row_count(), table.name());
    Ok(())
}

fn table_info(conn: &Connection, table: &str) -> Result<Vec<ColumnInfo>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
    let columns = stmt
        .query_map([], |row| {
            Ok(ColumnInfo {
                name: row.get(1)?,
                declared_type: row.get(2)?,
                pk: row.get(5)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    if columns.is_empty() {
        return Err(Error::TableNotFound(table.to_string()));
    }
    Ok(columns)
}

/// Reject names that cannot be used as a quoted SQLite identifier
pub fn validate_table_name(name: &str) -> Result<()> {
    if name.trim().is_empty() || name.contains('\0') {
        return Err(Error::InvalidTableName(name.to_string()));
    }
    Ok(())
}

/// Quote an identifier for interpolation into SQL
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
