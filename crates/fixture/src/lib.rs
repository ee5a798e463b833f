//! dbfixture: database fixtures for tests
//!
//! This crate brackets a test with a snapshot of the tables it may touch:
//! - Connects to the configured datasource
//! - Snapshots the protected tables to `<data_dir>/<environment>_backup.xml`
//! - Seeds tables from fixture files with clean-insert semantics
//! - Asserts live table contents against expected fixture files
//! - Restores the snapshot and disconnects on teardown
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      FixtureManager                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  before()                                                   │
//! │    ├── Database::connect(datasource)                        │
//! │    ├── snapshot protected tables -> <env>_backup.xml        │
//! │    └── clean_insert_data("pre_data") if it resolves         │
//! │  clean_insert_data(name)  -- failure => restore + close     │
//! │  assert_data(name)        -- all tables compared, then fail │
//! │  after() / Drop                                             │
//! │    ├── restore_all()                                        │
//! │    └── close connection                                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  FixtureResolver: <name>.xml, then <name>/ (CSV directory)  │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod compare;
pub mod error;
pub mod format;
pub mod manager;
pub mod resolver;

pub use compare::{check_fixture, AssertionReport, Discrepancy, TableMismatch};
pub use dbfixture_common::{ColumnExclusions, Database, Fixture, FixtureConfig, Table, Value};
pub use error::{FixtureError, FixtureResult};
pub use format::FixtureFormat;
pub use manager::{FixtureManager, LifecycleState, Snapshot, PRE_DATA};
pub use resolver::{FixtureResolver, ResolvedFixture};
