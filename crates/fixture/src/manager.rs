//! Fixture lifecycle: snapshot, seed, assert and restore protected tables

use dbfixture_common::db::validate_table_name;
use dbfixture_common::{ColumnExclusions, Database, Fixture, FixtureConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::compare::check_fixture;
use crate::error::{FixtureError, FixtureResult};
use crate::format::flat_xml;
use crate::resolver::FixtureResolver;

/// Fixture loaded automatically during setup when present
pub const PRE_DATA: &str = "pre_data";

/// Lifecycle of one manager instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Connected,
    SnapshotTaken,
    PreDataLoaded,
    Restoring,
    Closed,
}

/// Pre-test contents of the protected tables
#[derive(Debug, Clone)]
pub struct Snapshot {
    path: PathBuf,
    fixture: Fixture,
}

impl Snapshot {
    /// Backup file the snapshot was written to
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn fixture(&self) -> &Fixture {
        &self.fixture
    }
}

/// Owns one database connection for the duration of a test (or test group)
/// and brackets it with a snapshot of the protected tables.
///
/// ```no_run
/// use std::sync::Arc;
/// use dbfixture::{FixtureManager, FixtureConfig};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(FixtureConfig::load("dbfixture.toml".as_ref())?);
/// let mut fixtures = FixtureManager::new(config, ["orders"])?;
/// fixtures.before()?;
/// fixtures.clean_insert_data("two_orders")?;
/// // ... exercise code under test ...
/// fixtures.assert_data("two_orders_shipped")?;
/// fixtures.after();
/// # Ok(())
/// # }
/// ```
pub struct FixtureManager {
    config: Arc<FixtureConfig>,
    tables: Vec<String>,
    exclusions: ColumnExclusions,
    resolver: FixtureResolver,
    database: Option<Database>,
    snapshot: Option<Snapshot>,
    state: LifecycleState,
}

impl FixtureManager {
    /// Create a manager protecting `tables` (possibly none).
    ///
    /// Fails when a table name is empty or not usable as an identifier.
    pub fn new<I, S>(config: Arc<FixtureConfig>, tables: I) -> FixtureResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tables: Vec<String> = tables.into_iter().map(Into::into).collect();
        for table in &tables {
            validate_table_name(table).map_err(|_| FixtureError::InvalidTableName(table.clone()))?;
        }

        let resolver = FixtureResolver::new(config.fixtures.data_dir.clone());
        Ok(Self {
            config,
            tables,
            exclusions: ColumnExclusions::new(),
            resolver,
            database: None,
            snapshot: None,
            state: LifecycleState::Uninitialized,
        })
    }

    /// Default exclusions, used by every call that does not pass its own
    pub fn with_exclusions(mut self, exclusions: ColumnExclusions) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Fixture and backup directory, overriding `fixtures.data-dir`
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.resolver = FixtureResolver::new(dir);
        self
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.config.db_unit.enable
    }

    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn resolver(&self) -> &FixtureResolver {
        &self.resolver
    }

    /// The managed connection, for test bodies that mutate protected tables
    pub fn database(&self) -> FixtureResult<&Database> {
        self.database.as_ref().ok_or(FixtureError::NotConnected)
    }

    /// Connect, snapshot the protected tables and load `pre_data` when present.
    ///
    /// Does nothing when fixture management is disabled or already set up.
    pub fn before(&mut self) -> FixtureResult<()> {
        if !self.is_enabled() {
            info!("Fixture management disabled, skipping setup");
            return Ok(());
        }
        if self.database.is_some() {
            debug!("Fixture manager already connected");
            return Ok(());
        }

        let database =
            Database::connect(&self.config.datasource).map_err(FixtureError::Connection)?;
        self.database = Some(database);
        self.state = LifecycleState::Connected;

        if let Err(e) = self.take_snapshot() {
            error!("Snapshot failed: {}", e);
            self.teardown();
            return Err(e);
        }
        self.state = LifecycleState::SnapshotTaken;

        if self.resolver.resolve(PRE_DATA).is_some() {
            self.clean_insert_data(PRE_DATA)?;
            self.state = LifecycleState::PreDataLoaded;
        } else {
            debug!("No {} fixture in {}", PRE_DATA, self.resolver.dir().display());
        }

        Ok(())
    }

    fn take_snapshot(&mut self) -> FixtureResult<()> {
        let path = self.config.backup_path(self.resolver.dir());
        let database = self.database.as_ref().ok_or(FixtureError::NotConnected)?;

        let captured = database
            .export(self.tables.as_slice())
            .map_err(FixtureError::from)
            .and_then(|fixture| {
                flat_xml::write_file(&fixture, &path)?;
                Ok(fixture)
            });

        match captured {
            Ok(fixture) => {
                info!(
                    "Captured snapshot of {} table(s) to {}",
                    fixture.tables().len(),
                    path.display()
                );
                self.snapshot = Some(Snapshot { path, fixture });
                Ok(())
            }
            Err(e) => Err(FixtureError::Backup {
                path,
                source: Box::new(e),
            }),
        }
    }

    /// Clean-insert fixture `name` using the manager's default exclusions.
    ///
    /// On a failed insert the snapshot is restored and the connection closed
    /// before the error is returned.
    pub fn clean_insert_data(&mut self, name: &str) -> FixtureResult<()> {
        let exclusions = self.exclusions.clone();
        self.clean_insert_with(name, &exclusions)
    }

    /// Clean-insert fixture `name`, excluding `exclusions`.
    ///
    /// `exclusions` replaces the manager's default set for this call; the two
    /// are not merged.
    pub fn clean_insert_data_excluding(
        &mut self,
        name: &str,
        exclusions: &ColumnExclusions,
    ) -> FixtureResult<()> {
        self.clean_insert_with(name, exclusions)
    }

    fn clean_insert_with(&mut self, name: &str, exclusions: &ColumnExclusions) -> FixtureResult<()> {
        if self.database.is_none() {
            return Err(FixtureError::NotConnected);
        }
        let fixture = self.resolver.load(name, exclusions)?;

        let database = self.database.as_mut().ok_or(FixtureError::NotConnected)?;
        if let Err(e) = database.clean_insert(&fixture) {
            error!("Applying fixture {} failed, restoring snapshot: {}", name, e);
            self.teardown();
            return Err(FixtureError::FixtureApply {
                name: name.to_string(),
                source: Box::new(e.into()),
            });
        }

        info!(
            "Clean-inserted fixture {} into {} table(s)",
            name,
            fixture.tables().len()
        );
        Ok(())
    }

    /// Assert every table of fixture `name` against the live database,
    /// using the manager's default exclusions
    pub fn assert_data(&self, name: &str) -> FixtureResult<()> {
        self.assert_with(name, None, &self.exclusions)
    }

    /// Like [`FixtureManager::assert_data`], but `exclusions` replaces the
    /// manager's default set for this call
    pub fn assert_data_excluding(&self, name: &str, exclusions: &ColumnExclusions) -> FixtureResult<()> {
        self.assert_with(name, None, exclusions)
    }

    /// Assert only `tables`. A listed table missing from the fixture is
    /// expected to be empty.
    pub fn assert_data_for<S: AsRef<str>>(&self, name: &str, tables: &[S]) -> FixtureResult<()> {
        self.assert_with(name, Some(owned(tables)), &self.exclusions)
    }

    /// Assert only `tables`; `exclusions` replaces the manager's default set
    pub fn assert_data_for_excluding<S: AsRef<str>>(
        &self,
        name: &str,
        tables: &[S],
        exclusions: &ColumnExclusions,
    ) -> FixtureResult<()> {
        self.assert_with(name, Some(owned(tables)), exclusions)
    }

    fn assert_with(
        &self,
        name: &str,
        targets: Option<Vec<String>>,
        exclusions: &ColumnExclusions,
    ) -> FixtureResult<()> {
        let database = self.database()?;
        let expected = self.resolver.load(name, exclusions)?;
        let report = check_fixture(database, name, &expected, targets.as_deref(), exclusions)?;

        if report.is_empty() {
            Ok(())
        } else {
            Err(FixtureError::AssertionMismatch(report))
        }
    }

    /// Restore the snapshot through the open connection, then forget it.
    ///
    /// Never fails: errors are logged. A no-op without a snapshot.
    pub fn restore_all(&mut self) {
        let Some(snapshot) = self.snapshot.take() else {
            return;
        };
        let Some(database) = self.database.as_mut() else {
            warn!("No connection to restore {} through", snapshot.path.display());
            return;
        };

        self.state = LifecycleState::Restoring;
        match database.clean_insert(&snapshot.fixture) {
            Ok(()) => info!(
                "Restored {} table(s) from {}",
                snapshot.fixture.tables().len(),
                snapshot.path.display()
            ),
            Err(e) => error!("Restoring snapshot {} failed: {}", snapshot.path.display(), e),
        }
    }

    /// Restore the snapshot and close the connection. Never fails and may be
    /// called any number of times.
    pub fn after(&mut self) {
        if !self.is_enabled() {
            debug!("Fixture management disabled, skipping teardown");
            return;
        }
        self.teardown();
    }

    fn teardown(&mut self) {
        self.restore_all();

        if let Some(database) = self.database.take() {
            match database.close() {
                Ok(()) => debug!("Closed database connection"),
                Err(e) => error!("Closing database connection failed: {}", e),
            }
        }

        if self.state != LifecycleState::Uninitialized {
            self.state = LifecycleState::Closed;
        }
    }
}

impl Drop for FixtureManager {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn owned<S: AsRef<str>>(tables: &[S]) -> Vec<String> {
    tables.iter().map(|t| t.as_ref().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(enable: bool) -> Arc<FixtureConfig> {
        let mut config = FixtureConfig::default();
        config.db_unit.enable = enable;
        Arc::new(config)
    }

    #[test]
    fn test_rejects_empty_table_name() {
        let err = FixtureManager::new(config(true), ["orders", ""]).err().unwrap();
        assert!(matches!(err, FixtureError::InvalidTableName(name) if name.is_empty()));
    }

    #[test]
    fn test_disabled_is_a_no_op() {
        let mut manager = FixtureManager::new(config(false), ["orders"]).unwrap();
        manager.before().unwrap();
        assert_eq!(manager.state(), LifecycleState::Uninitialized);
        assert!(matches!(manager.database(), Err(FixtureError::NotConnected)));
        manager.after();
        assert_eq!(manager.state(), LifecycleState::Uninitialized);
    }

    #[test]
    fn test_assert_without_connection_fails_first() {
        let manager = FixtureManager::new(config(true), Vec::<String>::new())
            .unwrap()
            .with_data_dir("does/not/exist");
        assert!(matches!(
            manager.assert_data("result"),
            Err(FixtureError::NotConnected)
        ));
    }

    #[test]
    fn test_unknown_driver_is_a_connection_error() {
        let mut config = FixtureConfig::default();
        config.db_unit.enable = true;
        config.datasource.driver_class_name = "org.postgresql.Driver".into();
        let mut manager = FixtureManager::new(Arc::new(config), ["orders"]).unwrap();

        assert!(matches!(manager.before(), Err(FixtureError::Connection(_))));
        assert_eq!(manager.state(), LifecycleState::Uninitialized);
    }

    #[test]
    fn test_missing_table_is_a_backup_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = FixtureManager::new(config(true), ["missing"])
            .unwrap()
            .with_data_dir(dir.path());

        let err = manager.before().unwrap_err();
        assert!(matches!(err, FixtureError::Backup { .. }));
        assert_eq!(manager.state(), LifecycleState::Closed);
        assert!(manager.database().is_err());
    }
}
