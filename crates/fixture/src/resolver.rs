//! Fixture name resolution against a base directory

use dbfixture_common::{ColumnExclusions, Fixture};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{FixtureError, FixtureResult};
use crate::format::FixtureFormat;

/// Suffix of snapshot files, which are never offered as fixtures
pub const BACKUP_SUFFIX: &str = "_backup";

/// A fixture name bound to an existing file or directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFixture {
    pub name: String,
    pub path: PathBuf,
    pub format: FixtureFormat,
}

/// Resolves fixture names to files in one directory
#[derive(Debug, Clone)]
pub struct FixtureResolver {
    dir: PathBuf,
}

impl FixtureResolver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// First existing candidate in [`FixtureFormat::RESOLUTION_ORDER`]
    pub fn resolve(&self, name: &str) -> Option<ResolvedFixture> {
        FixtureFormat::RESOLUTION_ORDER.iter().find_map(|format| {
            let path = format.candidate(&self.dir, name);
            format.matches(&path).then(|| ResolvedFixture {
                name: name.to_string(),
                path,
                format: *format,
            })
        })
    }

    /// Resolve and parse `name`, dropping excluded columns
    pub fn load(&self, name: &str, exclusions: &ColumnExclusions) -> FixtureResult<Fixture> {
        let resolved = self.resolve(name).ok_or_else(|| FixtureError::FixtureNotFound {
            name: name.to_string(),
            dir: self.dir.clone(),
        })?;

        let fixture = resolved
            .format
            .read(&resolved.path)
            .map_err(|e| FixtureError::FixtureParse {
                path: resolved.path.clone(),
                reason: e.to_string(),
            })?;

        debug!(
            "Loaded fixture {} ({}) with {} table(s)",
            name,
            resolved.format,
            fixture.tables().len()
        );
        Ok(fixture.filtered(exclusions))
    }

    /// Names of every resolvable fixture in the directory, backups excluded
    pub fn list(&self) -> Vec<ResolvedFixture> {
        let mut names: Vec<String> = walkdir::WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter_map(|e| {
                let path = e.path();
                let name = match FixtureFormat::detect(path)? {
                    FixtureFormat::FlatXml => path.file_stem(),
                    FixtureFormat::CsvDirectory => path.file_name(),
                }?;
                Some(name.to_string_lossy().to_string())
            })
            .filter(|name| !name.ends_with(BACKUP_SUFFIX))
            .collect();

        names.sort();
        names.dedup();
        names.iter().filter_map(|name| self.resolve(name)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::csv_dir::TABLE_ORDERING;

    fn write_xml(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(format!("{}.xml", name)), format!("<dataset>{}</dataset>", body))
            .unwrap();
    }

    fn write_csv(dir: &Path, name: &str) {
        let fixture_dir = dir.join(name);
        std::fs::create_dir_all(&fixture_dir).unwrap();
        std::fs::write(fixture_dir.join(TABLE_ORDERING), "orders\n").unwrap();
        std::fs::write(fixture_dir.join("orders.csv"), "id,source\n1,csv\n").unwrap();
    }

    #[test]
    fn test_xml_wins_over_csv() {
        let dir = tempfile::tempdir().unwrap();
        write_xml(dir.path(), "pre_data", r#"<orders id="1" source="xml"/>"#);
        write_csv(dir.path(), "pre_data");

        let resolver = FixtureResolver::new(dir.path());
        let resolved = resolver.resolve("pre_data").unwrap();
        assert_eq!(resolved.format, FixtureFormat::FlatXml);

        let fixture = resolver.load("pre_data", &ColumnExclusions::new()).unwrap();
        assert_eq!(
            fixture.table("orders").unwrap().get(0, "source"),
            Some(&dbfixture_common::Value::Text("xml".into()))
        );
    }

    #[test]
    fn test_falls_back_to_csv_directory() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "seed");

        let resolved = FixtureResolver::new(dir.path()).resolve("seed").unwrap();
        assert_eq!(resolved.format, FixtureFormat::CsvDirectory);
        assert_eq!(resolved.path, dir.path().join("seed"));
    }

    #[test]
    fn test_directory_without_ordering_is_not_a_fixture() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("seed")).unwrap();
        assert!(FixtureResolver::new(dir.path()).resolve("seed").is_none());
    }

    #[test]
    fn test_load_missing_and_broken() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = FixtureResolver::new(dir.path());

        let err = resolver.load("absent", &ColumnExclusions::new()).unwrap_err();
        assert!(matches!(err, FixtureError::FixtureNotFound { .. }));

        std::fs::write(dir.path().join("broken.xml"), "<dataset><orders id=\"1\"></dataset>").unwrap();
        let err = resolver.load("broken", &ColumnExclusions::new()).unwrap_err();
        assert!(matches!(err, FixtureError::FixtureParse { .. }));
    }

    #[test]
    fn test_load_applies_exclusions() {
        let dir = tempfile::tempdir().unwrap();
        write_xml(dir.path(), "result", r#"<orders id="1" created_at="now"/>"#);

        let exclusions = ColumnExclusions::new().exclude("orders", ["created_at"]);
        let fixture = FixtureResolver::new(dir.path())
            .load("result", &exclusions)
            .unwrap();
        assert_eq!(fixture.table("orders").unwrap().columns(), &["id".to_string()]);
    }

    #[test]
    fn test_list_skips_backups() {
        let dir = tempfile::tempdir().unwrap();
        write_xml(dir.path(), "result", "");
        write_xml(dir.path(), "local_backup", "");
        write_csv(dir.path(), "seed");
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let names: Vec<String> = FixtureResolver::new(dir.path())
            .list()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["result", "seed"]);
    }
}
