//! Fixture configuration
//!
//! Loaded once per process and shared by handle (`Arc<FixtureConfig>`) with
//! every component that needs it. The TOML keys mirror the property names used
//! by existing fixture setups, so `datasource.url = "..."` and
//! `dbUnit.enable = true` parse into the nested sections below.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{Error, Result};

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureConfig {
    /// Environment naming (namespaces backup files)
    pub environment: EnvironmentConfig,

    /// Gate for fixture management
    #[serde(rename = "dbUnit")]
    pub db_unit: DbUnitConfig,

    /// Connection parameters
    pub datasource: DatasourceConfig,

    /// Fixture file locations
    pub fixtures: FixturesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub name: String,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DbUnitConfig {
    /// When false, setup and teardown do nothing
    pub enable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DatasourceConfig {
    /// Driver identifier, `sqlite` or `org.sqlite.JDBC`
    pub driver_class_name: String,

    /// Database location: `:memory:`, a path, `sqlite:<path>` or `jdbc:sqlite:<path>`
    pub url: String,

    pub username: Option<String>,

    pub password: Option<String>,
}

impl Default for DatasourceConfig {
    fn default() -> Self {
        Self {
            driver_class_name: "sqlite".to_string(),
            url: ":memory:".to_string(),
            username: None,
            password: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FixturesConfig {
    /// Directory holding fixture files and backups
    pub data_dir: PathBuf,
}

impl Default for FixturesConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("tests/fixtures"),
        }
    }
}

impl FixtureConfig {
    /// Load configuration from file, falling back to defaults when it is absent
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config = Self::from_toml_str(&content)?;
            debug!("Loaded fixture config from {}", path.display());
            Ok(config)
        } else {
            debug!("No fixture config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `DBFIXTURE_*` environment overrides on top of file values
    pub fn apply_env_overrides(mut self) -> Result<Self> {
        if let Ok(name) = std::env::var("DBFIXTURE_ENVIRONMENT") {
            self.environment.name = name;
        }
        if let Ok(enable) = std::env::var("DBFIXTURE_ENABLE") {
            self.db_unit.enable = parse_bool(&enable).ok_or_else(|| {
                Error::InvalidConfig(format!("DBFIXTURE_ENABLE is not a boolean: {}", enable))
            })?;
        }
        if let Ok(url) = std::env::var("DBFIXTURE_DATASOURCE_URL") {
            self.datasource.url = url;
        }
        self.validate()?;
        Ok(self)
    }

    /// Path of the snapshot file for this environment inside `data_dir`
    pub fn backup_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(format!("{}_backup.xml", self.environment.name))
    }

    fn validate(&self) -> Result<()> {
        if self.environment.name.trim().is_empty() {
            return Err(Error::InvalidConfig("environment.name must not be empty".to_string()));
        }
        if self.datasource.url.trim().is_empty() {
            return Err(Error::InvalidConfig("datasource.url must not be empty".to_string()));
        }
        Ok(())
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dotted_keys() {
        let toml = r#"
environment.name = "ci"
dbUnit.enable = true
datasource.driver-class-name = "org.sqlite.JDBC"
datasource.url = "jdbc:sqlite:target/it.db"
datasource.username = "sa"
fixtures.data-dir = "data/orders"
"#;
        let config = FixtureConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.environment.name, "ci");
        assert!(config.db_unit.enable);
        assert_eq!(config.datasource.driver_class_name, "org.sqlite.JDBC");
        assert_eq!(config.datasource.url, "jdbc:sqlite:target/it.db");
        assert_eq!(config.datasource.username.as_deref(), Some("sa"));
        assert!(config.datasource.password.is_none());
        assert_eq!(config.fixtures.data_dir, PathBuf::from("data/orders"));
    }

    #[test]
    fn test_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = FixtureConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.environment.name, "default");
        assert!(!config.db_unit.enable);
        assert_eq!(config.datasource.url, ":memory:");
    }

    #[test]
    fn test_backup_path() {
        let config = FixtureConfig::from_toml_str("environment.name = \"local\"").unwrap();
        assert_eq!(
            config.backup_path(Path::new("fixtures")),
            PathBuf::from("fixtures/local_backup.xml")
        );
    }

    #[test]
    fn test_rejects_empty_environment() {
        let err = FixtureConfig::from_toml_str("environment.name = \"  \"").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
