// ABOUTME: Sync config loading from TOML with default resolution and validation
// ABOUTME: Jobs bind one source table to N targets plus columns and primary keys

use serde::Deserialize;
use std::path::Path;

use crate::error::{Result, SyncError};

/// Recognized driver names. `sqlite3` is accepted as an alias for `sqlite`.
const DRIVERS: &[&str] = &["mysql", "sqlite", "sqlite3"];

/// The sync jobs and top-level defaults for the sync process.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Default driver for tables that do not specify one.
    #[serde(default)]
    pub driver: String,

    #[serde(default)]
    pub jobs: Vec<JobConfig>,
}

/// Configuration for a single sync job.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobConfig {
    /// Name uniquely identifies a job.
    #[serde(default)]
    pub name: String,

    /// The columns of the source and target tables.
    #[serde(default)]
    pub columns: Vec<String>,

    /// The name of a single primary key column. Normalized into
    /// `primary_keys` during loading; defaults to "id" when neither form is
    /// given.
    #[serde(default)]
    pub primary_key: String,

    /// Composite primary key columns, in key order. Must be a subset of
    /// `columns`.
    #[serde(default)]
    pub primary_keys: Vec<String>,

    #[serde(default)]
    pub source: TableConfig,

    #[serde(default)]
    pub targets: Vec<TableConfig>,
}

/// Configuration for a single table (source or target).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableConfig {
    /// Optional human-readable name, used in logs and outcomes.
    #[serde(default)]
    pub label: String,

    /// The name of the table.
    #[serde(default)]
    pub table: String,

    /// Database driver. `mysql` and `sqlite` are supported.
    #[serde(default)]
    pub driver: String,

    /// Pre-built connection string. When set, the discrete connection fields
    /// below must be empty.
    #[serde(default)]
    pub dsn: String,

    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub password: String,

    #[serde(default)]
    pub host: String,

    #[serde(default)]
    pub port: u16,

    #[serde(default)]
    pub db: String,
}

impl Config {
    /// Read a config file, apply defaults, and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            SyncError::Configuration(format!("failed to read {}: {}", path.display(), e))
        })?;

        Self::parse(&contents)
    }

    /// Parse config text, apply defaults, and validate it.
    pub fn parse(contents: &str) -> Result<Config> {
        let mut config: Config = toml::from_str(contents)
            .map_err(|e| SyncError::Configuration(format!("failed to parse config: {}", e)))?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Resolve defaults on the raw config: primary keys, users, and drivers.
    fn apply_defaults(&mut self) {
        for job in &mut self.jobs {
            if job.primary_key.is_empty() && job.primary_keys.is_empty() {
                job.primary_key = "id".to_string();
            }

            if !job.primary_key.is_empty() {
                job.primary_keys = vec![job.primary_key.clone()];
            }

            for table in std::iter::once(&mut job.source).chain(job.targets.iter_mut()) {
                if table.user.is_empty() {
                    table.user = "root".to_string();
                }

                if table.driver.is_empty() {
                    table.driver = self.driver.clone();
                }
            }
        }
    }

    /// Validate the resolved config. All failures are configuration errors.
    pub fn validate(&self) -> Result<()> {
        if self.jobs.is_empty() {
            return Err(SyncError::Configuration(
                "no jobs found in config".to_string(),
            ));
        }

        let mut seen = std::collections::BTreeMap::new();

        for job in &self.jobs {
            job.validate()?;
            *seen.entry(job.name.as_str()).or_insert(0u32) += 1;
        }

        let duplicates: Vec<&str> = seen
            .iter()
            .filter(|(_, count)| **count > 1)
            .map(|(name, _)| *name)
            .collect();

        if !duplicates.is_empty() {
            return Err(SyncError::Configuration(format!(
                "duplicate job names: {}",
                duplicates.join(", ")
            )));
        }

        Ok(())
    }

    /// Look up a job by name.
    pub fn job(&self, name: &str) -> Result<&JobConfig> {
        self.jobs
            .iter()
            .find(|job| job.name == name)
            .ok_or_else(|| {
                SyncError::Configuration(format!("job '{}' not found in config", name))
            })
    }
}

impl JobConfig {
    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(SyncError::Configuration("job has no name".to_string()));
        }

        if self.primary_keys.is_empty() {
            return Err(SyncError::Configuration(format!(
                "job '{}' has no primary keys",
                self.name
            )));
        }

        if self.primary_keys.len() > 3 {
            return Err(SyncError::Configuration(format!(
                "job '{}' has too many primary keys",
                self.name
            )));
        }

        if self.columns.is_empty() {
            return Err(SyncError::Configuration(format!(
                "job '{}' does not specify any columns",
                self.name
            )));
        }

        for key in &self.primary_keys {
            if !self.columns.contains(key) {
                return Err(SyncError::Configuration(format!(
                    "job '{}' has primary key '{}' not in columns",
                    self.name, key
                )));
            }
        }

        self.source
            .validate()
            .map_err(|e| SyncError::Configuration(format!("job '{}' source: {}", self.name, e)))?;

        if self.targets.is_empty() {
            return Err(SyncError::Configuration(format!(
                "job '{}' has no targets",
                self.name
            )));
        }

        for (i, target) in self.targets.iter().enumerate() {
            target.validate().map_err(|e| {
                SyncError::Configuration(format!("job '{}' target[{}]: {}", self.name, i, e))
            })?;
        }

        Ok(())
    }
}

impl TableConfig {
    fn validate(&self) -> Result<()> {
        if self.table.is_empty() {
            return Err(SyncError::Configuration("table name is empty".to_string()));
        }

        if self.driver.is_empty() {
            return Err(SyncError::Configuration(
                "table does not specify a driver".to_string(),
            ));
        }

        if !DRIVERS.contains(&self.driver.as_str()) {
            return Err(SyncError::Configuration(format!(
                "unsupported driver: {}",
                self.driver
            )));
        }

        if !self.dsn.is_empty() && self.has_discrete_fields() {
            return Err(SyncError::Configuration(
                "dsn cannot be combined with user/password/host/port/db fields".to_string(),
            ));
        }

        if self.is_sqlite() && self.dsn.is_empty() {
            return Err(SyncError::Configuration(
                "for sqlite, dsn must be provided directly".to_string(),
            ));
        }

        Ok(())
    }

    pub(crate) fn is_sqlite(&self) -> bool {
        self.driver == "sqlite" || self.driver == "sqlite3"
    }

    fn has_discrete_fields(&self) -> bool {
        // `user` is excluded: default resolution fills it in unconditionally
        !self.password.is_empty() || !self.host.is_empty() || self.port != 0 || !self.db.is_empty()
    }
}
