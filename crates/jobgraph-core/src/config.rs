//! Configuration management for the graph loader.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (JOBGRAPH__ prefix, `__` separator)
//! 2. Config file (jobgraph.toml)
//! 3. Defaults

use serde::Deserialize;

use crate::error::CoreError;
use crate::types::NodeLabel;

/// Top-level loader settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub neo4j: Neo4jSettings,

    #[serde(default)]
    pub sources: SourceSettings,

    #[serde(default)]
    pub load: LoadSettings,
}

impl Settings {
    /// Load settings from `<file_prefix>.toml` (optional) and the environment.
    pub fn load(file_prefix: &str) -> Result<Self, CoreError> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("JOBGRAPH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(cfg.try_deserialize()?)
    }
}

/// Neo4j connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Neo4jSettings {
    #[serde(default = "default_uri")]
    pub uri: String,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default)]
    pub password: String,

    /// Target database; the server default when unset.
    #[serde(default)]
    pub database: Option<String>,
}

impl Default for Neo4jSettings {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            user: default_user(),
            password: String::new(),
            database: None,
        }
    }
}

/// Location of each entity type's tabular source.
///
/// Locations are opaque to the loader and resolved by the record source.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceSettings {
    pub company: Option<String>,
    pub employee: Option<String>,
    pub location: Option<String>,
    pub job_posting: Option<String>,
    pub salary_range: Option<String>,
}

impl SourceSettings {
    /// Configured location for `label`'s records.
    pub fn location_of(&self, label: NodeLabel) -> Option<&str> {
        let loc = match label {
            NodeLabel::Company => &self.company,
            NodeLabel::Employee => &self.employee,
            NodeLabel::Location => &self.location,
            NodeLabel::JobPosting => &self.job_posting,
            NodeLabel::SalaryRange => &self.salary_range,
        };
        loc.as_deref().filter(|s| !s.is_empty())
    }

    /// Labels with no configured source.
    pub fn missing(&self) -> Vec<NodeLabel> {
        NodeLabel::ALL
            .into_iter()
            .filter(|l| self.location_of(*l).is_none())
            .collect()
    }
}

/// Batching and retry behaviour of a load run.
#[derive(Debug, Clone, Deserialize)]
pub struct LoadSettings {
    /// Rows per bulk statement.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Total attempts for a whole run when the store is unreachable.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Fixed delay between attempts, in seconds.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

impl Default for LoadSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            retry_attempts: default_retry_attempts(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

fn default_uri() -> String {
    "bolt://localhost:7687".to_string()
}

fn default_user() -> String {
    "neo4j".to_string()
}

fn default_batch_size() -> usize {
    1000
}

fn default_retry_attempts() -> u32 {
    100
}

fn default_retry_delay_secs() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.neo4j.uri, "bolt://localhost:7687");
        assert_eq!(settings.neo4j.user, "neo4j");
        assert_eq!(settings.load.batch_size, 1000);
        assert_eq!(settings.load.retry_attempts, 100);
        assert_eq!(settings.load.retry_delay_secs, 10);
        assert_eq!(settings.sources.missing().len(), 5);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loader.toml");
        std::fs::write(
            &path,
            r#"
[neo4j]
uri = "bolt://graph:7687"
password = "secret"
database = "jobs"

[sources]
company = "file:///data/companies.csv"
job_posting = "/data/job_postings.csv"
employee = ""

[load]
batch_size = 250
"#,
        )
        .unwrap();

        let prefix = dir.path().join("loader");
        let settings = Settings::load(prefix.to_str().unwrap()).unwrap();
        assert_eq!(settings.neo4j.uri, "bolt://graph:7687");
        assert_eq!(settings.neo4j.user, "neo4j");
        assert_eq!(settings.neo4j.database.as_deref(), Some("jobs"));
        assert_eq!(settings.load.batch_size, 250);
        assert_eq!(settings.load.retry_attempts, 100);
        assert_eq!(
            settings.sources.location_of(NodeLabel::Company),
            Some("file:///data/companies.csv")
        );
        assert_eq!(settings.sources.location_of(NodeLabel::Employee), None);
        assert_eq!(
            settings.sources.missing(),
            vec![
                NodeLabel::Employee,
                NodeLabel::Location,
                NodeLabel::SalaryRange
            ]
        );
    }
}
