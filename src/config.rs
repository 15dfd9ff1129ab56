use anyhow::Result;
use config::{Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::models::ProviderParams;

pub const ENV_PREFIX: &str = "SCRAPESHELF";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub runner: RunnerConfig,
    pub logging: LoggingConfig,
    /// Providers seeded into the store on startup
    #[serde(default)]
    pub providers: Vec<ProviderParams>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Pending requests picked up per pass
    pub batch_size: u32,
    /// Failed requests below this many retries are put back in the queue
    pub retry_attempts: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub with_target: bool,
}

impl Config {
    /// Loads defaults, then `path` if it exists, then `SCRAPESHELF_*`
    /// environment variables (`__` separates nested keys, e.g.
    /// `SCRAPESHELF_DATABASE__URL`).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let defaults = Config::default();

        let settings = config::Config::builder()
            .set_default("database.url", defaults.database.url)?
            .set_default("database.max_connections", defaults.database.max_connections)?
            .set_default("runner.batch_size", defaults.runner.batch_size)?
            .set_default("runner.retry_attempts", defaults.runner.retry_attempts)?
            .set_default("logging.level", defaults.logging.level)?
            .set_default("logging.with_target", defaults.logging.with_target)?
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        Ok(config)
    }

    pub fn get_provider_params(&self, slug: &str) -> Option<&ProviderParams> {
        self.providers.iter().find(|p| p.slug == slug)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: DatabaseConfig {
                url: "sqlite:data/scrapeshelf.db".to_string(),
                max_connections: 10,
            },
            runner: RunnerConfig {
                batch_size: 20,
                retry_attempts: 3,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                with_target: false,
            },
            providers: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path().join("absent.toml")).unwrap();

        assert_eq!(config.database.url, "sqlite:data/scrapeshelf.db");
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.runner.retry_attempts, 3);
        assert!(config.providers.is_empty());
    }

    #[test]
    fn file_overrides_defaults_and_lists_providers() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[database]
url = "sqlite::memory:"
max_connections = 1

[runner]
batch_size = 5
retry_attempts = 2

[[providers]]
slug = "asura"
name = "Asura Scans"
scheme = "https"
host = "asuracomic.net"
listPath = "/series?page=1"
isActive = true
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.runner.batch_size, 5);
        assert_eq!(config.logging.level, "info");

        let asura = config.get_provider_params("asura").unwrap();
        assert_eq!(asura.list_path, "/series?page=1");
        assert_eq!(asura.is_active, Some(true));
        assert!(asura.validate().is_ok());
        assert!(config.get_provider_params("flame").is_none());
    }
}
