//! Configuration management for AlertEval

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::DataSourceIdentity;

/// Environment variable prefix, e.g. `ALERTEVAL__ENGINE__URL`
pub const ENV_PREFIX: &str = "ALERTEVAL";

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Condition loading defaults
    pub eval: EvalConfig,

    /// Execution engine configuration
    pub engine: EngineConfig,

    /// Data sources known to the static directory
    pub datasources: Vec<DataSourceConfig>,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from defaults, an optional file and the environment.
    ///
    /// When `path` is `None` the platform config directory is tried
    /// (`alerteval/config.toml`); a missing file there is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut builder = ::config::Config::builder()
            .add_source(::config::Config::try_from(&Config::default())?);

        match path {
            Some(path) => {
                debug!(path = %path.display(), "Loading configuration file");
                builder = builder.add_source(::config::File::from(path).required(true));
            }
            None => {
                if let Some(path) = default_config_path() {
                    debug!(path = %path.display(), "Looking for default configuration file");
                    builder = builder.add_source(::config::File::from(path).required(false));
                }
            }
        }

        let config: Config = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot check on its own
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.engine.url)
            .map_err(|e| Error::config(format!("engine.url {:?}: {e}", self.engine.url)))?;

        if self.eval.expression_datasource.is_empty() {
            return Err(Error::config("eval.expression_datasource must not be empty"));
        }

        if self.eval.default_max_data_points <= 0 {
            return Err(Error::config("eval.default_max_data_points must be positive"));
        }

        if self.eval.default_interval_ms <= 0 {
            return Err(Error::config("eval.default_interval_ms must be positive"));
        }

        Ok(())
    }
}

fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "alerteval")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Defaults injected into stored queries while loading a condition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Data source name marking a query as an in-engine expression
    pub expression_datasource: String,
    /// Max data points for queries that do not set one
    pub default_max_data_points: i64,
    /// Interval in milliseconds for queries that do not set one
    pub default_interval_ms: i64,
    /// Organization id for queries that do not set one
    pub default_org_id: i64,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            expression_datasource: "__expr__".to_string(),
            default_max_data_points: 100,
            default_interval_ms: 1000,
            default_org_id: 0,
        }
    }
}

/// Execution engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Base URL of the execution engine
    pub url: String,
    /// Upper bound for a single execution
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Ask the engine for debug output
    pub debug: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:3000".to_string(),
            timeout: Duration::from_secs(30),
            debug: true,
        }
    }
}

/// A data source entry for the static directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSourceConfig {
    /// Numeric id
    pub id: i64,
    /// Stable uid
    #[serde(default)]
    pub uid: Option<String>,
    /// Display name
    pub name: String,
    /// Plugin type, e.g. "prometheus"
    #[serde(rename = "type", default)]
    pub type_name: String,
    /// Owning organization
    #[serde(default, alias = "orgId")]
    pub org_id: i64,
}

impl From<&DataSourceConfig> for DataSourceIdentity {
    fn from(cfg: &DataSourceConfig) -> Self {
        DataSourceIdentity {
            id: cfg.id,
            uid: cfg.uid.clone(),
            name: cfg.name.clone(),
            type_name: cfg.type_name.clone(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (json or pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
