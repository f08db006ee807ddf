// config.rs
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::logging::filter::{default_exclusions, ExclusionPattern};
use crate::logging::level::Severity;
use crate::logging::logger::OutputFormat;

/// Deployment environment. Everything except `production` enables the
/// dev-only behaviour (noise filter, startup banner).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Client build output, served with a one hour max-age.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    /// Fingerprinted assets, served immutable in production.
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("build/client")
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("build/client/assets")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            assets_dir: default_assets_dir(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: Severity,
    #[serde(default = "default_colorize")]
    pub colorize: bool,
    #[serde(default)]
    pub format: OutputFormat,
    /// Request paths whose access lines are dropped outside production.
    #[serde(default = "default_exclusions")]
    pub exclude: Vec<ExclusionPattern>,
}

fn default_level() -> Severity {
    Severity::Info
}

fn default_colorize() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            colorize: default_colorize(),
            format: OutputFormat::default(),
            exclude: default_exclusions(),
        }
    }
}

/// Global configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load config from `config/default.toml` (or `path`), `APP__*`
    /// variables, then the conventional `PORT` and `NODE_ENV`.
    pub fn from_env(path: Option<&Path>) -> Result<Self> {
        Self::load(path, true)
    }

    fn load(path: Option<&Path>, read_env: bool) -> Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("config/default").required(false),
        };
        let mut builder = config::Config::builder().add_source(file);

        if read_env {
            builder = builder
                .add_source(
                    config::Environment::with_prefix("APP")
                        .separator("__")
                        .try_parsing(true),
                )
                .set_override_option("server.port", std::env::var("PORT").ok())?
                .set_override_option("environment", std::env::var("NODE_ENV").ok())?;
        }

        let cfg: Config = builder.build()?.try_deserialize()?;
        Ok(cfg)
    }
}
