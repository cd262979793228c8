use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use teambridge::bridge::config::{
    BridgeConfig, DEFAULT_HOST, DEFAULT_MODEL, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT_SECS,
};
use teambridge::converter::DEFAULT_SOURCE;

use crate::error::{to_env_var, ConfigError};

#[derive(Debug, Deserialize)]
pub struct BridgeSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_source")]
    pub source: String,
}

impl BridgeSettings {
    pub fn into_config(self) -> BridgeConfig {
        BridgeConfig {
            host: self.host,
            default_model: self.model,
            default_temperature: self.temperature,
            timeout: Duration::from_secs(self.timeout_secs),
            source: self.source,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub bridge: BridgeSettings,
    pub log: LogSettings,
}

impl Settings {
    /// Defaults, then the optional TOML file, then `TEAMBRIDGE_*` environment variables
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("bridge.host", default_host())?
            .set_default("bridge.model", default_model())?
            .set_default("bridge.temperature", default_temperature() as f64)?
            .set_default("bridge.timeout_secs", default_timeout_secs())?
            .set_default("bridge.source", default_source())?
            .set_default("log.level", default_log_level())?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }

        let config = builder
            .add_source(
                Environment::with_prefix("TEAMBRIDGE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize().map_err(|err| {
            tracing::debug!("Configuration error: {:?}", &err);
            ConfigError::from(err)
        })?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.bridge.host.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                env_var: to_env_var("bridge.host"),
                reason: "host must not be empty".to_string(),
            });
        }
        if !(0.0..=2.0).contains(&self.bridge.temperature) {
            return Err(ConfigError::InvalidValue {
                env_var: to_env_var("bridge.temperature"),
                reason: format!("{} is outside 0.0..=2.0", self.bridge.temperature),
            });
        }
        Ok(())
    }

    pub fn log_level(&self) -> tracing::Level {
        self.log.level.parse().unwrap_or(tracing::Level::INFO)
    }
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_source() -> String {
    DEFAULT_SOURCE.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
