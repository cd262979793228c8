use std::env;
use std::time::Duration;

use anyhow::{anyhow, Result};

use crate::converter::DEFAULT_SOURCE;
use crate::models::team::AgentSpec;

pub const DEFAULT_HOST: &str = "http://localhost:8081/api";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Immutable settings for talking to the team platform
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    pub host: String,
    pub default_model: String,
    pub default_temperature: f32,
    pub timeout: Duration,
    /// Label written into `metadata.source` of outgoing exchanges
    pub source: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig::new(DEFAULT_HOST)
    }
}

impl BridgeConfig {
    pub fn new<S: Into<String>>(host: S) -> Self {
        BridgeConfig {
            host: host.into(),
            default_model: DEFAULT_MODEL.to_string(),
            default_temperature: DEFAULT_TEMPERATURE,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            source: DEFAULT_SOURCE.to_string(),
        }
    }

    /// Read the configuration from `TEAMBRIDGE_*` environment variables
    pub fn from_env() -> Result<Self> {
        let host = get_env("TEAMBRIDGE_HOST")?.unwrap_or_else(|| DEFAULT_HOST.to_string());
        let mut config = BridgeConfig::new(host);

        if let Some(model) = get_env("TEAMBRIDGE_MODEL")? {
            config.default_model = model;
        }
        if let Some(temperature) = get_env("TEAMBRIDGE_TEMPERATURE")? {
            config.default_temperature = temperature
                .parse()
                .map_err(|_| anyhow!("TEAMBRIDGE_TEMPERATURE must be a number, got {}", temperature))?;
        }
        if let Some(timeout) = get_env("TEAMBRIDGE_TIMEOUT_SECS")? {
            let secs: u64 = timeout
                .parse()
                .map_err(|_| anyhow!("TEAMBRIDGE_TIMEOUT_SECS must be an integer, got {}", timeout))?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(source) = get_env("TEAMBRIDGE_SOURCE")? {
            config.source = source;
        }

        Ok(config)
    }

    /// An agent definition using the configured model and temperature
    pub fn agent_spec<N, P>(&self, name: N, system_message: P) -> AgentSpec
    where
        N: Into<String>,
        P: Into<String>,
    {
        AgentSpec {
            name: name.into(),
            system_message: system_message.into(),
            model: self.default_model.clone(),
            temperature: self.default_temperature,
            description: None,
        }
    }
}

fn get_env(key: &str) -> Result<Option<String>> {
    match env::var(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(anyhow!("Failed to read {}: {}", key, e)),
    }
}
