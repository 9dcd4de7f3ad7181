use core_config::{ConfigError, FromEnv, env_parse};
use inventory_client::ClientConfig;
use std::time::Duration;

/// CLI configuration: client credentials plus transport settings
#[derive(Debug, Clone)]
pub struct Config {
    pub client: ClientConfig,
    /// Per-request timeout (`INVENTORY_HTTP_TIMEOUT_SECS`); unset means none
    pub timeout: Option<Duration>,
}

impl FromEnv for Config {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            client: ClientConfig::from_env()?,
            timeout: env_parse::<u64>("INVENTORY_HTTP_TIMEOUT_SECS")?.map(Duration::from_secs),
        })
    }
}
