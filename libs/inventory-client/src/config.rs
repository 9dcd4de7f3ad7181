use core_config::{ConfigError, FromEnv, env_or_default, env_required};
use std::fmt;

use crate::error::{InventoryError, Result};
use crate::signer::Credentials;

/// Production endpoint used when no base URL is configured
pub const DEFAULT_BASE_URL: &str = "https://api.inventory-store.io";

/// Inventory client configuration
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_key_id: String,
    pub api_secret: String,
    pub api_public_key: String,
    pub api_base_url: String,
}

impl ClientConfig {
    pub fn new(
        api_key_id: impl Into<String>,
        api_secret: impl Into<String>,
        api_public_key: impl Into<String>,
    ) -> Self {
        Self {
            api_key_id: api_key_id.into(),
            api_secret: api_secret.into(),
            api_public_key: api_public_key.into(),
            api_base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into();
        self
    }

    /// Reject empty credentials before any network activity
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("apiKeyId", &self.api_key_id),
            ("apiSecret", &self.api_secret),
            ("apiPublicKey", &self.api_public_key),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(InventoryError::configuration(format!(
                    "{} is required and must not be empty",
                    name
                )));
            }
        }
        if self.api_base_url.trim().is_empty() {
            return Err(InventoryError::configuration("apiBaseUrl must not be empty"));
        }
        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.api_key_id, &self.api_secret, &self.api_public_key)
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key_id", &self.api_key_id)
            .field("api_secret", &"<redacted>")
            .field("api_public_key", &self.api_public_key)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

impl FromEnv for ClientConfig {
    /// Requires INVENTORY_API_KEY_ID, INVENTORY_API_SECRET and
    /// INVENTORY_API_PUBLIC_KEY; INVENTORY_API_BASE_URL is optional
    fn from_env() -> std::result::Result<Self, ConfigError> {
        Ok(Self {
            api_key_id: env_required("INVENTORY_API_KEY_ID")?,
            api_secret: env_required("INVENTORY_API_SECRET")?,
            api_public_key: env_required("INVENTORY_API_PUBLIC_KEY")?,
            api_base_url: env_or_default("INVENTORY_API_BASE_URL", DEFAULT_BASE_URL),
        })
    }
}
