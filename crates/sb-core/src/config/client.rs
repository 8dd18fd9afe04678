//! Client configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::resilience::ResilienceConfig;
use super::serde_utils::duration_millis;
use crate::error::ConfigError;
use crate::types::Version;

/// Domain/key pair that authorizes a calling origin with the agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKey {
    pub domain: String,
    pub key: String,
}

impl ApiKey {
    /// Create a pair
    pub fn new(domain: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            key: key.into(),
        }
    }
}

/// The flat `domain, key, domain, key, ...` argument list for registration
pub fn api_key_arguments(keys: &[ApiKey]) -> Vec<String> {
    keys.iter()
        .flat_map(|k| [k.domain.clone(), k.key.clone()])
        .collect()
}

/// Keys the agent ships with for loopback origins
pub fn default_api_keys() -> Vec<ApiKey> {
    vec![
        ApiKey::new(
            "localhost",
            "96D0C1491615C82B9A54D9989779DF825B690748224C2B04F500F370D51827CE2644D8D4A82C18184D73AB8530BB8ED537269603F61DB0D03D2104ABF789970B",
        ),
        ApiKey::new(
            "127.0.0.1",
            "A7BCFA5D490B351BE0754130DF03A068F855DB4333D43921125B9CF2670EF6A40370C646B90401955E1F7BC9CDBF59CE0B2C5467D820BE189C845D0B79CFC96F",
        ),
    ]
}

/// Configuration for talking to the local signing agent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Agent host, always a loopback address in practice
    pub host: String,

    /// Use the TLS endpoint (`wss://`) instead of plain `ws://`
    pub secure: bool,

    /// Port of the TLS endpoint
    pub secure_port: u16,

    /// Port of the plain endpoint
    pub insecure_port: u16,

    /// Path of the crypto service
    pub path: String,

    /// `Origin` header; the agent matches it against the registered API-key domains
    pub origin: String,

    /// Lowest agent version this client works with
    pub min_version: Version,

    /// Deadline for one connection (open, send, receive)
    #[serde(with = "duration_millis")]
    pub call_timeout: Duration,

    /// Domain/key pairs registered during install
    pub api_keys: Vec<ApiKey>,

    /// Timeout and retry defaults applied to every call
    pub resilience: ResilienceConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            secure: true,
            secure_port: 64443,
            insecure_port: 64646,
            path: "/service/cryptapi".to_string(),
            origin: "http://localhost".to_string(),
            min_version: Version::new(3, 37),
            call_timeout: Duration::from_secs(20),
            api_keys: default_api_keys(),
            resilience: ResilienceConfig::default(),
        }
    }
}

impl ClientConfig {
    /// WebSocket URL of the crypto service
    pub fn endpoint_url(&self) -> String {
        if self.secure {
            format!("wss://{}:{}{}", self.host, self.secure_port, self.path)
        } else {
            format!("ws://{}:{}{}", self.host, self.insecure_port, self.path)
        }
    }

    /// Check the configuration and fill in what must never be empty
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        if self.api_keys.is_empty() {
            tracing::warn!("No API keys configured, using the loopback defaults");
            self.api_keys = default_api_keys();
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("host must not be empty".to_string()));
        }
        if !self.path.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "path must start with '/': {}",
                self.path
            )));
        }
        if self.call_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "call_timeout must be greater than zero".to_string(),
            ));
        }
        self.resilience.validate()?;
        Ok(self)
    }
}
