//! Core error types for the signing-agent driver

use std::path::PathBuf;
use std::time::Duration;

use sb_protocol::ProtocolError;
use thiserror::Error;

use crate::types::Version;

/// Substring the agent puts in its reason when a key password or PIN is wrong
pub const CREDENTIAL_MARKER: &str = "BadPaddingException";

/// WebSocket close codes the driver cares about
pub mod close_code {
    pub const NORMAL: u16 = 1000;
    pub const GOING_AWAY: u16 = 1001;
    pub const ABNORMAL: u16 = 1006;
    pub const SERVER_ERROR: u16 = 1011;
    pub const SERVICE_RESTART: u16 = 1012;
    pub const TRY_AGAIN_LATER: u16 = 1013;
}

/// Top-level error returned by every public operation
#[derive(Error, Debug)]
pub enum SignError {
    /// The single connection used for a call failed
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The agent answered with something the driver could not interpret
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The agent reported a failure
    #[error("{reason}")]
    Agent { reason: String },

    /// Key password or PIN rejected by the agent
    #[error("Incorrect password or PIN")]
    WrongPassword,

    /// Version call succeeded but did not report major/minor
    #[error("Signing agent version is undefined")]
    VersionUndefined,

    /// Installed agent is older than the configured minimum
    #[error("Signing agent {installed} is older than the required {required}; install the latest version of the signing agent")]
    UpdateRequired { installed: Version, required: Version },

    /// A capability-gated operation was requested below its tier
    #[error("{feature} is not supported by the installed signing agent; upgrade required")]
    UpgradeRequired { feature: &'static str },

    /// The session has not completed version check and key registration
    #[error("Signing agent session is not installed; run install first")]
    NotInstalled,

    /// Signing was requested with no key loaded
    #[error("No key is loaded")]
    NoKeyLoaded,

    /// An attempt did not settle in time
    #[error("Operation timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// Every attempt failed with a retryable error
    #[error("Gave up after {attempts} attempts: {last_error}")]
    RetryExhausted {
        attempts: u32,
        last_error: Box<SignError>,
    },

    /// A backoff wait was cancelled from outside
    #[error("Operation cancelled")]
    Cancelled,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl SignError {
    /// Failure reported by the agent, with a fallback when it gave no reason
    pub fn agent(reason: Option<String>) -> Self {
        SignError::Agent {
            reason: reason.unwrap_or_else(|| "Signing agent reported a failure".to_string()),
        }
    }

    /// Whether this is a rejected password/PIN.
    ///
    /// Such failures are deterministic and must never be retried.
    pub fn is_credential_failure(&self) -> bool {
        match self {
            SignError::WrongPassword => true,
            SignError::Agent { reason } => reason.contains(CREDENTIAL_MARKER),
            SignError::RetryExhausted { last_error, .. } => last_error.is_credential_failure(),
            _ => false,
        }
    }
}

/// Failures of one physical request/response exchange
#[derive(Error, Debug)]
pub enum TransportError {
    /// WebSocket connections cannot be made from this build/environment
    #[error("WebSocket connection is unavailable: {0}")]
    Unavailable(String),

    /// The connection could not be opened
    #[error("Failed to open connection to {url}: {message}")]
    OpenFailed { url: String, message: String },

    /// The connection closed before the result arrived
    #[error("Connection closed before a result arrived (code {code}){}", reason_suffix(.reason))]
    Closed { code: u16, reason: String },

    /// The connection reported an error
    #[error("WebSocket error: {0}")]
    Socket(String),

    /// The result could not be parsed
    #[error("Malformed agent result: {0}")]
    Malformed(#[from] ProtocolError),

    /// The connection was still open when the call deadline elapsed
    #[error("Agent did not answer within {0:?}")]
    DeadlineElapsed(Duration),
}

fn reason_suffix(reason: &str) -> String {
    if reason.is_empty() {
        String::new()
    } else {
        format!(": {}", reason)
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
