//! sb-core: Core abstractions and configuration for the signing-agent driver
//!
//! This crate provides the domain types, error taxonomy, configuration and
//! the transport seam shared by the client library and the CLI.

pub mod config;
pub mod dn;
pub mod error;
pub mod identity;
pub mod traits;
pub mod types;

pub use error::{ConfigError, SignError, TransportError};
pub use identity::{CertificateIdentity, KeyKind, KeySource};
pub use types::{
    DirectoryEntry, Feature, FeatureTier, KeyDirectory, LoadedKey, Signature, Version,
};
