//! Core domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SignError;
use crate::identity::CertificateIdentity;

pub use sb_protocol::SignaturePayload as Signature;

/// Agent version as reported by the `version` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

impl Version {
    /// Create a version
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Single comparable number, `major * 100 + minor`
    pub fn tier(&self) -> u64 {
        u64::from(self.major) * 100 + u64::from(self.minor)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (major, minor) = s
            .trim()
            .split_once('.')
            .ok_or_else(|| format!("expected MAJOR.MINOR, got '{}'", s))?;
        let major = major
            .parse()
            .map_err(|_| format!("invalid major version '{}'", major))?;
        let minor = minor
            .parse()
            .map_err(|_| format!("invalid minor version '{}'", minor))?;
        Ok(Self { major, minor })
    }
}

impl TryFrom<String> for Version {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Version> for String {
    fn from(v: Version) -> Self {
        v.to_string()
    }
}

/// Capability that only newer agents provide
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    /// Certificate listing, key loading and signing
    CertificateApi,
    /// Identity-card reader listing and the single-call certificate directory
    ReaderListing,
    /// USB token and cloud container classes
    TokenClasses,
}

impl Feature {
    /// Lowest `major * 100 + minor` that provides the feature
    pub const fn threshold(self) -> u64 {
        match self {
            Feature::CertificateApi => 336,
            Feature::ReaderListing => 412,
            Feature::TokenClasses => 486,
        }
    }

    /// Name used in "upgrade required" errors
    pub const fn description(self) -> &'static str {
        match self {
            Feature::CertificateApi => "Certificate and key API",
            Feature::ReaderListing => "Identity-card reader support",
            Feature::TokenClasses => "Hardware token support",
        }
    }
}

/// Cumulative capability flags resolved from the agent version.
///
/// Computed once by the version check and never changed for the rest of a
/// session. The default value has every capability disabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureTier {
    certificate_api: bool,
    reader_listing: bool,
    token_classes: bool,
}

impl FeatureTier {
    /// Resolve the flags for an agent version
    pub fn from_version(version: Version) -> Self {
        let tier = version.tier();
        Self {
            certificate_api: tier >= Feature::CertificateApi.threshold(),
            reader_listing: tier >= Feature::ReaderListing.threshold(),
            token_classes: tier >= Feature::TokenClasses.threshold(),
        }
    }

    /// Whether a feature is available
    pub fn supports(&self, feature: Feature) -> bool {
        match feature {
            Feature::CertificateApi => self.certificate_api,
            Feature::ReaderListing => self.reader_listing,
            Feature::TokenClasses => self.token_classes,
        }
    }

    /// Fail fast when a feature is not available
    pub fn require(&self, feature: Feature) -> Result<(), SignError> {
        if self.supports(feature) {
            Ok(())
        } else {
            Err(SignError::UpgradeRequired {
                feature: feature.description(),
            })
        }
    }
}

/// Key handle returned by the agent together with the identity it came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadedKey {
    /// Agent-side identifier, valid until the agent forgets it
    pub key_id: String,
    /// Certificate the key belongs to
    pub identity: CertificateIdentity,
}

/// One listed identity with the caller-generated id used to select it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectoryEntry {
    pub id: String,
    pub identity: CertificateIdentity,
}

/// Result of enumerating every identity source
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KeyDirectory {
    pub entries: Vec<DirectoryEntry>,
    /// Id to auto-select; set only when exactly one identity was found
    pub first_id: Option<String>,
}

impl KeyDirectory {
    /// Find an entry by its generated id
    pub fn get(&self, id: &str) -> Option<&CertificateIdentity> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| &e.identity)
    }

    /// Number of identities
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was found
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
