//! Certificate identities built from raw listing records

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

use sb_protocol::{PfxRecord, TokenRecord};

use crate::dn::DistinguishedName;

/// Discriminant of the two identity sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyKind {
    /// Password-protected key container file
    Pfx,
    /// Smart-card token
    Ftjc,
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyKind::Pfx => write!(f, "pfx"),
            KeyKind::Ftjc => write!(f, "ftjc"),
        }
    }
}

/// Where the key behind an identity lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum KeySource {
    /// Key container file on a storage volume
    Pfx(PfxRecord),
    /// Key on a smart card
    Ftjc(TokenRecord),
}

impl KeySource {
    /// The source's discriminant
    pub fn kind(&self) -> KeyKind {
        match self {
            KeySource::Pfx(_) => KeyKind::Pfx,
            KeySource::Ftjc(_) => KeyKind::Ftjc,
        }
    }
}

/// A signing identity the agent can load a key for
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CertificateIdentity {
    pub serial_number: String,
    pub valid_from: Option<NaiveDateTime>,
    pub valid_to: Option<NaiveDateTime>,
    pub common_name: String,
    /// Taxpayer id; falls back to `UID` when the name has no `INN`
    pub tax_id: Option<String>,
    pub uid: Option<String>,
    /// Personal identification number
    pub personal_id: Option<String>,
    pub organization: String,
    pub title: String,
    pub source: KeySource,
}

impl CertificateIdentity {
    /// Build an identity from a file-container record.
    ///
    /// Returns `None` when neither tax id nor personal id can be resolved.
    pub fn from_pfx(record: PfxRecord) -> Option<Self> {
        let dn = DistinguishedName::parse(&record.alias);
        Self::from_name(&dn, KeySource::Pfx(record))
    }

    /// Build an identity from a smart-card record.
    ///
    /// Returns `None` when neither tax id nor personal id can be resolved.
    pub fn from_token(record: TokenRecord) -> Option<Self> {
        let dn = DistinguishedName::parse(&record.info);
        Self::from_name(&dn, KeySource::Ftjc(record))
    }

    fn from_name(dn: &DistinguishedName, source: KeySource) -> Option<Self> {
        let uid = dn.get("UID").map(str::to_string);
        let tax_id = dn.get("INN").map(str::to_string).or_else(|| uid.clone());
        let personal_id = dn.get("PINFL").map(str::to_string);

        if tax_id.is_none() && personal_id.is_none() {
            tracing::debug!(kind = %source.kind(), "Dropping identity without tax or personal id");
            return None;
        }

        Some(Self {
            serial_number: dn.get_or_empty("SERIALNUMBER"),
            valid_from: dn.get_datetime("VALIDFROM"),
            valid_to: dn.get_datetime("VALIDTO"),
            common_name: dn.get_or_empty("CN"),
            tax_id,
            uid,
            personal_id,
            organization: dn.get_or_empty("O"),
            title: dn.get_or_empty("T"),
            source,
        })
    }

    /// Which kind of source the identity came from
    pub fn kind(&self) -> KeyKind {
        self.source.kind()
    }

    /// Whether `now` falls outside the validity window
    pub fn is_expired_at(&self, now: NaiveDateTime) -> bool {
        match (self.valid_from, self.valid_to) {
            (Some(from), _) if now < from => true,
            (_, Some(to)) => now > to,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pfx(alias: &str) -> PfxRecord {
        PfxRecord {
            disk: "C:".into(),
            path: "DSKEYS".into(),
            name: "DS123.pfx".into(),
            alias: alias.into(),
        }
    }

    #[test]
    fn test_pfx_identity() {
        let identity = CertificateIdentity::from_pfx(pfx(
            "cn=ivanov ivan,1.2.860.3.16.1.1=123456789,serialnumber=77a1,\
             validfrom=2023.01.12 10:11:12,validto=2025.01.12 23:59:59",
        ))
        .unwrap();
        assert_eq!(identity.kind(), KeyKind::Pfx);
        assert_eq!(identity.common_name, "IVANOV IVAN");
        assert_eq!(identity.tax_id.as_deref(), Some("123456789"));
        assert_eq!(identity.personal_id, None);
        assert_eq!(identity.serial_number, "77A1");
    }

    #[test]
    fn test_tax_id_falls_back_to_uid() {
        let identity = CertificateIdentity::from_pfx(pfx("cn=x,uid=555")).unwrap();
        assert_eq!(identity.tax_id.as_deref(), Some("555"));
        assert_eq!(identity.uid.as_deref(), Some("555"));
    }

    #[test]
    fn test_personal_id_only_is_valid() {
        let identity = CertificateIdentity::from_token(TokenRecord {
            card_uid: "0102".into(),
            status_info: String::new(),
            owner_name: "IVANOV".into(),
            info: "cn=x,1.2.860.3.16.1.2=31234567890123".into(),
        })
        .unwrap();
        assert_eq!(identity.kind(), KeyKind::Ftjc);
        assert_eq!(identity.tax_id, None);
        assert_eq!(identity.personal_id.as_deref(), Some("31234567890123"));
    }

    #[test]
    fn test_identity_without_ids_is_dropped() {
        assert!(CertificateIdentity::from_pfx(pfx("cn=nobody,o=acme")).is_none());
    }

    #[test]
    fn test_expiry_window() {
        let identity = CertificateIdentity::from_pfx(pfx(
            "uid=1,validfrom=2023.01.01 00:00:00,validto=2024.01.01 00:00:00",
        ))
        .unwrap();
        let at = |s: &str| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap();
        assert!(!identity.is_expired_at(at("2023-06-01 00:00:00")));
        assert!(identity.is_expired_at(at("2024-06-01 00:00:00")));
        assert!(identity.is_expired_at(at("2022-06-01 00:00:00")));
    }
}
