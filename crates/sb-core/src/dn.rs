//! Parsing of the agent's distinguished-name strings
//!
//! The agent describes each certificate with a string like
//! `cn=ivanov ivan,o=acme, llc,uid=123,1.2.860.3.16.1.2=3120...,validfrom=2023.01.12 10:11:12`.
//! A new segment starts at a comma followed by an upper-case key and `=`, so
//! commas inside values (`acme, llc`) survive. Two vendor OIDs are renamed
//! before splitting.

use chrono::NaiveDateTime;

/// OID prefixes replaced with readable keys before parsing
const OID_ALIASES: [(&str, &str); 2] = [
    ("1.2.860.3.16.1.1=", "INN="),
    ("1.2.860.3.16.1.2=", "PINFL="),
];

const DATE_FORMATS: [&str; 2] = ["%Y.%m.%d %H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Upper-cased `KEY=VALUE` segments of a vendor name string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    segments: Vec<(String, String)>,
}

impl DistinguishedName {
    /// Parse a raw name string
    pub fn parse(raw: &str) -> Self {
        let mut normalized = raw.to_uppercase();
        for (oid, key) in OID_ALIASES {
            normalized = normalized.replacen(oid, key, 1);
        }

        let segments = split_segments(&normalized)
            .into_iter()
            .filter_map(|segment| {
                let (key, value) = segment.split_once('=')?;
                Some((key.to_string(), value.to_string()))
            })
            .collect();

        Self { segments }
    }

    /// First value for a key, if present and non-empty
    pub fn get(&self, key: &str) -> Option<&str> {
        self.segments
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    }

    /// Value for a key, or an empty string
    pub fn get_or_empty(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_string()
    }

    /// Timestamp value (`YYYY.MM.DD HH:MM:SS`, no timezone)
    pub fn get_datetime(&self, key: &str) -> Option<NaiveDateTime> {
        let value = self.get(key)?.trim();
        DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
    }
}

/// Split at every `,KEY=` boundary, where KEY is one or more upper-case letters
fn split_segments(s: &str) -> Vec<&str> {
    let bytes = s.as_bytes();
    let mut segments = Vec::new();
    let mut start = 0;

    for (i, &b) in bytes.iter().enumerate() {
        if b == b',' && starts_key(&bytes[i + 1..]) {
            segments.push(&s[start..i]);
            start = i + 1;
        }
    }
    segments.push(&s[start..]);
    segments
}

fn starts_key(rest: &[u8]) -> bool {
    let key_len = rest.iter().take_while(|b| b.is_ascii_uppercase()).count();
    key_len > 0 && rest.get(key_len) == Some(&b'=')
}
