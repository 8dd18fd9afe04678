//! Enumeration of every identity the agent can see

use futures::future::join_all;
use serde_json::Value;

use sb_core::traits::Transport;
use sb_core::{
    CertificateIdentity, DirectoryEntry, Feature, FeatureTier, KeyDirectory, KeyKind, SignError,
};
use sb_protocol::message::{FIELD_CERTIFICATES, FIELD_TOKENS};
use sb_protocol::names::{ftjc, pfx};
use sb_protocol::{CallEnvelope, PfxRecord, TokenRecord};

use super::client::ProtocolClient;

/// Generates the caller-facing id for the identity at a given position
pub type ItemIdGen = dyn Fn(&CertificateIdentity, usize) -> String + Send + Sync;

/// `itm-<serial>-<index>`
pub fn default_item_id(identity: &CertificateIdentity, index: usize) -> String {
    format!("itm-{}-{}", identity.serial_number, index)
}

struct EnumerationSource {
    kind: KeyKind,
    plugin: &'static str,
    function: &'static str,
    arguments: &'static [&'static str],
    field: &'static str,
    enabled: fn(&FeatureTier) -> bool,
    parse: fn(Value) -> Option<CertificateIdentity>,
}

/// Listing calls, in result order.
///
/// Agents that support reader listing fold smart-card keys into the file
/// listing, so the separate token listing only runs on older agents.
const ENUMERATION_SOURCES: &[EnumerationSource] = &[
    EnumerationSource {
        kind: KeyKind::Pfx,
        plugin: pfx::PLUGIN,
        function: pfx::LIST_ALL_CERTIFICATES,
        arguments: &[],
        field: FIELD_CERTIFICATES,
        enabled: always,
        parse: parse_pfx,
    },
    EnumerationSource {
        kind: KeyKind::Ftjc,
        plugin: ftjc::PLUGIN,
        function: ftjc::LIST_ALL_KEYS,
        arguments: &[""],
        field: FIELD_TOKENS,
        enabled: without_reader_listing,
        parse: parse_token,
    },
];

fn always(_: &FeatureTier) -> bool {
    true
}

fn without_reader_listing(tier: &FeatureTier) -> bool {
    !tier.supports(Feature::ReaderListing)
}

fn parse_pfx(raw: Value) -> Option<CertificateIdentity> {
    let record: PfxRecord = serde_json::from_value(raw).ok()?;
    CertificateIdentity::from_pfx(record)
}

fn parse_token(raw: Value) -> Option<CertificateIdentity> {
    let record: TokenRecord = serde_json::from_value(raw).ok()?;
    CertificateIdentity::from_token(record)
}

impl<T: Transport> ProtocolClient<T> {
    async fn enumerate(&self, source: &EnumerationSource) -> Result<Vec<Value>, SignError> {
        let call = CallEnvelope::plugin(source.plugin, source.function)
            .args(source.arguments.iter().copied());
        let result = self.invoke(call).await?;
        Ok(result.array(source.field)?.to_vec())
    }

    /// List every identity from all enabled sources.
    ///
    /// Entries that do not describe a usable identity are skipped. The call
    /// fails only when every source failed; one failing source next to a
    /// working one still yields what the working one found.
    pub async fn list_all_user_keys(
        &self,
        tier: &FeatureTier,
        id_gen: &ItemIdGen,
    ) -> Result<KeyDirectory, SignError> {
        tier.require(Feature::CertificateApi)?;

        let sources: Vec<&EnumerationSource> = ENUMERATION_SOURCES
            .iter()
            .filter(|s| (s.enabled)(tier))
            .collect();
        let outcomes = join_all(sources.iter().map(|s| self.enumerate(s))).await;

        let mut identities = Vec::new();
        let mut errors = Vec::new();
        let mut succeeded = 0;
        for (source, outcome) in sources.iter().zip(outcomes) {
            match outcome {
                Ok(raw) => {
                    succeeded += 1;
                    let total = raw.len();
                    let before = identities.len();
                    identities.extend(raw.into_iter().filter_map(source.parse));
                    let kept = identities.len() - before;
                    if kept < total {
                        tracing::debug!(kind = %source.kind, dropped = total - kept, "Skipped unusable entries");
                    }
                }
                Err(e) => {
                    tracing::warn!(kind = %source.kind, error = %e, "Identity source failed");
                    errors.push(e);
                }
            }
        }

        if succeeded == 0 {
            if let Some(first) = errors.into_iter().next() {
                return Err(first);
            }
        }

        let entries: Vec<DirectoryEntry> = identities
            .into_iter()
            .enumerate()
            .map(|(index, identity)| DirectoryEntry {
                id: id_gen(&identity, index),
                identity,
            })
            .collect();
        let first_id = match entries.as_slice() {
            [only] => Some(only.id.clone()),
            _ => None,
        };

        tracing::info!(count = entries.len(), "Listed user keys");
        Ok(KeyDirectory { entries, first_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_listing_only_on_older_agents() {
        let old = FeatureTier::from_version(sb_core::Version::new(3, 40));
        let new = FeatureTier::from_version(sb_core::Version::new(4, 20));
        let enabled = |tier: &FeatureTier| {
            ENUMERATION_SOURCES
                .iter()
                .filter(|s| (s.enabled)(tier))
                .map(|s| s.kind)
                .collect::<Vec<_>>()
        };
        assert_eq!(enabled(&old), vec![KeyKind::Pfx, KeyKind::Ftjc]);
        assert_eq!(enabled(&new), vec![KeyKind::Pfx]);
    }

    #[test]
    fn test_parse_drops_malformed_entries() {
        assert!(parse_pfx(serde_json::json!({"disk": "C:"})).is_none());
        assert!(parse_token(serde_json::json!({"cardUID": "01", "info": "CN=NOBODY"})).is_none());
    }
}
