//! Protocol client over a [`Transport`]

use sb_core::config::{api_key_arguments, default_api_keys, ApiKey};
use sb_core::traits::Transport;
use sb_core::{CertificateIdentity, Feature, FeatureTier, KeySource, SignError, Version};
use sb_protocol::message::{FIELD_DEVICES, FIELD_READERS, FIELD_TOKENS};
use sb_protocol::names::{baikey, ckc, ftjc, idcard, pfx, service};
use sb_protocol::{CallEnvelope, ResultEnvelope};

use super::credentials;

/// Typed operations against the agent
#[derive(Debug, Clone)]
pub struct ProtocolClient<T> {
    transport: T,
}

impl<T: Transport> ProtocolClient<T> {
    /// Create a client over a transport
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// The underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send one call; an unsuccessful result becomes an error
    pub(crate) async fn invoke(&self, call: CallEnvelope) -> Result<ResultEnvelope, SignError> {
        let result = self.transport.call(&call).await?;
        if result.success {
            Ok(result)
        } else {
            tracing::debug!(operation = %call.operation(), reason = ?result.reason, "Agent rejected call");
            Err(credentials::agent_failure(result.reason))
        }
    }

    /// Ask the agent for its version and resolve the feature tier
    pub async fn check_version(&self) -> Result<(Version, FeatureTier), SignError> {
        let result = self.invoke(CallEnvelope::service(service::VERSION)).await?;
        let (major, minor) = result.version().ok_or(SignError::VersionUndefined)?;
        let version = Version::new(major, minor);
        let tier = FeatureTier::from_version(version);
        tracing::info!(version = %version, tier = ?tier, "Resolved signing agent feature tier");
        Ok((version, tier))
    }

    /// Register the domain/key pairs that authorize this client.
    ///
    /// An empty list falls back to the loopback defaults; the call always
    /// carries at least one pair.
    pub async fn install_api_keys(&self, keys: &[ApiKey]) -> Result<(), SignError> {
        let defaults;
        let keys = if keys.is_empty() {
            defaults = default_api_keys();
            &defaults
        } else {
            keys
        };
        self.invoke(CallEnvelope::service(service::APIKEY).args(api_key_arguments(keys)))
            .await?;
        tracing::info!(pairs = keys.len(), "Registered API keys with signing agent");
        Ok(())
    }

    /// Load the key behind `identity` and return the agent's key id.
    ///
    /// With `verify` set, the password (or PIN) is checked right away; a
    /// rejected credential fails the load.
    pub async fn load_key(
        &self,
        tier: &FeatureTier,
        identity: &CertificateIdentity,
        verify: bool,
    ) -> Result<String, SignError> {
        tier.require(Feature::CertificateApi)?;

        let call = match &identity.source {
            KeySource::Pfx(record) => CallEnvelope::plugin(pfx::PLUGIN, pfx::LOAD_KEY).args([
                &record.disk,
                &record.path,
                &record.name,
                &record.alias,
            ]),
            KeySource::Ftjc(record) => {
                CallEnvelope::plugin(ftjc::PLUGIN, ftjc::LOAD_KEY).arg(record.card_uid.as_str())
            }
        };
        let key_id = self.invoke(call).await?.key_id()?.to_string();
        tracing::debug!(kind = %identity.kind(), "Key loaded");

        if verify {
            self.verify_credentials(&identity.source, &key_id).await?;
        }
        Ok(key_id)
    }

    async fn verify_credentials(&self, source: &KeySource, key_id: &str) -> Result<(), SignError> {
        let call = match source {
            KeySource::Pfx(_) => {
                CallEnvelope::plugin(pfx::PLUGIN, pfx::VERIFY_PASSWORD).arg(key_id)
            }
            KeySource::Ftjc(_) => CallEnvelope::plugin(ftjc::PLUGIN, ftjc::VERIFY_PIN)
                .args([key_id, ftjc::PIN_SLOT]),
        };
        self.invoke(call).await?;
        Ok(())
    }

    /// Load the key, then ask the agent to change its password (or PIN).
    ///
    /// The agent prompts the user itself; any failing step aborts.
    pub async fn change_key_password(
        &self,
        tier: &FeatureTier,
        identity: &CertificateIdentity,
    ) -> Result<(), SignError> {
        let key_id = self.load_key(tier, identity, false).await?;
        let call = match &identity.source {
            KeySource::Pfx(_) => {
                CallEnvelope::plugin(pfx::PLUGIN, pfx::CHANGE_PASSWORD).arg(key_id.as_str())
            }
            KeySource::Ftjc(_) => CallEnvelope::plugin(ftjc::PLUGIN, ftjc::CHANGE_PIN)
                .args([key_id.as_str(), ftjc::PIN_SLOT]),
        };
        self.invoke(call).await?;
        Ok(())
    }

    /// Whether an identity-card reader is connected
    pub async fn id_card_plugged_in(&self, tier: &FeatureTier) -> Result<bool, SignError> {
        tier.require(Feature::ReaderListing)?;
        self.listing_non_empty(
            CallEnvelope::plugin(idcard::PLUGIN, idcard::LIST_READERS),
            FIELD_READERS,
        )
        .await
    }

    /// Whether a USB signing token is connected
    pub async fn baik_token_plugged_in(&self, tier: &FeatureTier) -> Result<bool, SignError> {
        tier.require(Feature::TokenClasses)?;
        self.listing_non_empty(
            CallEnvelope::plugin(baikey::PLUGIN, baikey::LIST_TOKENS),
            FIELD_TOKENS,
        )
        .await
    }

    /// Whether a cloud key container is available
    pub async fn ckc_plugged_in(&self, tier: &FeatureTier) -> Result<bool, SignError> {
        tier.require(Feature::TokenClasses)?;
        self.listing_non_empty(CallEnvelope::plugin(ckc::PLUGIN, ckc::LIST_CKC), FIELD_DEVICES)
            .await
    }

    async fn listing_non_empty(
        &self,
        call: CallEnvelope,
        field: &'static str,
    ) -> Result<bool, SignError> {
        let result = self.invoke(call).await?;
        Ok(!result.array(field)?.is_empty())
    }
}
