//! Stateful session facade over the protocol client
//!
//! A [`SigningService`] owns one session with the agent: the feature tier
//! resolved by the version check and the currently loaded key. Every agent
//! call goes through [`with_resilience`] using the instance's options.
//!
//! ```text
//! Uninitialized -> TierChecked -> Installed -> KeyLoaded <-> KeyLoaded
//! ```
//!
//! A failed step leaves the session where it was.

use std::sync::Arc;

use sb_core::config::{ApiKey, ClientConfig};
use sb_core::traits::Transport;
use sb_core::{
    CertificateIdentity, FeatureTier, KeyDirectory, LoadedKey, SignError, Signature, Version,
};

use crate::protocol::{default_item_id, HardwareSigner, ItemIdGen, Pkcs7Content, ProtocolClient};
use crate::resilience::{with_resilience, ResilienceOptions};
use crate::transport::WsTransport;

/// Where a session stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SessionState {
    /// Nothing has been asked of the agent yet
    Uninitialized,
    /// Version checked and feature tier resolved
    TierChecked,
    /// API keys registered; the session is usable
    Installed,
    /// A key is loaded and can sign
    KeyLoaded,
}

/// Session facade applications drive
pub struct SigningService<T = WsTransport> {
    protocol: ProtocolClient<T>,
    options: ResilienceOptions,
    min_version: Version,
    api_keys: Vec<ApiKey>,
    item_id: Arc<ItemIdGen>,
    state: SessionState,
    tier: FeatureTier,
    version: Option<Version>,
    loaded: Option<LoadedKey>,
}

impl SigningService<WsTransport> {
    /// Create a service talking to the endpoint in `config`
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_transport(WsTransport::from_config(config), config)
    }
}

impl<T: Transport> SigningService<T> {
    /// Create a service over any transport
    pub fn with_transport(transport: T, config: &ClientConfig) -> Self {
        Self {
            protocol: ProtocolClient::new(transport),
            options: ResilienceOptions::from(&config.resilience),
            min_version: config.min_version,
            api_keys: config.api_keys.clone(),
            item_id: Arc::new(default_item_id),
            state: SessionState::Uninitialized,
            tier: FeatureTier::default(),
            version: None,
            loaded: None,
        }
    }

    /// Use a custom generator for directory item ids
    pub fn with_item_id_gen<F>(mut self, item_id: F) -> Self
    where
        F: Fn(&CertificateIdentity, usize) -> String + Send + Sync + 'static,
    {
        self.item_id = Arc::new(item_id);
        self
    }

    /// Replace the resilience options every call is wrapped with
    pub fn with_resilience(mut self, options: ResilienceOptions) -> Self {
        self.options = options;
        self
    }

    /// Current session state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Capabilities resolved by the version check
    pub fn feature_tier(&self) -> &FeatureTier {
        &self.tier
    }

    /// Agent version, once checked
    pub fn version(&self) -> Option<Version> {
        self.version
    }

    /// Key loaded by the last successful `load_key`
    pub fn loaded_key(&self) -> Option<&LoadedKey> {
        self.loaded.as_ref()
    }

    /// The underlying protocol client
    pub fn protocol(&self) -> &ProtocolClient<T> {
        &self.protocol
    }

    /// Check the agent version and resolve the feature tier.
    ///
    /// The tier is written once per session; later calls return the version
    /// already checked. An agent older than the configured minimum fails
    /// with [`SignError::UpdateRequired`] and the session is left untouched.
    pub async fn check_version(&mut self) -> Result<Version, SignError> {
        if let Some(version) = self.version {
            return Ok(version);
        }

        let protocol = &self.protocol;
        let (version, tier) =
            with_resilience("version", || protocol.check_version(), &self.options).await?;

        if version.tier() < self.min_version.tier() {
            tracing::warn!(installed = %version, required = %self.min_version, "Signing agent is too old");
            return Err(SignError::UpdateRequired {
                installed: version,
                required: self.min_version,
            });
        }

        self.version = Some(version);
        self.tier = tier;
        self.state = SessionState::TierChecked;
        Ok(version)
    }

    /// Bootstrap the session: version check, then API key registration.
    ///
    /// The session becomes usable only once both have succeeded.
    pub async fn install(&mut self) -> Result<Version, SignError> {
        if self.state >= SessionState::Installed {
            if let Some(version) = self.version {
                return Ok(version);
            }
        }

        let version = self.check_version().await?;

        let protocol = &self.protocol;
        let keys = self.api_keys.as_slice();
        with_resilience("apikey", || protocol.install_api_keys(keys), &self.options).await?;

        self.state = SessionState::Installed;
        tracing::info!(version = %version, "Signing agent session installed");
        Ok(version)
    }

    fn require_installed(&self) -> Result<(), SignError> {
        if self.state >= SessionState::Installed {
            Ok(())
        } else {
            Err(SignError::NotInstalled)
        }
    }

    /// Enumerate every identity the agent can see
    pub async fn list_all_user_keys(&self) -> Result<KeyDirectory, SignError> {
        self.require_installed()?;
        let protocol = &self.protocol;
        let tier = &self.tier;
        let item_id = self.item_id.as_ref();
        with_resilience(
            "list_all_user_keys",
            || protocol.list_all_user_keys(tier, item_id),
            &self.options,
        )
        .await
    }

    /// Load the key behind `identity`, replacing any key loaded before
    pub async fn load_key(
        &mut self,
        identity: &CertificateIdentity,
        verify: bool,
    ) -> Result<&LoadedKey, SignError> {
        self.require_installed()?;
        let protocol = &self.protocol;
        let tier = &self.tier;
        let key_id = with_resilience(
            "load_key",
            || protocol.load_key(tier, identity, verify),
            &self.options,
        )
        .await?;

        self.state = SessionState::KeyLoaded;
        let loaded = self.loaded.insert(LoadedKey {
            key_id,
            identity: identity.clone(),
        });
        Ok(&*loaded)
    }

    /// Change the password or PIN protecting `identity`'s key
    pub async fn change_key_password(
        &self,
        identity: &CertificateIdentity,
    ) -> Result<(), SignError> {
        self.require_installed()?;
        let protocol = &self.protocol;
        let tier = &self.tier;
        with_resilience(
            "change_key_password",
            || protocol.change_key_password(tier, identity),
            &self.options,
        )
        .await
    }

    /// Sign with the loaded key
    pub async fn sign(
        &self,
        content: Pkcs7Content<'_>,
        detached: bool,
    ) -> Result<Signature, SignError> {
        let key = self.loaded.as_ref().ok_or(SignError::NoKeyLoaded)?;
        self.create_pkcs7(&key.key_id, content, detached).await
    }

    /// Sign with an explicit agent key id
    pub async fn create_pkcs7(
        &self,
        key_id: &str,
        content: Pkcs7Content<'_>,
        detached: bool,
    ) -> Result<Signature, SignError> {
        self.require_installed()?;
        let protocol = &self.protocol;
        let tier = &self.tier;
        with_resilience(
            "create_pkcs7",
            || protocol.create_pkcs7(tier, key_id, content, detached),
            &self.options,
        )
        .await
    }

    /// Sign with the identity card in a connected reader
    pub async fn sign_with_id_card(
        &self,
        content: Pkcs7Content<'_>,
        detached: bool,
    ) -> Result<Signature, SignError> {
        self.sign_with_hardware(HardwareSigner::IdCard, content, detached)
            .await
    }

    /// Sign with a connected USB token
    pub async fn sign_with_baik_token(
        &self,
        content: Pkcs7Content<'_>,
        detached: bool,
    ) -> Result<Signature, SignError> {
        self.sign_with_hardware(HardwareSigner::BaikToken, content, detached)
            .await
    }

    async fn sign_with_hardware(
        &self,
        signer: HardwareSigner,
        content: Pkcs7Content<'_>,
        detached: bool,
    ) -> Result<Signature, SignError> {
        self.require_installed()?;
        let protocol = &self.protocol;
        let tier = &self.tier;
        with_resilience(
            signer.key_id(),
            || protocol.sign_with_hardware(tier, signer, content, detached),
            &self.options,
        )
        .await
    }

    /// Whether an identity-card reader is connected
    pub async fn id_card_plugged_in(&self) -> Result<bool, SignError> {
        self.require_installed()?;
        let protocol = &self.protocol;
        let tier = &self.tier;
        with_resilience(
            "id_card_plugged_in",
            || protocol.id_card_plugged_in(tier),
            &self.options,
        )
        .await
    }

    /// Whether a USB signing token is connected
    pub async fn baik_token_plugged_in(&self) -> Result<bool, SignError> {
        self.require_installed()?;
        let protocol = &self.protocol;
        let tier = &self.tier;
        with_resilience(
            "baik_token_plugged_in",
            || protocol.baik_token_plugged_in(tier),
            &self.options,
        )
        .await
    }

    /// Whether a cloud key container is available
    pub async fn ckc_plugged_in(&self) -> Result<bool, SignError> {
        self.require_installed()?;
        let protocol = &self.protocol;
        let tier = &self.tier;
        with_resilience(
            "ckc_plugged_in",
            || protocol.ckc_plugged_in(tier),
            &self.options,
        )
        .await
    }

    /// Forget the loaded key and the resolved tier; the next call must
    /// install again
    pub fn reset(&mut self) {
        self.loaded = None;
        self.version = None;
        self.tier = FeatureTier::default();
        self.state = SessionState::Uninitialized;
        tracing::debug!("Signing session reset");
    }
}

impl<T> std::fmt::Debug for SigningService<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningService")
            .field("state", &self.state)
            .field("version", &self.version)
            .field("tier", &self.tier)
            .field("loaded", &self.loaded.as_ref().map(|k| &k.key_id))
            .finish_non_exhaustive()
    }
}
