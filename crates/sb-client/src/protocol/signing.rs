//! PKCS#7 creation, with a loaded key or a hardware signer

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use sb_core::traits::Transport;
use sb_core::{Feature, FeatureTier, SignError, Signature};
use sb_protocol::names::pkcs7;
use sb_protocol::CallEnvelope;

use super::client::ProtocolClient;
use super::credentials;

/// Content handed to the agent for signing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pkcs7Content<'a> {
    /// Raw bytes, base64-encoded before sending
    Raw(&'a [u8]),
    /// Already base64-encoded, sent as-is
    Base64(&'a str),
}

impl Pkcs7Content<'_> {
    /// The base64 form the agent expects
    pub fn to_base64(self) -> String {
        match self {
            Pkcs7Content::Raw(bytes) => STANDARD.encode(bytes),
            Pkcs7Content::Base64(encoded) => encoded.to_string(),
        }
    }
}

/// Hardware signer addressed by a fixed key id, with no key loading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HardwareSigner {
    /// Identity card in a connected reader
    IdCard,
    /// USB signing token
    BaikToken,
}

impl HardwareSigner {
    /// Key id the agent routes to this signer
    pub const fn key_id(self) -> &'static str {
        match self {
            HardwareSigner::IdCard => "idcard",
            HardwareSigner::BaikToken => "baikey",
        }
    }

    /// Capability the agent needs to sign with it
    pub const fn required_feature(self) -> Feature {
        match self {
            HardwareSigner::IdCard => Feature::ReaderListing,
            HardwareSigner::BaikToken => Feature::TokenClasses,
        }
    }
}

impl<T: Transport> ProtocolClient<T> {
    /// Sign `content` with a loaded key.
    ///
    /// A detached container carries only the signature; an attached one
    /// embeds the content. The payload comes back in either shape, see
    /// [`Signature`].
    pub async fn create_pkcs7(
        &self,
        tier: &FeatureTier,
        key_id: &str,
        content: Pkcs7Content<'_>,
        detached: bool,
    ) -> Result<Signature, SignError> {
        tier.require(Feature::CertificateApi)?;

        let flag = if detached {
            pkcs7::DETACHED
        } else {
            pkcs7::ATTACHED
        };
        let call = CallEnvelope::plugin(pkcs7::PLUGIN, pkcs7::CREATE_PKCS7).args([
            content.to_base64(),
            key_id.to_string(),
            flag.to_string(),
        ]);

        let signature = self
            .invoke(call)
            .await
            .map_err(credentials::normalize)?
            .signature()?;
        tracing::debug!(detached, serial = ?signature.signer_serial_number(), "PKCS#7 created");
        Ok(signature)
    }

    /// Sign `content` directly on a hardware signer
    pub async fn sign_with_hardware(
        &self,
        tier: &FeatureTier,
        signer: HardwareSigner,
        content: Pkcs7Content<'_>,
        detached: bool,
    ) -> Result<Signature, SignError> {
        tier.require(signer.required_feature())?;
        self.create_pkcs7(tier, signer.key_id(), content, detached)
            .await
    }
}
