//! Attachment session keys and their per-recipient rewrapping.

use crate::{
    crypto::{
        engine::{Crypto, CryptoError},
        key_packet::KeyPacket,
        password::Password,
        public_key::PublicKey,
        session_key::{SessionAlgorithm, SessionKey},
    },
    recipient::SendStrategy,
};
use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentId(String);

impl AttachmentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AttachmentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// An uploaded attachment and the clear session key its content was encrypted under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentKeyEntry {
    pub attachment_id: AttachmentId,
    pub session_key: SessionKey,
    pub algorithm: SessionAlgorithm,
}

impl AttachmentKeyEntry {
    /// An entry for an attachment encrypted with the default [`SessionAlgorithm`].
    pub fn new<I: Into<AttachmentId>>(attachment_id: I, session_key: SessionKey) -> Self {
        AttachmentKeyEntry {
            attachment_id: attachment_id.into(),
            session_key,
            algorithm: SessionAlgorithm::default(),
        }
    }

    pub fn with_algorithm(mut self, algorithm: SessionAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }
}

/// An attachment session key wrapped for one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentKeyPacket {
    pub attachment_id: AttachmentId,
    pub key_packet: KeyPacket,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewrapError {
    #[error("No public key to rewrap attachment {0} for")]
    MissingPublicKey(AttachmentId),

    #[error("No password to rewrap attachment {0} under")]
    MissingPassword(AttachmentId),

    #[error("Rewrapping attachment {attachment_id} failed: {cause}")]
    CryptoFailure {
        attachment_id: AttachmentId,
        cause: CryptoError,
    },
}

/// Rewrap one attachment key according to `strategy`.
///
/// Returns `None` for [`SendStrategy::ClearInline`]: those recipients share
/// the clear fallback package instead of getting their own packets.
#[instrument(skip(crypto, entry, public_key, password), fields(attachment_id = %entry.attachment_id))]
pub fn rewrap<C: Crypto + ?Sized>(
    crypto: &C,
    entry: &AttachmentKeyEntry,
    strategy: SendStrategy,
    public_key: Option<&PublicKey>,
    password: Option<&Password>,
) -> Result<Option<AttachmentKeyPacket>, RewrapError> {
    let key_packet = match strategy {
        SendStrategy::Internal => {
            let public_key =
                public_key.ok_or_else(|| RewrapError::MissingPublicKey(entry.attachment_id.clone()))?;
            crypto.asymmetric_wrap(&entry.session_key, public_key)
        }
        SendStrategy::EncryptOutside => {
            let password =
                password.ok_or_else(|| RewrapError::MissingPassword(entry.attachment_id.clone()))?;
            crypto.symmetric_wrap(&entry.session_key, password)
        }
        SendStrategy::ClearInline => return Ok(None),
    }
    .map_err(|cause| RewrapError::CryptoFailure {
        attachment_id: entry.attachment_id.clone(),
        cause,
    })?;

    Ok(Some(AttachmentKeyPacket {
        attachment_id: entry.attachment_id.clone(),
        key_packet,
    }))
}

/// [`rewrap`] every entry, stopping at the first failure.
pub fn rewrap_all<C: Crypto + ?Sized>(
    crypto: &C,
    entries: &[AttachmentKeyEntry],
    strategy: SendStrategy,
    public_key: Option<&PublicKey>,
    password: Option<&Password>,
) -> Result<Vec<AttachmentKeyPacket>, RewrapError> {
    entries
        .iter()
        .filter_map(|entry| rewrap(crypto, entry, strategy, public_key, password).transpose())
        .collect()
}
