//! Per-recipient address packages.
//!
//! Each recipient gets exactly one [`AddressPackage`], built by the builder
//! its [`SendStrategy`] selects. Builders only read the shared
//! [`PackageInputs`]; nothing they touch is mutated, so every recipient of
//! a send can be packaged concurrently.

pub mod clear_inline;
pub mod encrypt_outside;
pub mod internal;

use crate::{
    attachment::{AttachmentKeyEntry, AttachmentKeyPacket},
    config::SendConfig,
    crypto::{
        engine::Crypto,
        key_packet::KeyPacket,
        modulus::{ModulusId, ModulusSource},
        password::Password,
        session_key::SessionKey,
        srp::{Salt, Verifier},
    },
    error::BuildPackageError,
    recipient::{classify, Email, Recipient, SendStrategy},
};
use clear_inline::ClearInlineBuilder;
use derive_more::derive::Debug;
use encrypt_outside::EncryptOutsideBuilder;
use internal::InternalBuilder;
use serde::{Deserialize, Serialize};

/// Everything the server needs to deliver one recipient's copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressPackage {
    pub email: Email,
    pub send_type: SendStrategy,

    /// The body session key wrapped for this recipient. `None` for clear-inline.
    pub body_key_packet: Option<KeyPacket>,

    /// Same order as the attachments of the send. Empty for clear-inline.
    pub attachment_key_packets: Vec<AttachmentKeyPacket>,

    pub sign: bool,

    /// Present exactly when `send_type` is [`SendStrategy::EncryptOutside`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eo_fields: Option<EoFields>,
}

/// What lets an encrypt-outside recipient unlock the server-hosted copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EoFields {
    /// Base64 of the random token; the unlock proves knowledge of it.
    pub token: String,

    /// `token` encrypted under the send password.
    #[serde(with = "crate::util::base64")]
    pub encrypted_token: Vec<u8>,

    pub auth: EoAuthPacket,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Verifier material the server checks password proofs against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EoAuthPacket {
    pub modulus_id: ModulusId,
    pub salt: Salt,
    pub verifier: Verifier,
}

/// Shared, read-only inputs of one build.
#[derive(Debug)]
pub struct PackageInputs<'a, C, M> {
    #[debug(skip)]
    pub crypto: &'a C,

    #[debug(skip)]
    pub modulus_source: &'a M,

    pub session_key: &'a SessionKey,
    pub attachments: &'a [AttachmentKeyEntry],
    pub password: Option<&'a Password>,
    pub password_hint: Option<&'a str>,
    pub config: &'a SendConfig,
}

impl<C, M> Clone for PackageInputs<'_, C, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C, M> Copy for PackageInputs<'_, C, M> {}

/// The builder a recipient's strategy selects.
#[derive(Debug, Clone, Copy)]
pub enum PackageBuilder<'a> {
    Internal(InternalBuilder<'a>),
    EncryptOutside(EncryptOutsideBuilder<'a>),
    ClearInline(ClearInlineBuilder<'a>),
}

impl<'a> PackageBuilder<'a> {
    pub fn for_recipient(recipient: &'a Recipient) -> Self {
        match classify(recipient) {
            SendStrategy::Internal => PackageBuilder::Internal(InternalBuilder::new(recipient)),
            SendStrategy::EncryptOutside => {
                PackageBuilder::EncryptOutside(EncryptOutsideBuilder::new(recipient))
            }
            SendStrategy::ClearInline => {
                PackageBuilder::ClearInline(ClearInlineBuilder::new(recipient))
            }
        }
    }

    pub fn strategy(&self) -> SendStrategy {
        match self {
            PackageBuilder::Internal(_) => SendStrategy::Internal,
            PackageBuilder::EncryptOutside(_) => SendStrategy::EncryptOutside,
            PackageBuilder::ClearInline(_) => SendStrategy::ClearInline,
        }
    }

    pub fn recipient(&self) -> &'a Recipient {
        match self {
            PackageBuilder::Internal(b) => b.recipient(),
            PackageBuilder::EncryptOutside(b) => b.recipient(),
            PackageBuilder::ClearInline(b) => b.recipient(),
        }
    }

    pub async fn build<C: Crypto, M: ModulusSource>(
        &self,
        inputs: PackageInputs<'_, C, M>,
    ) -> Result<AddressPackage, BuildPackageError> {
        match self {
            PackageBuilder::Internal(b) => b.build(inputs).await,
            PackageBuilder::EncryptOutside(b) => b.build(inputs).await,
            PackageBuilder::ClearInline(b) => b.build(inputs).await,
        }
    }
}
