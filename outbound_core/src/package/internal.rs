//! Packages for recipients who hold an account.

use super::{AddressPackage, PackageInputs};
use crate::{
    attachment::{rewrap_all, RewrapError},
    crypto::{engine::Crypto, modulus::ModulusSource},
    error::BuildPackageError,
    recipient::{Recipient, SendStrategy},
};
use tracing::instrument;

/// Wraps the body and attachment keys under the recipient's public key.
#[derive(Debug, Clone, Copy)]
pub struct InternalBuilder<'a> {
    recipient: &'a Recipient,
}

impl<'a> InternalBuilder<'a> {
    pub fn new(recipient: &'a Recipient) -> Self {
        InternalBuilder { recipient }
    }

    pub fn recipient(&self) -> &'a Recipient {
        self.recipient
    }

    #[instrument(skip_all, fields(email = %self.recipient.email))]
    pub async fn build<C: Crypto, M: ModulusSource>(
        &self,
        inputs: PackageInputs<'_, C, M>,
    ) -> Result<AddressPackage, BuildPackageError> {
        let email = &self.recipient.email;
        let public_key = self
            .recipient
            .public_key
            .as_ref()
            .ok_or_else(|| BuildPackageError::MissingPublicKey(email.clone()))?;

        let body_key_packet = inputs
            .crypto
            .asymmetric_wrap(inputs.session_key, public_key)
            .map_err(|cause| BuildPackageError::CryptoFailure {
                email: email.clone(),
                cause,
            })?;

        let attachment_key_packets = rewrap_all(
            inputs.crypto,
            inputs.attachments,
            SendStrategy::Internal,
            Some(public_key),
            None,
        )
        .map_err(|e| match e {
            RewrapError::CryptoFailure { cause, .. } => BuildPackageError::CryptoFailure {
                email: email.clone(),
                cause,
            },
            cause => BuildPackageError::Rewrap {
                email: email.clone(),
                cause,
            },
        })?;

        Ok(AddressPackage {
            email: email.clone(),
            send_type: SendStrategy::Internal,
            body_key_packet: Some(body_key_packet),
            attachment_key_packets,
            sign: self.recipient.sign,
            eo_fields: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        attachment::AttachmentKeyEntry,
        config::SendConfig,
        crypto::{
            engine::CryptoError, memory::MemoryCrypto, modulus::FixedModulus, public_key::PublicKey,
            session_key::SessionKey, share_key::ShareSecretKey,
        },
        test_utils::test_modulus,
    };
    use testresult::TestResult;

    #[tokio::test]
    async fn test_wraps_body_and_attachments() -> TestResult {
        let sk = ShareSecretKey::generate(&mut rand::thread_rng());
        let recipient = Recipient::internal("alice@example.com", Some(sk.public_key()));

        let session_key = SessionKey::from([7; 32]);
        let attachments = vec![AttachmentKeyEntry::new("a", SessionKey::from([8; 32]))];
        let config = SendConfig::default();
        let modulus = FixedModulus(test_modulus());

        let package = InternalBuilder::new(&recipient)
            .build(PackageInputs {
                crypto: &MemoryCrypto,
                modulus_source: &modulus,
                session_key: &session_key,
                attachments: &attachments,
                password: None,
                password_hint: None,
                config: &config,
            })
            .await?;

        assert_eq!(package.send_type, SendStrategy::Internal);
        assert!(package.sign);
        assert!(package.eo_fields.is_none());

        let body = package.body_key_packet.as_ref().ok_or("missing body packet")?;
        assert_eq!(MemoryCrypto.asymmetric_unwrap(body, &sk)?, session_key);

        assert_eq!(package.attachment_key_packets.len(), 1);
        assert_eq!(
            MemoryCrypto.asymmetric_unwrap(&package.attachment_key_packets[0].key_packet, &sk)?,
            SessionKey::from([8; 32])
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_public_key() {
        let recipient = Recipient::internal("alice@example.com", None);
        let session_key = SessionKey::from([7; 32]);
        let config = SendConfig::default();
        let modulus = FixedModulus(test_modulus());

        let result = InternalBuilder::new(&recipient)
            .build(PackageInputs {
                crypto: &MemoryCrypto,
                modulus_source: &modulus,
                session_key: &session_key,
                attachments: &[],
                password: None,
                password_hint: None,
                config: &config,
            })
            .await;

        assert!(matches!(
            result,
            Err(BuildPackageError::MissingPublicKey(email)) if email.as_str() == "alice@example.com"
        ));
    }

    #[tokio::test]
    async fn test_malformed_public_key() {
        let recipient = Recipient::internal("alice@example.com", Some(PublicKey::from(vec![1; 5])));
        let session_key = SessionKey::from([7; 32]);
        let config = SendConfig::default();
        let modulus = FixedModulus(test_modulus());

        let result = InternalBuilder::new(&recipient)
            .build(PackageInputs {
                crypto: &MemoryCrypto,
                modulus_source: &modulus,
                session_key: &session_key,
                attachments: &[],
                password: None,
                password_hint: None,
                config: &config,
            })
            .await;

        assert!(matches!(
            result,
            Err(BuildPackageError::CryptoFailure {
                cause: CryptoError::MalformedPublicKey(_),
                ..
            })
        ));
    }
}
