//! Packages for external recipients who get the message in the clear.

use super::{AddressPackage, PackageInputs};
use crate::{
    crypto::{engine::Crypto, modulus::ModulusSource},
    error::BuildPackageError,
    recipient::{Recipient, SendStrategy},
};

/// Carries no key material; the send's clear fallback package covers these recipients.
#[derive(Debug, Clone, Copy)]
pub struct ClearInlineBuilder<'a> {
    recipient: &'a Recipient,
}

impl<'a> ClearInlineBuilder<'a> {
    pub fn new(recipient: &'a Recipient) -> Self {
        ClearInlineBuilder { recipient }
    }

    pub fn recipient(&self) -> &'a Recipient {
        self.recipient
    }

    pub async fn build<C: Crypto, M: ModulusSource>(
        &self,
        _inputs: PackageInputs<'_, C, M>,
    ) -> Result<AddressPackage, BuildPackageError> {
        Ok(AddressPackage {
            email: self.recipient.email.clone(),
            send_type: SendStrategy::ClearInline,
            body_key_packet: None,
            attachment_key_packets: Vec::new(),
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
        crypto::{memory::MemoryCrypto, session_key::SessionKey},
        test_utils::FailingModulus,
    };
    use testresult::TestResult;

    #[tokio::test]
    async fn test_carries_no_key_material() -> TestResult {
        let recipient = Recipient::clear_inline("carol@example.org");
        let session_key = SessionKey::from([1; 32]);
        let attachments = vec![AttachmentKeyEntry::new("a", SessionKey::from([2; 32]))];
        let config = SendConfig::default();

        let package = ClearInlineBuilder::new(&recipient)
            .build(PackageInputs {
                crypto: &MemoryCrypto,
                modulus_source: &FailingModulus,
                session_key: &session_key,
                attachments: &attachments,
                password: None,
                password_hint: None,
                config: &config,
            })
            .await?;

        assert_eq!(package.send_type, SendStrategy::ClearInline);
        assert!(package.body_key_packet.is_none());
        assert!(package.attachment_key_packets.is_empty());
        assert!(package.eo_fields.is_none());
        Ok(())
    }
}
