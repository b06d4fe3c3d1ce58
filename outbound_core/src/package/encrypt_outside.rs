//! Packages for external recipients behind the password-protected unlock page.

use super::{AddressPackage, EoAuthPacket, EoFields, PackageInputs};
use crate::{
    attachment::rewrap_all,
    crypto::{
        engine::Crypto,
        modulus::{Modulus, ModulusSource},
        password::Password,
        srp::Salt,
    },
    error::{BuildPackageError, EoFailure},
    recipient::{Recipient, SendStrategy},
    util::base64,
};
use tracing::{debug, instrument};

const TOKEN_ALPHABET: &[u8; 62] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Largest multiple of the alphabet size that fits in a byte.
const TOKEN_SAMPLE_CEILING: u8 = 248;

/// Wraps everything under the send password and derives a fresh verifier.
#[derive(Debug, Clone, Copy)]
pub struct EncryptOutsideBuilder<'a> {
    recipient: &'a Recipient,
}

impl<'a> EncryptOutsideBuilder<'a> {
    pub fn new(recipient: &'a Recipient) -> Self {
        EncryptOutsideBuilder { recipient }
    }

    pub fn recipient(&self) -> &'a Recipient {
        self.recipient
    }

    #[instrument(skip_all, fields(email = %self.recipient.email))]
    pub async fn build<C: Crypto, M: ModulusSource>(
        &self,
        inputs: PackageInputs<'_, C, M>,
    ) -> Result<AddressPackage, BuildPackageError> {
        self.try_build(inputs)
            .await
            .map_err(|cause| BuildPackageError::EoPackageFailed {
                email: self.recipient.email.clone(),
                cause,
            })
    }

    async fn try_build<C: Crypto, M: ModulusSource>(
        &self,
        inputs: PackageInputs<'_, C, M>,
    ) -> Result<AddressPackage, EoFailure> {
        let password = inputs.password.ok_or(EoFailure::MissingPassword)?;

        let body_key_packet = inputs
            .crypto
            .symmetric_wrap(inputs.session_key, password)?;

        let token = random_token(inputs.crypto, inputs.config.token_length);
        let encoded_token = base64::encode(token.as_bytes());
        let encrypted_token = inputs
            .crypto
            .symmetric_encrypt(encoded_token.as_bytes(), password)?;

        let auth = auth_packet(
            inputs.crypto,
            inputs.modulus_source,
            password,
            inputs.config.salt_length,
        )
        .await?;

        let attachment_key_packets = rewrap_all(
            inputs.crypto,
            inputs.attachments,
            SendStrategy::EncryptOutside,
            None,
            Some(password),
        )?;

        Ok(AddressPackage {
            email: self.recipient.email.clone(),
            send_type: SendStrategy::EncryptOutside,
            body_key_packet: Some(body_key_packet),
            attachment_key_packets,
            sign: self.recipient.sign,
            eo_fields: Some(EoFields {
                token: encoded_token,
                encrypted_token,
                auth,
                hint: inputs.password_hint.map(str::to_string),
            }),
        })
    }
}

/// Fetch a fresh modulus and derive a salted verifier for `password` under it.
#[instrument(skip_all)]
pub async fn auth_packet<C: Crypto, M: ModulusSource>(
    crypto: &C,
    modulus_source: &M,
    password: &Password,
    salt_length: usize,
) -> Result<EoAuthPacket, EoFailure> {
    let fetched = modulus_source
        .fetch_modulus()
        .await
        .map_err(|e| EoFailure::FetchModulus(Box::new(e)))?;
    debug!(modulus_id = %fetched.modulus_id, "fetched auth modulus");

    let modulus = Modulus::try_from_le_bytes(fetched.modulus)?;

    let mut salt = vec![0u8; salt_length];
    crypto.fill_random(&mut salt);
    let salt = Salt::from(salt);

    let hashed = crypto.hash_password(password, &salt, &modulus)?;
    let verifier = crypto.derive_verifier(&modulus, &hashed)?;

    Ok(EoAuthPacket {
        modulus_id: fetched.modulus_id,
        salt,
        verifier,
    })
}

/// A random alphanumeric token of `len` characters.
pub fn random_token<C: Crypto + ?Sized>(crypto: &C, len: usize) -> String {
    let mut token = String::with_capacity(len);
    let mut buf = [0u8; 64];

    while token.len() < len {
        crypto.fill_random(&mut buf);
        for &b in buf.iter().filter(|&&b| b < TOKEN_SAMPLE_CEILING) {
            if token.len() == len {
                break;
            }
            token.push(TOKEN_ALPHABET[usize::from(b) % TOKEN_ALPHABET.len()] as char);
        }
    }

    token
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        attachment::AttachmentKeyEntry,
        config::SendConfig,
        crypto::{
            memory::MemoryCrypto,
            modulus::FixedModulus,
            session_key::SessionKey,
        },
        test_utils::{test_modulus, FailingModulus},
    };
    use testresult::TestResult;

    #[test]
    fn test_token_shape() {
        let token = random_token(&MemoryCrypto, 32);
        assert_eq!(token.len(), 32);
        assert!(token.bytes().all(|b| b.is_ascii_alphanumeric()));
        assert_ne!(token, random_token(&MemoryCrypto, 32));
    }

    #[tokio::test]
    async fn test_package_unlocks_with_password() -> TestResult {
        let recipient = Recipient::encrypt_outside("bob@example.org");
        let password = Password::new("correct horse")?;
        let session_key = SessionKey::from([9; 32]);
        let attachments = vec![AttachmentKeyEntry::new("a", SessionKey::from([10; 32]))];
        let config = SendConfig::default();
        let modulus = FixedModulus(test_modulus());

        let package = EncryptOutsideBuilder::new(&recipient)
            .build(PackageInputs {
                crypto: &MemoryCrypto,
                modulus_source: &modulus,
                session_key: &session_key,
                attachments: &attachments,
                password: Some(&password),
                password_hint: Some("battery"),
                config: &config,
            })
            .await?;

        assert_eq!(package.send_type, SendStrategy::EncryptOutside);
        let body = package.body_key_packet.as_ref().ok_or("missing body packet")?;
        assert_eq!(MemoryCrypto.symmetric_unwrap(body, &password)?, session_key);
        assert_eq!(
            MemoryCrypto.symmetric_unwrap(&package.attachment_key_packets[0].key_packet, &password)?,
            SessionKey::from([10; 32])
        );

        let eo = package.eo_fields.as_ref().ok_or("missing eo fields")?;
        assert_eq!(eo.hint.as_deref(), Some("battery"));
        assert_eq!(
            MemoryCrypto.symmetric_decrypt(&eo.encrypted_token, &password)?,
            eo.token.as_bytes()
        );
        assert_eq!(base64::decode(&eo.token)?.len(), config.token_length);

        assert_eq!(eo.auth.modulus_id, test_modulus().modulus_id);
        assert_eq!(eo.auth.salt.as_bytes().len(), config.salt_length);
        let modulus = Modulus::try_from_le_bytes(test_modulus().modulus)?;
        assert!(MemoryCrypto.check_verifier(&password, &eo.auth.salt, &modulus, &eo.auth.verifier)?);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_password() {
        let recipient = Recipient::encrypt_outside("bob@example.org");
        let session_key = SessionKey::from([9; 32]);
        let config = SendConfig::default();
        let modulus = FixedModulus(test_modulus());

        let result = EncryptOutsideBuilder::new(&recipient)
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
            Err(BuildPackageError::EoPackageFailed {
                cause: EoFailure::MissingPassword,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_modulus_fetch_failure() -> TestResult {
        let recipient = Recipient::encrypt_outside("bob@example.org");
        let password = Password::new("correct horse")?;
        let session_key = SessionKey::from([9; 32]);
        let config = SendConfig::default();

        let result = EncryptOutsideBuilder::new(&recipient)
            .build(PackageInputs {
                crypto: &MemoryCrypto,
                modulus_source: &FailingModulus,
                session_key: &session_key,
                attachments: &[],
                password: Some(&password),
                password_hint: None,
                config: &config,
            })
            .await;

        assert!(matches!(
            result,
            Err(BuildPackageError::EoPackageFailed {
                cause: EoFailure::FetchModulus(_),
                ..
            })
        ));
        Ok(())
    }
}
