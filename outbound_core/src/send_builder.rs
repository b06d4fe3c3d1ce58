//! Aggregates one outgoing message and packages it for every recipient.

use crate::{
    attachment::AttachmentKeyEntry,
    config::SendConfig,
    crypto::{
        engine::Crypto,
        modulus::ModulusSource,
        password::Password,
        session_key::{SessionAlgorithm, SessionKey},
    },
    error::SendError,
    fallback::ClearFallbackPackage,
    package::{AddressPackage, PackageBuilder, PackageInputs},
    recipient::{classify, Recipient, SendStrategy},
    request::{EncryptedBody, SendRequest},
};
use derive_more::derive::Debug;
use futures::future::try_join_all;
use tracing::{debug, info, instrument, warn};

/// Lifecycle of a [`SendBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Inputs may still change.
    Accumulating,

    /// A build was started; inputs are frozen.
    Built,
}

/// Collects the inputs of one send and turns them into address packages.
///
/// Inputs are set while [`Phase::Accumulating`]. The first call to
/// [`build_all`][Self::build_all] that gets past its precondition checks
/// (a body, at least one recipient, and a password whenever someone is
/// encrypt-outside) seals the builder: every setter afterwards returns [`SendError::Sealed`].
/// Building again re-runs every package from scratch with the same inputs,
/// which is how a failed send is retried.
///
/// ```
/// # use outbound_core::{
/// #     crypto::{
/// #         memory::MemoryCrypto,
/// #         modulus::{AuthModulus, FixedModulus},
/// #         session_key::{SessionAlgorithm, SessionKey},
/// #         share_key::ShareSecretKey,
/// #     },
/// #     recipient::Recipient,
/// #     request::EncryptedBody,
/// #     send_builder::SendBuilder,
/// # };
/// # futures::executor::block_on(async {
/// let mut modulus = vec![0xff; 32];
/// modulus[0] = 0xed;
/// modulus[31] = 0x7f;
/// let moduli = FixedModulus(AuthModulus { modulus_id: "m1".into(), modulus });
///
/// let alice = ShareSecretKey::generate(&mut rand::thread_rng());
/// let mut send = SendBuilder::new(MemoryCrypto, moduli);
///
/// let session_key = SessionKey::generate(&mut rand::thread_rng());
/// send.set_body(EncryptedBody::from(vec![0xde, 0xad]), session_key, SessionAlgorithm::Aes256).unwrap();
/// send.add_recipient(Recipient::internal("alice@example.com", Some(alice.public_key()))).unwrap();
///
/// let request = send.build_request().await.unwrap();
/// assert_eq!(request.send_types, 1);
/// # });
/// ```
#[derive(Debug)]
pub struct SendBuilder<C: Crypto, M: ModulusSource> {
    #[debug(skip)]
    crypto: C,

    #[debug(skip)]
    modulus_source: M,

    config: SendConfig,
    body: Option<EncryptedBody>,
    session_key: Option<SessionKey>,
    body_algorithm: SessionAlgorithm,
    attachments: Vec<AttachmentKeyEntry>,
    password: Option<Password>,
    password_hint: Option<String>,
    recipients: Vec<Recipient>,
    phase: Phase,
}

impl<C: Crypto, M: ModulusSource> SendBuilder<C, M> {
    pub fn new(crypto: C, modulus_source: M) -> Self {
        Self::with_config(crypto, modulus_source, SendConfig::default())
    }

    pub fn with_config(crypto: C, modulus_source: M, config: SendConfig) -> Self {
        SendBuilder {
            crypto,
            modulus_source,
            config,
            body: None,
            session_key: None,
            body_algorithm: SessionAlgorithm::default(),
            attachments: Vec::new(),
            password: None,
            password_hint: None,
            recipients: Vec::new(),
            phase: Phase::Accumulating,
        }
    }

    pub fn config(&self) -> &SendConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_built(&self) -> bool {
        self.phase == Phase::Built
    }

    fn ensure_accumulating(&self) -> Result<(), SendError> {
        match self.phase {
            Phase::Accumulating => Ok(()),
            Phase::Built => Err(SendError::Sealed),
        }
    }

    /// Set the encrypted body, the clear session key it was encrypted under,
    /// and the cipher that key belongs to.
    pub fn set_body(
        &mut self,
        body: EncryptedBody,
        session_key: SessionKey,
        algorithm: SessionAlgorithm,
    ) -> Result<(), SendError> {
        self.ensure_accumulating()?;
        self.body = Some(body);
        self.session_key = Some(session_key);
        self.body_algorithm = algorithm;
        Ok(())
    }

    /// Replace the attachment list. Order is preserved in every package.
    pub fn set_attachments(&mut self, attachments: Vec<AttachmentKeyEntry>) -> Result<(), SendError> {
        self.ensure_accumulating()?;
        self.attachments = attachments;
        Ok(())
    }

    pub fn add_attachment(&mut self, attachment: AttachmentKeyEntry) -> Result<(), SendError> {
        self.ensure_accumulating()?;
        self.attachments.push(attachment);
        Ok(())
    }

    /// Set the password shared by every encrypt-outside recipient.
    pub fn set_password(
        &mut self,
        password: Password,
        hint: Option<String>,
    ) -> Result<(), SendError> {
        self.ensure_accumulating()?;
        self.password = Some(password);
        self.password_hint = hint;
        Ok(())
    }

    pub fn add_recipient(&mut self, recipient: Recipient) -> Result<(), SendError> {
        self.ensure_accumulating()?;
        if recipient.has_ignored_outside_flag() {
            debug!(email = %recipient.email, "ignoring encrypt-outside flag on internal recipient");
        }
        self.recipients.push(recipient);
        Ok(())
    }

    pub fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }

    pub fn attachments(&self) -> &[AttachmentKeyEntry] {
        &self.attachments
    }

    pub fn has_strategy(&self, strategy: SendStrategy) -> bool {
        self.recipients.iter().any(|r| classify(r) == strategy)
    }

    pub fn contains_outside_recipient(&self) -> bool {
        self.has_strategy(SendStrategy::EncryptOutside)
    }

    /// The clear session keys, present exactly when some recipient is clear-inline.
    ///
    /// Also `None` while no body has been set.
    pub fn clear_fallback_package(&self) -> Option<ClearFallbackPackage> {
        if !self.has_strategy(SendStrategy::ClearInline) {
            return None;
        }

        let session_key = self.session_key.as_ref()?;
        Some(ClearFallbackPackage::new(
            session_key,
            self.body_algorithm,
            &self.attachments,
        ))
    }

    /// Build every recipient's package concurrently.
    ///
    /// Fails fast: the first failing recipient aborts the send and the
    /// builds still in flight are dropped. Packages come back in recipient
    /// order.
    #[instrument(skip(self), fields(recipients = self.recipients.len(), attachments = self.attachments.len()))]
    pub async fn build_all(&mut self) -> Result<Vec<AddressPackage>, SendError> {
        if self.body.is_none() {
            return Err(SendError::MissingBody);
        }

        if self.recipients.is_empty() {
            return Err(SendError::NoRecipients);
        }

        if self.password.is_none() && self.contains_outside_recipient() {
            return Err(SendError::MissingPassword);
        }

        if self.phase == Phase::Accumulating {
            debug!("sealing send inputs");
            self.phase = Phase::Built;
        }

        let session_key = self.session_key.as_ref().ok_or(SendError::MissingBody)?;
        let inputs = PackageInputs {
            crypto: &self.crypto,
            modulus_source: &self.modulus_source,
            session_key,
            attachments: &self.attachments,
            password: self.password.as_ref(),
            password_hint: self.password_hint.as_deref(),
            config: &self.config,
        };

        let builders: Vec<PackageBuilder<'_>> = self
            .recipients
            .iter()
            .map(PackageBuilder::for_recipient)
            .collect();

        let packages = try_join_all(builders.iter().map(|builder| builder.build(inputs)))
            .await
            .inspect_err(|e| warn!(email = %e.email(), error = %e, "aborting send"))?;

        info!(packages = packages.len(), "built address packages");
        Ok(packages)
    }

    /// [`build_all`][Self::build_all], assembled into the request the server accepts.
    pub async fn build_request(&mut self) -> Result<SendRequest, SendError> {
        let packages = self.build_all().await?;
        let body = self.body.clone().ok_or(SendError::MissingBody)?;

        Ok(SendRequest::new(
            body,
            packages,
            self.clear_fallback_package(),
            self.config.expiration_offset,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        crypto::{memory::MemoryCrypto, modulus::FixedModulus},
        test_utils::test_modulus,
    };
    use testresult::TestResult;

    fn builder() -> SendBuilder<MemoryCrypto, FixedModulus> {
        SendBuilder::new(MemoryCrypto, FixedModulus(test_modulus()))
    }

    #[tokio::test]
    async fn test_missing_body() {
        let mut send = builder();
        send.add_recipient(Recipient::clear_inline("carol@example.org"))
            .unwrap();

        assert!(matches!(send.build_all().await, Err(SendError::MissingBody)));
        assert_eq!(send.phase(), Phase::Accumulating);
    }

    #[tokio::test]
    async fn test_no_recipients() {
        let mut send = builder();
        send.set_body(EncryptedBody::from(vec![1]), SessionKey::from([1; 32]), SessionAlgorithm::Aes256)
            .unwrap();

        assert!(matches!(send.build_all().await, Err(SendError::NoRecipients)));
    }

    #[tokio::test]
    async fn test_sealed_after_build() -> TestResult {
        let mut send = builder();
        send.set_body(EncryptedBody::from(vec![1]), SessionKey::from([1; 32]), SessionAlgorithm::Aes256)?;
        send.add_recipient(Recipient::clear_inline("carol@example.org"))?;

        send.build_all().await?;
        assert!(send.is_built());

        assert!(matches!(
            send.add_recipient(Recipient::clear_inline("dave@example.org")),
            Err(SendError::Sealed)
        ));
        assert!(matches!(
            send.add_attachment(AttachmentKeyEntry::new("a", SessionKey::from([2; 32]))),
            Err(SendError::Sealed)
        ));
        assert!(matches!(
            send.set_password(Password::new("pw")?, None),
            Err(SendError::Sealed)
        ));

        assert_eq!(send.build_all().await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_password_keeps_accumulating() -> TestResult {
        let mut send = builder();
        send.set_body(EncryptedBody::from(vec![1]), SessionKey::from([1; 32]), SessionAlgorithm::Aes256)?;
        send.add_recipient(Recipient::encrypt_outside("bob@example.org"))?;

        assert!(matches!(send.build_all().await, Err(SendError::MissingPassword)));
        assert_eq!(send.phase(), Phase::Accumulating);

        send.set_password(Password::new("hunter2")?, None)?;
        let packages = send.build_all().await?;
        assert_eq!(packages.len(), 1);
        assert!(packages[0].eo_fields.is_some());
        Ok(())
    }

    #[test]
    fn test_fallback_carries_body_algorithm() -> TestResult {
        let mut send = builder();
        send.set_body(
            EncryptedBody::from(vec![1]),
            SessionKey::from([1; 32]),
            SessionAlgorithm::XChaCha20Poly1305,
        )?;
        send.add_recipient(Recipient::clear_inline("carol@example.org"))?;

        let fallback = send.clear_fallback_package().ok_or("no clear fallback")?;
        assert_eq!(fallback.body.algorithm, SessionAlgorithm::XChaCha20Poly1305);
        Ok(())
    }

    #[test]
    fn test_strategy_queries() -> TestResult {
        let mut send = builder();
        send.set_body(EncryptedBody::from(vec![1]), SessionKey::from([1; 32]), SessionAlgorithm::Aes256)?;
        send.add_recipient(Recipient::internal("alice@example.com", None))?;
        assert!(!send.contains_outside_recipient());
        assert!(send.clear_fallback_package().is_none());

        send.add_recipient(Recipient::encrypt_outside("bob@example.org"))?;
        send.add_recipient(Recipient::clear_inline("carol@example.org"))?;
        assert!(send.contains_outside_recipient());
        assert!(SendStrategy::ALL.iter().all(|s| send.has_strategy(*s)));
        assert!(send.clear_fallback_package().is_some());
        Ok(())
    }
}
