//! Errors raised while packaging a send.

use crate::{attachment::RewrapError, crypto::engine::CryptoError, recipient::Email};
use thiserror::Error;

/// Why one recipient's [`AddressPackage`] could not be built.
///
/// Every variant is fatal for the whole send.
///
/// [`AddressPackage`]: crate::package::AddressPackage
#[derive(Debug, Error)]
pub enum BuildPackageError {
    #[error("Internal recipient {0} has no public key")]
    MissingPublicKey(Email),

    #[error("Packaging for {email} failed: {cause}")]
    CryptoFailure {
        email: Email,
        #[source]
        cause: CryptoError,
    },

    #[error("Encrypt-outside package for {email} failed: {cause}")]
    EoPackageFailed {
        email: Email,
        #[source]
        cause: EoFailure,
    },

    #[error("Attachment keys for {email} could not be rewrapped: {cause}")]
    Rewrap {
        email: Email,
        #[source]
        cause: RewrapError,
    },
}

impl BuildPackageError {
    /// The recipient whose package failed.
    pub fn email(&self) -> &Email {
        match self {
            BuildPackageError::MissingPublicKey(email) => email,
            BuildPackageError::CryptoFailure { email, .. } => email,
            BuildPackageError::EoPackageFailed { email, .. } => email,
            BuildPackageError::Rewrap { email, .. } => email,
        }
    }
}

/// Cause of an encrypt-outside package failure.
#[derive(Debug, Error)]
pub enum EoFailure {
    #[error("No encrypt-outside password set for this send")]
    MissingPassword,

    #[error("Cannot fetch auth modulus: {0}")]
    FetchModulus(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Rewrap(#[from] RewrapError),
}

/// Failure of a whole send attempt.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("Send builder is sealed after its first build")]
    Sealed,

    #[error("No encrypted body set")]
    MissingBody,

    #[error("No recipients")]
    NoRecipients,

    #[error("Encrypt-outside recipients need a send password")]
    MissingPassword,

    #[error(transparent)]
    Package(#[from] BuildPackageError),
}
