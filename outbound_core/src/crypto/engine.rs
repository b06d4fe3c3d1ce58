//! The cryptographic capabilities the packaging pipeline consumes.

use super::{
    key_packet::KeyPacket,
    modulus::Modulus,
    password::Password,
    public_key::PublicKey,
    session_key::SessionKey,
    srp::{HashedPassword, Salt, Verifier},
};
use rand::RngCore;
use std::{rc::Rc, sync::Arc};
use thiserror::Error;

/// Opaque cryptographic engine.
///
/// Every operation is CPU-bound and treated as synchronous inside a build
/// task. Implementations wrap an OpenPGP binding in production;
/// [`MemoryCrypto`] is the in-process reference engine.
///
/// [`MemoryCrypto`]: super::memory::MemoryCrypto
pub trait Crypto {
    /// Wrap a session key under a recipient's public key.
    fn asymmetric_wrap(
        &self,
        session_key: &SessionKey,
        public_key: &PublicKey,
    ) -> Result<KeyPacket, CryptoError>;

    /// Wrap a session key under a password.
    fn symmetric_wrap(
        &self,
        session_key: &SessionKey,
        password: &Password,
    ) -> Result<KeyPacket, CryptoError>;

    /// Encrypt a short blob (the EO token) under a password.
    fn symmetric_encrypt(&self, blob: &[u8], password: &Password) -> Result<Vec<u8>, CryptoError>;

    /// Hash a password bound to a salt and an auth modulus.
    fn hash_password(
        &self,
        password: &Password,
        salt: &Salt,
        modulus: &Modulus,
    ) -> Result<HashedPassword, CryptoError>;

    /// Compute the public verifier for a hashed password.
    fn derive_verifier(
        &self,
        modulus: &Modulus,
        hashed: &HashedPassword,
    ) -> Result<Verifier, CryptoError>;

    /// Fill `buf` with cryptographically secure random bytes.
    fn fill_random(&self, buf: &mut [u8]) {
        rand::rngs::OsRng.fill_bytes(buf)
    }
}

impl<T: Crypto + ?Sized> Crypto for &T {
    fn asymmetric_wrap(
        &self,
        session_key: &SessionKey,
        public_key: &PublicKey,
    ) -> Result<KeyPacket, CryptoError> {
        (**self).asymmetric_wrap(session_key, public_key)
    }

    fn symmetric_wrap(
        &self,
        session_key: &SessionKey,
        password: &Password,
    ) -> Result<KeyPacket, CryptoError> {
        (**self).symmetric_wrap(session_key, password)
    }

    fn symmetric_encrypt(&self, blob: &[u8], password: &Password) -> Result<Vec<u8>, CryptoError> {
        (**self).symmetric_encrypt(blob, password)
    }

    fn hash_password(
        &self,
        password: &Password,
        salt: &Salt,
        modulus: &Modulus,
    ) -> Result<HashedPassword, CryptoError> {
        (**self).hash_password(password, salt, modulus)
    }

    fn derive_verifier(
        &self,
        modulus: &Modulus,
        hashed: &HashedPassword,
    ) -> Result<Verifier, CryptoError> {
        (**self).derive_verifier(modulus, hashed)
    }

    fn fill_random(&self, buf: &mut [u8]) {
        (**self).fill_random(buf)
    }
}

macro_rules! delegate_crypto {
    ($ptr:ident) => {
        impl<T: Crypto + ?Sized> Crypto for $ptr<T> {
            fn asymmetric_wrap(
                &self,
                session_key: &SessionKey,
                public_key: &PublicKey,
            ) -> Result<KeyPacket, CryptoError> {
                (**self).asymmetric_wrap(session_key, public_key)
            }

            fn symmetric_wrap(
                &self,
                session_key: &SessionKey,
                password: &Password,
            ) -> Result<KeyPacket, CryptoError> {
                (**self).symmetric_wrap(session_key, password)
            }

            fn symmetric_encrypt(
                &self,
                blob: &[u8],
                password: &Password,
            ) -> Result<Vec<u8>, CryptoError> {
                (**self).symmetric_encrypt(blob, password)
            }

            fn hash_password(
                &self,
                password: &Password,
                salt: &Salt,
                modulus: &Modulus,
            ) -> Result<HashedPassword, CryptoError> {
                (**self).hash_password(password, salt, modulus)
            }

            fn derive_verifier(
                &self,
                modulus: &Modulus,
                hashed: &HashedPassword,
            ) -> Result<Verifier, CryptoError> {
                (**self).derive_verifier(modulus, hashed)
            }

            fn fill_random(&self, buf: &mut [u8]) {
                (**self).fill_random(buf)
            }
        }
    };
}

delegate_crypto!(Rc);
delegate_crypto!(Arc);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("Malformed public key: {0}")]
    MalformedPublicKey(String),

    #[error("Encryption failed")]
    Encryption,

    #[error("Decryption failed")]
    Decryption,

    #[error("Malformed key packet")]
    MalformedPacket,

    #[error("Invalid modulus: {0}")]
    InvalidModulus(&'static str),

    #[error("Cannot hash password: {0}")]
    PasswordHash(String),

    #[error("Cannot generate verifier: {0}")]
    Verifier(String),

    #[error("Crypto backend error: {0}")]
    Backend(String),
}
