//! Fixtures shared by unit and integration tests.

use crate::crypto::{
    engine::{Crypto, CryptoError},
    key_packet::KeyPacket,
    memory::MemoryCrypto,
    modulus::{AuthModulus, Modulus, ModulusSource},
    password::Password,
    public_key::PublicKey,
    session_key::SessionKey,
    srp::{HashedPassword, Salt, Verifier},
};
use std::cell::Cell;
use thiserror::Error;

/// `2^255 - 19`, little-endian.
pub fn test_modulus() -> AuthModulus {
    let mut modulus = vec![0xff; 32];
    modulus[0] = 0xed;
    modulus[31] = 0x7f;

    AuthModulus {
        modulus_id: "test-modulus".into(),
        modulus,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Auth server unreachable")]
pub struct ModulusUnavailable;

/// Every fetch fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingModulus;

impl ModulusSource for FailingModulus {
    type FetchError = ModulusUnavailable;

    async fn fetch_modulus(&self) -> Result<AuthModulus, Self::FetchError> {
        Err(ModulusUnavailable)
    }
}

/// Every fetch hangs forever.
#[derive(Debug, Clone, Copy, Default)]
pub struct PendingModulus;

impl ModulusSource for PendingModulus {
    type FetchError = ModulusUnavailable;

    async fn fetch_modulus(&self) -> Result<AuthModulus, Self::FetchError> {
        futures::future::pending().await
    }
}

/// Hands out a fixed modulus and counts how often it was asked.
#[derive(Debug, Clone)]
pub struct CountingModulus {
    modulus: AuthModulus,
    fetches: Cell<usize>,
}

impl CountingModulus {
    pub fn new(modulus: AuthModulus) -> Self {
        CountingModulus {
            modulus,
            fetches: Cell::new(0),
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.get()
    }
}

impl ModulusSource for CountingModulus {
    type FetchError = ModulusUnavailable;

    async fn fetch_modulus(&self) -> Result<AuthModulus, Self::FetchError> {
        self.fetches.set(self.fetches.get() + 1);
        Ok(self.modulus.clone())
    }
}

/// The operation a [`FaultyCrypto`] refuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    AsymmetricWrap,
    SymmetricWrap,
    DeriveVerifier,
}

/// [`MemoryCrypto`], except one operation always fails.
#[derive(Debug, Clone, Copy)]
pub struct FaultyCrypto(pub Fault);

impl FaultyCrypto {
    fn check(&self, fault: Fault) -> Result<(), CryptoError> {
        if self.0 == fault {
            Err(CryptoError::Backend(format!("injected {:?} fault", fault)))
        } else {
            Ok(())
        }
    }
}

impl Crypto for FaultyCrypto {
    fn asymmetric_wrap(
        &self,
        session_key: &SessionKey,
        public_key: &PublicKey,
    ) -> Result<KeyPacket, CryptoError> {
        self.check(Fault::AsymmetricWrap)?;
        MemoryCrypto.asymmetric_wrap(session_key, public_key)
    }

    fn symmetric_wrap(
        &self,
        session_key: &SessionKey,
        password: &Password,
    ) -> Result<KeyPacket, CryptoError> {
        self.check(Fault::SymmetricWrap)?;
        MemoryCrypto.symmetric_wrap(session_key, password)
    }

    fn symmetric_encrypt(&self, blob: &[u8], password: &Password) -> Result<Vec<u8>, CryptoError> {
        MemoryCrypto.symmetric_encrypt(blob, password)
    }

    fn hash_password(
        &self,
        password: &Password,
        salt: &Salt,
        modulus: &Modulus,
    ) -> Result<HashedPassword, CryptoError> {
        MemoryCrypto.hash_password(password, salt, modulus)
    }

    fn derive_verifier(
        &self,
        modulus: &Modulus,
        hashed: &HashedPassword,
    ) -> Result<Verifier, CryptoError> {
        self.check(Fault::DeriveVerifier)?;
        MemoryCrypto.derive_verifier(modulus, hashed)
    }
}
