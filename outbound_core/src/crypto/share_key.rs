//! Newtype around an [ECDH] secret key, the private half of a [`PublicKey`].
//!
//! The sending pipeline never needs a recipient's secret key. This exists so
//! that recipients (and tests standing in for them) can open the key packets
//! produced by [`MemoryCrypto`].
//!
//! [ECDH]: https://wikipedia.org/wiki/Elliptic-curve_Diffie%E2%80%93Hellman
//! [`MemoryCrypto`]: super::memory::MemoryCrypto

use super::public_key::PublicKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::instrument;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShareSecretKey([u8; 32]);

impl ShareSecretKey {
    #[instrument(skip_all)]
    pub fn generate<R: rand::CryptoRng + rand::RngCore>(csprng: &mut R) -> Self {
        x25519_dalek::StaticSecret::random_from_rng(csprng).into()
    }

    pub fn x25519_public_key(&self) -> x25519_dalek::PublicKey {
        x25519_dalek::PublicKey::from(&x25519_dalek::StaticSecret::from(self.0))
    }

    pub fn public_key(&self) -> PublicKey {
        self.x25519_public_key().into()
    }

    pub fn diffie_hellman(
        &self,
        counterparty: &x25519_dalek::PublicKey,
    ) -> x25519_dalek::SharedSecret {
        x25519_dalek::StaticSecret::from(self.0).diffie_hellman(counterparty)
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0
    }
}

impl From<x25519_dalek::StaticSecret> for ShareSecretKey {
    fn from(secret: x25519_dalek::StaticSecret) -> Self {
        Self(secret.to_bytes())
    }
}

impl fmt::Debug for ShareSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShareSecretKey(SECRET)")
    }
}
