//! Auth moduli for encrypt-outside password verifiers.

use super::engine::CryptoError;
use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use std::{convert::Infallible, fmt};

/// Smallest modulus the pipeline accepts, in bytes.
pub const MIN_MODULUS_LEN: usize = 32;

/// Server-side identifier of an auth modulus.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into, Serialize, Deserialize)]
pub struct ModulusId(String);

impl From<&str> for ModulusId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A modulus as returned by the auth server, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthModulus {
    pub modulus_id: ModulusId,

    /// Little-endian modulus bytes.
    pub modulus: Vec<u8>,
}

/// A validated group modulus: at least [`MIN_MODULUS_LEN`] bytes and odd.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Modulus(Vec<u8>);

impl Modulus {
    /// Validate little-endian modulus bytes.
    pub fn try_from_le_bytes(bytes: Vec<u8>) -> Result<Self, CryptoError> {
        if bytes.len() < MIN_MODULUS_LEN {
            return Err(CryptoError::InvalidModulus("too short"));
        }

        if bytes.first().is_some_and(|low| low & 1 == 0) {
            return Err(CryptoError::InvalidModulus("even"));
        }

        Ok(Self(bytes))
    }

    pub fn as_le_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Modulus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Modulus({} bits)", self.0.len() * 8)
    }
}

/// Where fresh auth moduli come from.
///
/// In production this is a network round-trip to the auth server, and the
/// only suspension point of the whole packaging pipeline.
// NOTE: we assume single-threaded async, so this can be ignored for now
#[allow(async_fn_in_trait)]
pub trait ModulusSource {
    type FetchError: std::error::Error + Send + Sync + 'static;

    async fn fetch_modulus(&self) -> Result<AuthModulus, Self::FetchError>;
}

impl<T: ModulusSource + ?Sized> ModulusSource for &T {
    type FetchError = T::FetchError;

    async fn fetch_modulus(&self) -> Result<AuthModulus, Self::FetchError> {
        (**self).fetch_modulus().await
    }
}

/// A [`ModulusSource`] that always hands out the same modulus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedModulus(pub AuthModulus);

impl ModulusSource for FixedModulus {
    type FetchError = Infallible;

    async fn fetch_modulus(&self) -> Result<AuthModulus, Self::FetchError> {
        Ok(self.0.clone())
    }
}
