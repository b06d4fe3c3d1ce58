//! Artifacts of the zero-knowledge password proof.
//!
//! The protocol itself lives in the [`Crypto`] engine; the pipeline only
//! carries its inputs and outputs around.
//!
//! [`Crypto`]: super::engine::Crypto

use serde::{Deserialize, Serialize};
use std::fmt;

/// Random salt bound into the password hash.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Salt(#[serde(with = "crate::util::base64")] Vec<u8>);

impl Salt {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Salt {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Salt({})", crate::util::base64::encode(&self.0))
    }
}

/// Password hash bound to a salt and modulus. Secret; never leaves the sender.
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword(Vec<u8>);

impl HashedPassword {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for HashedPassword {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashedPassword(SECRET)")
    }
}

/// Public verifier the server checks password proofs against.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Verifier(#[serde(with = "crate::util::base64")] Vec<u8>);

impl Verifier {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Verifier {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for Verifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Verifier({} bytes)", self.0.len())
    }
}
