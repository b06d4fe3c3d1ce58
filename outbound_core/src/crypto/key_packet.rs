//! Wrapped session keys.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A session key wrapped for exactly one recipient and one mechanism.
///
/// The bytes are opaque to the pipeline: whatever the [`Crypto`] engine
/// produced is forwarded untouched, and rendered as base64 on the wire.
///
/// [`Crypto`]: super::engine::Crypto
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyPacket(#[serde(with = "crate::util::base64")] Vec<u8>);

impl KeyPacket {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for KeyPacket {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for KeyPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyPacket({} bytes)", self.0.len())
    }
}
