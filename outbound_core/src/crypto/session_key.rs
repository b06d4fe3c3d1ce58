//! Symmetric session key newtype.

use super::domain_separator::SEPARATOR;
use chacha20poly1305::{AeadInPlace, KeyInit, XChaCha20Poly1305, XNonce};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Length of the nonce prefixed to every [`SessionKey::seal`] output.
pub const NONCE_LEN: usize = 24;

/// A message or attachment session key.
///
/// The body and every attachment are encrypted exactly once under their own
/// [`SessionKey`]. Only the key is then wrapped per recipient, so a send to
/// N recipients never re-encrypts the content.
///
/// # Example
///
/// ```
/// # use outbound_core::crypto::session_key::SessionKey;
/// let key = SessionKey::generate(&mut rand::rngs::OsRng);
/// let sealed = key.seal(b"hello world", &mut rand::rngs::OsRng).unwrap();
/// assert_eq!(key.open(&sealed).unwrap(), b"hello world");
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionKey([u8; 32]);

impl SessionKey {
    /// Get the key as a byte slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Generate a new random session key.
    pub fn generate<R: rand::CryptoRng + rand::RngCore>(csprng: &mut R) -> Self {
        let mut key = [0u8; 32];
        csprng.fill_bytes(&mut key);
        Self(key)
    }

    /// Lift raw key material of exactly 32 bytes.
    pub fn try_from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; 32]>::try_from(bytes).ok().map(Self)
    }

    /// Convert into an [`XChaCha20Poly1305`] cipher.
    pub fn to_xchacha(&self) -> XChaCha20Poly1305 {
        XChaCha20Poly1305::new(&self.0.into())
    }

    /// Encrypt data in place with the [`SessionKey`].
    #[instrument(skip_all)]
    pub fn try_encrypt(
        &self,
        nonce: &[u8; NONCE_LEN],
        data: &mut Vec<u8>,
    ) -> Result<(), chacha20poly1305::Error> {
        self.to_xchacha()
            .encrypt_in_place(XNonce::from_slice(nonce), SEPARATOR, data)
    }

    /// Decrypt data in place with the [`SessionKey`].
    #[instrument(skip_all)]
    pub fn try_decrypt(
        &self,
        nonce: &[u8; NONCE_LEN],
        data: &mut Vec<u8>,
    ) -> Result<(), chacha20poly1305::Error> {
        self.to_xchacha()
            .decrypt_in_place(XNonce::from_slice(nonce), SEPARATOR, data)
    }

    /// Encrypt under a fresh random nonce, returning `nonce || ciphertext`.
    pub fn seal<R: rand::CryptoRng + rand::RngCore>(
        &self,
        plaintext: &[u8],
        csprng: &mut R,
    ) -> Result<Vec<u8>, chacha20poly1305::Error> {
        let mut nonce = [0u8; NONCE_LEN];
        csprng.fill_bytes(&mut nonce);

        let mut buf = plaintext.to_vec();
        self.try_encrypt(&nonce, &mut buf)?;

        let mut out = Vec::with_capacity(NONCE_LEN + buf.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&buf);
        Ok(out)
    }

    /// Inverse of [`seal`][Self::seal].
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, chacha20poly1305::Error> {
        if sealed.len() < NONCE_LEN {
            return Err(chacha20poly1305::Error);
        }

        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        let mut nonce_arr = [0u8; NONCE_LEN];
        nonce_arr.copy_from_slice(nonce);

        let mut buf = ciphertext.to_vec();
        self.try_decrypt(&nonce_arr, &mut buf)?;
        Ok(buf)
    }
}

/// The content cipher a session key is meant for, named as on the wire.
///
/// The pipeline never uses the key under this cipher itself; recipients of
/// the clear fallback need it to decrypt the body and attachments.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionAlgorithm {
    Aes128,
    Aes192,
    #[default]
    Aes256,
    XChaCha20Poly1305,
}

impl From<[u8; 32]> for SessionKey {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<SessionKey> for [u8; 32] {
    fn from(key: SessionKey) -> Self {
        key.0
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("<SessionKey>")
    }
}
