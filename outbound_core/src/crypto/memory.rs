//! In-memory reference engine.

use super::{
    domain_separator::{ECDH_WRAP_CONTEXT, PASSWORD_HASH_CONTEXT, PASSWORD_WRAP_CONTEXT},
    engine::{Crypto, CryptoError},
    key_packet::KeyPacket,
    modulus::Modulus,
    password::Password,
    public_key::PublicKey,
    session_key::SessionKey,
    share_key::ShareSecretKey,
    srp::{HashedPassword, Salt, Verifier},
};
use num::BigUint;
use tracing::instrument;

/// Length of the random salt prefixed to password-wrapped packets.
pub const WRAP_SALT_LEN: usize = 16;

/// Generator of the verifier group.
const GENERATOR: u32 = 2;

/// An in-process [`Crypto`] engine.
///
/// * Asymmetric wrap: ephemeral X25519 agreement, BLAKE3 KDF, XChaCha20-Poly1305.
///   Packet layout is `ephemeral_pk || nonce || ciphertext`.
/// * Symmetric wrap: BLAKE3 KDF over `salt || password`, XChaCha20-Poly1305.
///   Packet layout is `salt || nonce || ciphertext`.
/// * Verifier: `g^x mod N` with `g = 2` and `x` the modulus-bound password hash.
///
/// <div class="warning">
///
/// The password KDF here is a single BLAKE3 derivation, not a memory-hard
/// function. Fine for tests and for passwords that are already
/// high-entropy; production deployments should plug in their OpenPGP engine.
///
/// </div>
///
/// It also carries the recipient- and server-side inverses
/// ([`asymmetric_unwrap`][Self::asymmetric_unwrap],
/// [`symmetric_unwrap`][Self::symmetric_unwrap],
/// [`symmetric_decrypt`][Self::symmetric_decrypt],
/// [`check_verifier`][Self::check_verifier]).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MemoryCrypto;

impl MemoryCrypto {
    fn password_key(salt: &[u8], password: &Password) -> SessionKey {
        let mut material = Vec::with_capacity(salt.len() + password.as_bytes().len());
        material.extend_from_slice(salt);
        material.extend_from_slice(password.as_bytes());
        SessionKey::from(blake3::derive_key(PASSWORD_WRAP_CONTEXT, &material))
    }

    fn ecdh_key(
        shared: &x25519_dalek::SharedSecret,
        ephemeral_pk: &x25519_dalek::PublicKey,
        recipient_pk: &x25519_dalek::PublicKey,
    ) -> SessionKey {
        let mut material = Vec::with_capacity(96);
        material.extend_from_slice(shared.as_bytes());
        material.extend_from_slice(ephemeral_pk.as_bytes());
        material.extend_from_slice(recipient_pk.as_bytes());
        SessionKey::from(blake3::derive_key(ECDH_WRAP_CONTEXT, &material))
    }

    fn password_seal(&self, blob: &[u8], password: &Password) -> Result<Vec<u8>, CryptoError> {
        let mut salt = [0u8; WRAP_SALT_LEN];
        self.fill_random(&mut salt);

        let sealed = Self::password_key(&salt, password)
            .seal(blob, &mut rand::rngs::OsRng)
            .map_err(|_| CryptoError::Encryption)?;

        let mut out = Vec::with_capacity(WRAP_SALT_LEN + sealed.len());
        out.extend_from_slice(&salt);
        out.extend_from_slice(&sealed);
        Ok(out)
    }

    /// Recipient side of [`Crypto::asymmetric_wrap`].
    #[instrument(skip_all)]
    pub fn asymmetric_unwrap(
        &self,
        packet: &KeyPacket,
        secret_key: &ShareSecretKey,
    ) -> Result<SessionKey, CryptoError> {
        let bytes = packet.as_bytes();
        if bytes.len() < 32 {
            return Err(CryptoError::MalformedPacket);
        }

        let (ephemeral, sealed) = bytes.split_at(32);
        let mut ephemeral_arr = [0u8; 32];
        ephemeral_arr.copy_from_slice(ephemeral);
        let ephemeral_pk = x25519_dalek::PublicKey::from(ephemeral_arr);

        let shared = secret_key.diffie_hellman(&ephemeral_pk);
        let kek = Self::ecdh_key(&shared, &ephemeral_pk, &secret_key.x25519_public_key());
        let clear = kek.open(sealed).map_err(|_| CryptoError::Decryption)?;

        SessionKey::try_from_slice(&clear).ok_or(CryptoError::MalformedPacket)
    }

    /// Recipient side of [`Crypto::symmetric_wrap`].
    pub fn symmetric_unwrap(
        &self,
        packet: &KeyPacket,
        password: &Password,
    ) -> Result<SessionKey, CryptoError> {
        let clear = self.symmetric_decrypt(packet.as_bytes(), password)?;
        SessionKey::try_from_slice(&clear).ok_or(CryptoError::MalformedPacket)
    }

    /// Inverse of [`Crypto::symmetric_encrypt`].
    #[instrument(skip_all)]
    pub fn symmetric_decrypt(
        &self,
        blob: &[u8],
        password: &Password,
    ) -> Result<Vec<u8>, CryptoError> {
        if blob.len() < WRAP_SALT_LEN {
            return Err(CryptoError::MalformedPacket);
        }

        let (salt, sealed) = blob.split_at(WRAP_SALT_LEN);
        Self::password_key(salt, password)
            .open(sealed)
            .map_err(|_| CryptoError::Decryption)
    }

    /// Server-side check: does `password` reproduce `verifier` for this salt and modulus?
    pub fn check_verifier(
        &self,
        password: &Password,
        salt: &Salt,
        modulus: &Modulus,
        verifier: &Verifier,
    ) -> Result<bool, CryptoError> {
        let hashed = self.hash_password(password, salt, modulus)?;
        let expected = self.derive_verifier(modulus, &hashed)?;
        Ok(expected == *verifier)
    }
}

impl Crypto for MemoryCrypto {
    #[instrument(skip_all, fields(pk = %public_key))]
    fn asymmetric_wrap(
        &self,
        session_key: &SessionKey,
        public_key: &PublicKey,
    ) -> Result<KeyPacket, CryptoError> {
        let recipient_arr = <[u8; 32]>::try_from(public_key.as_bytes()).map_err(|_| {
            CryptoError::MalformedPublicKey(format!(
                "expected 32 bytes, got {}",
                public_key.as_bytes().len()
            ))
        })?;
        let recipient_pk = x25519_dalek::PublicKey::from(recipient_arr);

        let ephemeral = x25519_dalek::EphemeralSecret::random_from_rng(rand::rngs::OsRng);
        let ephemeral_pk = x25519_dalek::PublicKey::from(&ephemeral);
        let shared = ephemeral.diffie_hellman(&recipient_pk);

        let sealed = Self::ecdh_key(&shared, &ephemeral_pk, &recipient_pk)
            .seal(session_key.as_slice(), &mut rand::rngs::OsRng)
            .map_err(|_| CryptoError::Encryption)?;

        let mut packet = Vec::with_capacity(32 + sealed.len());
        packet.extend_from_slice(ephemeral_pk.as_bytes());
        packet.extend_from_slice(&sealed);
        Ok(packet.into())
    }

    #[instrument(skip_all)]
    fn symmetric_wrap(
        &self,
        session_key: &SessionKey,
        password: &Password,
    ) -> Result<KeyPacket, CryptoError> {
        Ok(self.password_seal(session_key.as_slice(), password)?.into())
    }

    #[instrument(skip_all)]
    fn symmetric_encrypt(&self, blob: &[u8], password: &Password) -> Result<Vec<u8>, CryptoError> {
        self.password_seal(blob, password)
    }

    #[instrument(skip_all, fields(modulus = ?modulus))]
    fn hash_password(
        &self,
        password: &Password,
        salt: &Salt,
        modulus: &Modulus,
    ) -> Result<HashedPassword, CryptoError> {
        if salt.as_bytes().is_empty() {
            return Err(CryptoError::PasswordHash("empty salt".to_string()));
        }

        let mut hasher = blake3::Hasher::new_derive_key(PASSWORD_HASH_CONTEXT);
        hasher.update(&(salt.as_bytes().len() as u64).to_le_bytes());
        hasher.update(salt.as_bytes());
        hasher.update(&(password.as_bytes().len() as u64).to_le_bytes());
        hasher.update(password.as_bytes());
        hasher.update(modulus.as_le_bytes());

        let mut out = vec![0u8; modulus.len()];
        hasher.finalize_xof().fill(&mut out);
        Ok(out.into())
    }

    #[instrument(skip_all, fields(modulus = ?modulus))]
    fn derive_verifier(
        &self,
        modulus: &Modulus,
        hashed: &HashedPassword,
    ) -> Result<Verifier, CryptoError> {
        let n = BigUint::from_bytes_le(modulus.as_le_bytes());
        if n <= BigUint::from(GENERATOR) {
            return Err(CryptoError::Verifier("modulus too small".to_string()));
        }

        let x = BigUint::from_bytes_le(hashed.as_bytes());
        let v = BigUint::from(GENERATOR).modpow(&x, &n);

        let mut bytes = v.to_bytes_le();
        bytes.resize(modulus.len(), 0);
        Ok(bytes.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_modulus;

    #[test]
    fn test_asymmetric_round_trip() {
        let crypto = MemoryCrypto;
        let mut csprng = rand::thread_rng();
        let sk = ShareSecretKey::generate(&mut csprng);
        let session_key = SessionKey::generate(&mut csprng);

        let packet = crypto
            .asymmetric_wrap(&session_key, &sk.public_key())
            .unwrap();

        assert_eq!(crypto.asymmetric_unwrap(&packet, &sk).unwrap(), session_key);
    }

    #[test]
    fn test_asymmetric_unwrap_with_wrong_key_fails() {
        let crypto = MemoryCrypto;
        let mut csprng = rand::thread_rng();
        let alice = ShareSecretKey::generate(&mut csprng);
        let eve = ShareSecretKey::generate(&mut csprng);
        let session_key = SessionKey::generate(&mut csprng);

        let packet = crypto
            .asymmetric_wrap(&session_key, &alice.public_key())
            .unwrap();

        assert_eq!(
            crypto.asymmetric_unwrap(&packet, &eve),
            Err(CryptoError::Decryption)
        );
    }

    #[test]
    fn test_malformed_public_key() {
        let result = MemoryCrypto.asymmetric_wrap(
            &SessionKey::from([1; 32]),
            &PublicKey::from(vec![1, 2, 3]),
        );
        assert!(matches!(result, Err(CryptoError::MalformedPublicKey(_))));
    }

    #[test]
    fn test_password_wrap_is_salted() {
        let crypto = MemoryCrypto;
        let password = Password::new("hunter2").unwrap();
        let session_key = SessionKey::from([9; 32]);

        let a = crypto.symmetric_wrap(&session_key, &password).unwrap();
        let b = crypto.symmetric_wrap(&session_key, &password).unwrap();
        assert_ne!(a, b);

        assert_eq!(crypto.symmetric_unwrap(&a, &password).unwrap(), session_key);
        assert_eq!(crypto.symmetric_unwrap(&b, &password).unwrap(), session_key);
    }

    #[test]
    fn test_password_unwrap_with_wrong_password_fails() {
        let crypto = MemoryCrypto;
        let packet = crypto
            .symmetric_wrap(&SessionKey::from([9; 32]), &Password::new("hunter2").unwrap())
            .unwrap();

        assert_eq!(
            crypto.symmetric_unwrap(&packet, &Password::new("hunter3").unwrap()),
            Err(CryptoError::Decryption)
        );
    }

    #[test]
    fn test_verifier_checks_out() {
        let crypto = MemoryCrypto;
        let modulus = Modulus::try_from_le_bytes(test_modulus().modulus).unwrap();
        let password = Password::new("hunter2").unwrap();
        let salt = Salt::from(vec![42; 10]);

        let hashed = crypto.hash_password(&password, &salt, &modulus).unwrap();
        let verifier = crypto.derive_verifier(&modulus, &hashed).unwrap();

        assert_eq!(verifier.as_bytes().len(), modulus.len());
        assert!(crypto
            .check_verifier(&password, &salt, &modulus, &verifier)
            .unwrap());
        assert!(!crypto
            .check_verifier(&Password::new("hunter3").unwrap(), &salt, &modulus, &verifier)
            .unwrap());
        assert!(!crypto
            .check_verifier(&password, &Salt::from(vec![43; 10]), &modulus, &verifier)
            .unwrap());
    }
}
