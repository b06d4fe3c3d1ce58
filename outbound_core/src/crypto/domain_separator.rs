//! Constants for domain separation

/// The domain separator string for outbound packaging: `/outbound/`.
pub const SEPARATOR_STR: &str = "/outbound/";

/// The same separator as in [`SEPARATOR_STR`], represented as bytes.
pub const SEPARATOR: &[u8] = SEPARATOR_STR.as_bytes();

/// KDF context for keys derived from an X25519 shared secret.
pub const ECDH_WRAP_CONTEXT: &str = "/outbound/ecdh/wrap-session-key/";

/// KDF context for keys derived from a sender-chosen password.
pub const PASSWORD_WRAP_CONTEXT: &str = "/outbound/password/wrap/";

/// KDF context for the password hash bound to an auth modulus.
pub const PASSWORD_HASH_CONTEXT: &str = "/outbound/password/hash-for-modulus/";
