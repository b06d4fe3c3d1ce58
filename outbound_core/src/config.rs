//! Knobs for one send.

/// Length of the random encrypt-outside token, in characters.
pub const DEFAULT_TOKEN_LENGTH: usize = 32;

/// Length of the verifier salt, in bytes (80 bits).
pub const DEFAULT_SALT_LENGTH: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendConfig {
    /// Characters in the token an encrypt-outside recipient's unlock reproduces.
    pub token_length: usize,

    /// Bytes of salt bound into each verifier.
    pub salt_length: usize,

    /// Seconds after which the server expires the message, if any.
    pub expiration_offset: Option<u32>,
}

impl SendConfig {
    pub fn with_expiration_offset(mut self, seconds: u32) -> Self {
        self.expiration_offset = Some(seconds);
        self
    }
}

impl Default for SendConfig {
    fn default() -> Self {
        SendConfig {
            token_length: DEFAULT_TOKEN_LENGTH,
            salt_length: DEFAULT_SALT_LENGTH,
            expiration_offset: None,
        }
    }
}
