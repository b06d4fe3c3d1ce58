//! The message-wide encrypt-outside password.

use thiserror::Error;

/// The password an encrypt-outside recipient types on the unlock page.
///
/// It is set once per send and shared by every encrypt-outside recipient
/// of that message. Never empty.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn new<S: Into<String>>(password: S) -> Result<Self, EmptyPassword> {
        let password = password.into();
        if password.is_empty() {
            return Err(EmptyPassword);
        }
        Ok(Self(password))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(SECRET)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Encrypt-outside password must not be empty")]
pub struct EmptyPassword;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty() {
        assert_eq!(Password::new(""), Err(EmptyPassword));
    }

    #[test]
    fn test_debug_is_redacted() {
        let pw = Password::new("hunter2").unwrap();
        assert!(!format!("{:?}", pw).contains("hunter2"));
    }
}
