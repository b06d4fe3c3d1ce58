//! Recipients and how each one is addressed.

use crate::crypto::public_key::PublicKey;
use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

/// A recipient address, as typed into the compose form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Email {
    fn from(email: &str) -> Self {
        Self(email.to_string())
    }
}

/// Whether the recipient holds an account on this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    Internal,
    External,
}

/// How one recipient's copy of the message is protected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SendStrategy {
    /// Session keys wrapped under the recipient's public key.
    Internal,

    /// Session keys wrapped under the message-wide password; the recipient
    /// unlocks a server-hosted copy.
    EncryptOutside,

    /// No per-recipient wrapping; relies on the shared clear fallback package.
    ClearInline,
}

impl SendStrategy {
    pub const ALL: [SendStrategy; 3] = [
        SendStrategy::Internal,
        SendStrategy::EncryptOutside,
        SendStrategy::ClearInline,
    ];

    /// The bit this strategy occupies in a wire `Type` mask.
    pub const fn send_type(self) -> u8 {
        match self {
            SendStrategy::Internal => 1,
            SendStrategy::EncryptOutside => 2,
            SendStrategy::ClearInline => 4,
        }
    }

    /// OR of [`send_type`][Self::send_type] over `strategies`.
    pub fn mask<I: IntoIterator<Item = SendStrategy>>(strategies: I) -> u8 {
        strategies
            .into_iter()
            .fold(0, |acc, strategy| acc | strategy.send_type())
    }
}

/// One addressee of a send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub email: Email,
    pub account_type: AccountType,
    pub encrypt_outside: bool,
    pub public_key: Option<PublicKey>,

    /// Whether the recipient's copy is signed.
    pub sign: bool,
}

impl Recipient {
    /// An account holder. Signed by default.
    pub fn internal<E: Into<Email>>(email: E, public_key: Option<PublicKey>) -> Self {
        Recipient {
            email: email.into(),
            account_type: AccountType::Internal,
            encrypt_outside: false,
            public_key,
            sign: true,
        }
    }

    /// Someone without an account, reached through the password-protected unlock page.
    pub fn encrypt_outside<E: Into<Email>>(email: E) -> Self {
        Recipient {
            email: email.into(),
            account_type: AccountType::External,
            encrypt_outside: true,
            public_key: None,
            sign: false,
        }
    }

    /// Someone without an account who gets the clear inline copy.
    pub fn clear_inline<E: Into<Email>>(email: E) -> Self {
        Recipient {
            email: email.into(),
            account_type: AccountType::External,
            encrypt_outside: false,
            public_key: None,
            sign: false,
        }
    }

    pub fn with_sign(mut self, sign: bool) -> Self {
        self.sign = sign;
        self
    }

    /// An internal recipient flagged for encrypt-outside; the flag is ignored.
    pub fn has_ignored_outside_flag(&self) -> bool {
        self.account_type == AccountType::Internal && self.encrypt_outside
    }
}

/// Pick the [`SendStrategy`] for a recipient.
///
/// Total and infallible. `Internal` accounts always get [`SendStrategy::Internal`],
/// even when flagged for encrypt-outside: the flag is meaningless for someone
/// who can already receive asymmetrically encrypted mail.
pub fn classify(recipient: &Recipient) -> SendStrategy {
    match (recipient.account_type, recipient.encrypt_outside) {
        (AccountType::Internal, _) => SendStrategy::Internal,
        (AccountType::External, true) => SendStrategy::EncryptOutside,
        (AccountType::External, false) => SendStrategy::ClearInline,
    }
}
