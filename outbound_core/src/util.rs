//! Utilities.

pub mod base64;
pub(crate) mod hex;
