//! Cryptographic primitives, wrappers, and the engine traits the pipeline consumes.

pub mod domain_separator;
pub mod engine;
pub mod key_packet;
pub mod memory;
pub mod modulus;
pub mod password;
pub mod public_key;
pub mod session_key;
pub mod share_key;
pub mod srp;
