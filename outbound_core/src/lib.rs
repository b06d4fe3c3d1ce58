#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_debug_implementations,
    future_incompatible,
    let_underscore,
//     missing_docs,
    rust_2021_compatibility,
    nonstandard_style
)]
#![deny(unreachable_pub)]

pub mod attachment;
pub mod config;
pub mod crypto;
pub mod error;
pub mod fallback;
pub mod package;
pub mod recipient;
pub mod request;
pub mod send_builder;
pub mod util;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
