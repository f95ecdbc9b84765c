#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Index signature handling for apkidx
//!
//! Splits a fetched index into its signature and content streams and checks
//! the embedded RSA signature against a directory of trusted keys.

pub mod keys;
pub mod split;
pub mod verify;

#[cfg(any(test, feature = "test-utils"))]
#[allow(clippy::missing_panics_doc, clippy::must_use_candidate)]
pub mod fixtures;

pub use keys::{KeyStore, PublicKey};
pub use split::{signed_region, split_streams, GZIP_HEADER};
pub use verify::{read_signature, SignatureVerifier, SIGNATURE_MARKER};
