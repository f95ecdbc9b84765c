#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for apkidx
//!
//! Mirrors, fetched index blobs, verification results and the final
//! selection shared by the fetcher, the verifier and the arbiter.

pub mod index;
pub mod mirror;
pub mod selection;

pub use index::{FetchedIndex, IndexFormat, SignatureRecord, VerifiedIndex};
pub use mirror::{BasicCredentials, Mirror};
pub use selection::{BestIndex, Selection, SelectionSummary, TiedMirror, TiedSummary};

/// File name of the signed repository index
pub const INDEX_FILE_NAME: &str = "APKINDEX.tar.gz";
