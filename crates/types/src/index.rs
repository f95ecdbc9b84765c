//! Index blobs and the results of verifying them

use crate::Mirror;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Raw index bytes fetched from one mirror
#[derive(Debug, Clone)]
pub struct FetchedIndex {
    pub mirror: Mirror,
    pub blob: Bytes,
    /// Round-trip time of the GET, measured until the body was buffered
    pub latency: Duration,
}

/// Signature entry extracted from the signature segment of an index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureRecord {
    pub key_id: String,
    pub signature: Vec<u8>,
    pub timestamp: DateTime<Utc>,
}

/// Layout of the content segment covered by the signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexFormat {
    /// Signature stream followed by one content stream; the signature covers
    /// the whole content segment.
    Current,
    /// Signature stream followed by two content streams; the signature covers
    /// only the first of them.
    Legacy,
}

impl IndexFormat {
    /// Every supported format, in the order verification tries them
    pub const ALL: [IndexFormat; 2] = [IndexFormat::Current, IndexFormat::Legacy];
}

impl fmt::Display for IndexFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Current => write!(f, "current"),
            Self::Legacy => write!(f, "legacy"),
        }
    }
}

/// Outcome of a successful signature check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedIndex {
    pub timestamp: DateTime<Utc>,
    pub key_id: String,
    pub format: IndexFormat,
}
