//! Final result of a mirror race

use crate::{FetchedIndex, IndexFormat, Mirror, VerifiedIndex};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;
use std::time::Duration;

/// A mirror that served an index as fresh as the winner's but arrived later
#[derive(Debug, Clone)]
pub struct TiedMirror {
    pub mirror: Mirror,
    pub latency: Duration,
}

/// The freshest verified index and the mirrors that tied with it
#[derive(Debug, Clone)]
pub struct BestIndex {
    pub fetched: FetchedIndex,
    pub verified: VerifiedIndex,
    pub tied: Vec<TiedMirror>,
}

impl BestIndex {
    #[must_use]
    pub fn mirror(&self) -> &Mirror {
        &self.fetched.mirror
    }

    #[must_use]
    pub fn blob(&self) -> &Bytes {
        &self.fetched.blob
    }

    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.verified.timestamp
    }
}

/// Result of racing every mirror
#[derive(Debug, Clone)]
pub enum Selection {
    /// No mirror served an index whose signature verified
    None,
    Best(BestIndex),
}

impl Selection {
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    #[must_use]
    pub fn best(&self) -> Option<&BestIndex> {
        match self {
            Self::None => None,
            Self::Best(best) => Some(best),
        }
    }

    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.best().map(BestIndex::timestamp)
    }

    /// Mirror list ranked by the race: the owner first, then every tied
    /// mirror annotated with its latency.
    #[must_use]
    pub fn mirror_report(&self) -> String {
        let mut out = String::new();
        if let Some(best) = self.best() {
            let _ = writeln!(out, "{}", best.mirror());
            for tied in &best.tied {
                let _ = writeln!(out, "{}", tied.mirror);
                let _ = writeln!(out, "# latency: {:?}", tied.latency);
            }
        }
        out
    }

    #[must_use]
    pub fn summary(&self) -> SelectionSummary {
        match self.best() {
            None => SelectionSummary::default(),
            Some(best) => SelectionSummary {
                mirror: Some(best.mirror().to_string()),
                timestamp: Some(best.timestamp()),
                key_id: Some(best.verified.key_id.clone()),
                format: Some(best.verified.format),
                size: best.blob().len(),
                latency_ms: Some(duration_ms(best.fetched.latency)),
                tied: best
                    .tied
                    .iter()
                    .map(|t| TiedSummary {
                        mirror: t.mirror.to_string(),
                        latency_ms: duration_ms(t.latency),
                    })
                    .collect(),
            },
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Serializable view of a [`Selection`] for JSON output
#[derive(Debug, Clone, Default, Serialize)]
pub struct SelectionSummary {
    pub mirror: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub key_id: Option<String>,
    pub format: Option<IndexFormat>,
    pub size: usize,
    pub latency_ms: Option<u64>,
    pub tied: Vec<TiedSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TiedSummary {
    pub mirror: String,
    pub latency_ms: u64,
}
