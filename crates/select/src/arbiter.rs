//! Freshness arbitration between verified mirrors
//!
//! The arbiter is the only owner of the selection state. Fetch tasks send it
//! their results over a channel and it verifies and ranks them one at a time.

use apkidx_errors::{Error, UserFacingError};
use apkidx_signing::SignatureVerifier;
use apkidx_types::{BestIndex, FetchedIndex, Selection, TiedMirror, VerifiedIndex};
use std::cmp::Ordering;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// What happened to a verified candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    /// Strictly newer than the previous best (or the first one)
    NewBest,
    /// Same timestamp as the current best, recorded as tied
    Tied,
    /// Older than the current best, discarded
    Stale,
}

/// Running best-so-far state
#[derive(Debug, Default)]
pub struct SelectionState {
    best: Option<BestIndex>,
    received: usize,
    rejected: usize,
}

impl SelectionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn best(&self) -> Option<&BestIndex> {
        self.best.as_ref()
    }

    /// Number of candidates seen, verified or not
    #[must_use]
    pub fn received(&self) -> usize {
        self.received
    }

    /// Number of candidates whose signature did not verify
    #[must_use]
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Rank a verified candidate against the current best
    pub fn offer(&mut self, fetched: FetchedIndex, verified: VerifiedIndex) -> Offer {
        let current = self.best.as_ref().map(BestIndex::timestamp);
        match current.map(|ts| verified.timestamp.cmp(&ts)) {
            Some(Ordering::Less) => {
                debug!(mirror = %fetched.mirror, timestamp = %verified.timestamp, "older index discarded");
                Offer::Stale
            }
            Some(Ordering::Equal) => {
                debug!(mirror = %fetched.mirror, latency = ?fetched.latency, "mirror tied with best");
                if let Some(best) = self.best.as_mut() {
                    best.tied.push(TiedMirror {
                        mirror: fetched.mirror,
                        latency: fetched.latency,
                    });
                }
                Offer::Tied
            }
            Some(Ordering::Greater) | None => {
                info!(
                    mirror = %fetched.mirror,
                    timestamp = %verified.timestamp,
                    key_id = %verified.key_id,
                    format = %verified.format,
                    "new freshest index"
                );
                self.best = Some(BestIndex {
                    fetched,
                    verified,
                    tied: Vec::new(),
                });
                Offer::NewBest
            }
        }
    }

    #[must_use]
    pub fn finish(self) -> Selection {
        match self.best {
            Some(best) => Selection::Best(best),
            None => Selection::None,
        }
    }
}

/// Verifies incoming candidates and keeps the freshest
#[derive(Debug)]
pub struct Arbiter {
    verifier: SignatureVerifier,
    state: SelectionState,
}

impl Arbiter {
    #[must_use]
    pub fn new(verifier: SignatureVerifier) -> Self {
        Self {
            verifier,
            state: SelectionState::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Split, verify and rank one fetched index
    ///
    /// Returns `None` when the signature did not verify; the mirror is then
    /// simply out of the race.
    pub fn consider(&mut self, fetched: FetchedIndex) -> Option<Offer> {
        self.state.received += 1;
        match self.verifier.verify_blob(&fetched.blob) {
            Ok(verified) => Some(self.state.offer(fetched, verified)),
            Err(e) => {
                self.state.rejected += 1;
                debug!(
                    mirror = %fetched.mirror,
                    code = e.user_code().unwrap_or("signing"),
                    error = %e,
                    "index rejected"
                );
                None
            }
        }
    }

    /// Consume candidates until every sender is gone, then return the result
    ///
    /// # Errors
    ///
    /// Returns an error only if a verification task panics.
    pub async fn run(self, mut rx: mpsc::Receiver<FetchedIndex>) -> Result<Selection, Error> {
        let mut arbiter = self;
        while let Some(fetched) = rx.recv().await {
            arbiter = tokio::task::spawn_blocking(move || {
                arbiter.consider(fetched);
                arbiter
            })
            .await
            .map_err(|e| Error::internal(format!("verification task failed: {e}")))?;
        }

        info!(
            received = arbiter.state.received(),
            rejected = arbiter.state.rejected(),
            "all candidates ranked"
        );
        Ok(arbiter.state.finish())
    }
}
