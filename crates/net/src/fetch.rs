//! Concurrent index retrieval from every mirror
//!
//! One task per mirror. Each task waits `stagger × position` before issuing
//! its request so the mirrors are not hit in one synchronized burst, then
//! hands the buffered body to the channel. A mirror that fails is dropped for
//! this run.

use crate::NetClient;
use apkidx_types::{FetchedIndex, Mirror};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// What to fetch from each mirror
#[derive(Debug, Clone)]
pub struct IndexRequest {
    pub repo_path: String,
    pub file_name: String,
    pub stagger: Duration,
}

/// Counts gathered once every fetch task has finished
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchReport {
    pub dispatched: usize,
    pub delivered: usize,
    pub failed: usize,
}

/// Fetch the index from every mirror in parallel and send each body to `tx`.
///
/// Returns after all tasks have completed. `tx` is dropped on return, so a
/// receiver sees the channel close once the last fetch is in.
pub async fn fetch_all(
    client: &NetClient,
    mirrors: &[Mirror],
    request: &IndexRequest,
    tx: mpsc::Sender<FetchedIndex>,
) -> FetchReport {
    let mut tasks = JoinSet::new();

    for (i, mirror) in mirrors.iter().enumerate() {
        let client = client.clone();
        let mirror = mirror.clone();
        let tx = tx.clone();
        let url = mirror.file_url(&request.repo_path, &request.file_name);
        let delay = request
            .stagger
            .saturating_mul(u32::try_from(i).unwrap_or(u32::MAX));

        tasks.spawn(async move {
            tokio::time::sleep(delay).await;
            debug!(mirror = %mirror, position = i, "requesting index");

            let start = Instant::now();
            let blob = match client.get_bytes(&url, mirror.credentials()).await {
                Ok(blob) => blob,
                Err(e) => {
                    debug!(mirror = %mirror, error = %e, "mirror dropped");
                    return false;
                }
            };
            let latency = start.elapsed();
            debug!(mirror = %mirror, bytes = blob.len(), ?latency, "index fetched");

            tx.send(FetchedIndex {
                mirror,
                blob,
                latency,
            })
            .await
            .is_ok()
        });
    }
    drop(tx);

    let mut report = FetchReport {
        dispatched: mirrors.len(),
        ..FetchReport::default()
    };
    while let Some(result) = tasks.join_next().await {
        match result {
            Ok(true) => report.delivered += 1,
            Ok(false) => report.failed += 1,
            Err(e) => {
                warn!(error = %e, "fetch task failed");
                report.failed += 1;
            }
        }
    }
    report
}
