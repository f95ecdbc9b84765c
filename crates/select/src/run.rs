//! One complete mirror race

use crate::arbiter::Arbiter;
use apkidx_errors::Error;
use apkidx_net::{fetch_all, IndexRequest, NetClient};
use apkidx_signing::SignatureVerifier;
use apkidx_types::{Mirror, Selection};
use tokio::sync::mpsc;
use tracing::debug;

/// Fetch the index from every mirror and return the freshest verified copy
///
/// Returns once every fetch has finished and every fetched index has been
/// ranked.
///
/// # Errors
///
/// Returns an error only if the arbiter task fails. Mirrors that cannot be
/// reached or whose index does not verify are left out of the result.
pub async fn select_freshest(
    client: &NetClient,
    mirrors: &[Mirror],
    request: &IndexRequest,
    verifier: SignatureVerifier,
) -> Result<Selection, Error> {
    let (tx, rx) = mpsc::channel(mirrors.len().max(1));
    let arbiter = tokio::spawn(Arbiter::new(verifier).run(rx));

    let report = fetch_all(client, mirrors, request, tx).await;
    debug!(
        dispatched = report.dispatched,
        delivered = report.delivered,
        failed = report.failed,
        "all mirrors finished"
    );

    arbiter
        .await
        .map_err(|e| Error::internal(format!("arbiter task failed: {e}")))?
}
