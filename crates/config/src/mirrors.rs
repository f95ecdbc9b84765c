//! Mirror list loading
//!
//! One base URL per line. Blank lines and `#` comments are ignored and a
//! trailing slash is dropped.

use apkidx_errors::{ConfigError, Error};
use apkidx_types::{BasicCredentials, Mirror};
use std::path::Path;
use tokio::fs;
use tracing::warn;

/// Parse mirror list text into mirrors, numbering them in file order
///
/// Entries that are not absolute URLs are skipped with a warning and do not
/// consume a position.
#[must_use]
pub fn parse_mirror_list(contents: &str, credentials: Option<&BasicCredentials>) -> Vec<Mirror> {
    let mut mirrors = Vec::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match Mirror::parse(line.trim_end_matches('/'), mirrors.len()) {
            Ok(mirror) => mirrors.push(mirror.with_credentials(credentials.cloned())),
            Err(e) => warn!(entry = line, error = %e, "skipping mirror entry"),
        }
    }
    mirrors
}

/// Read and parse a mirror list file
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub async fn load_mirrors(
    path: &Path,
    credentials: Option<&BasicCredentials>,
) -> Result<Vec<Mirror>, Error> {
    let contents = fs::read_to_string(path)
        .await
        .map_err(|_| ConfigError::NotFound {
            path: path.display().to_string(),
        })?;
    Ok(parse_mirror_list(&contents, credentials))
}
