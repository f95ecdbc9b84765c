//! Public key bootstrap
//!
//! Reads a directory-listing page, picks every link to a `.pub` file and
//! downloads the keys that are not yet in the local key directory. Keys that
//! are already present are never overwritten.

use crate::{fetch_text, parse_url, NetClient};
use apkidx_errors::{Error, NetworkError};
use percent_encoding::percent_decode_str;
use regex::Regex;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Link targets of every `.pub` file referenced by a listing page
///
/// # Errors
///
/// Returns an error if the link pattern fails to compile.
pub fn key_links(listing: &str) -> Result<Vec<String>, Error> {
    let re = Regex::new(r#"(?i)href\s*=\s*["']([^"']+\.pub)["']"#)
        .map_err(|e| Error::internal(e.to_string()))?;
    let mut links: Vec<String> = re
        .captures_iter(listing)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|link| link != "..")
        .collect();
    links.dedup();
    Ok(links)
}

/// Local file name for a key link: its last path component, URL-decoded
#[must_use]
pub fn key_file_name(link: &str) -> Option<String> {
    let last = link.rsplit('/').next()?.replace('+', " ");
    let decoded = percent_decode_str(&last).decode_utf8().ok()?.into_owned();
    match decoded.as_str() {
        "" | "." | ".." => None,
        name if name.contains(['/', '\\']) => None,
        _ => Some(decoded),
    }
}

/// Download every key listed at `keys_url` that is missing from `keys_dir`
///
/// Returns the paths of the keys written.
///
/// # Errors
///
/// Returns an error if the listing or any missing key cannot be fetched, or
/// if the key directory cannot be written.
pub async fn fetch_missing_keys(
    client: &NetClient,
    keys_url: &str,
    keys_dir: &Path,
) -> Result<Vec<PathBuf>, Error> {
    let base = parse_url(keys_url)?;
    let listing = fetch_text(client, base.as_str()).await?;

    let mut written = Vec::new();
    for link in key_links(&listing)? {
        let Some(name) = key_file_name(&link) else {
            debug!(link, "ignoring key link");
            continue;
        };
        let dest = keys_dir.join(&name);
        if fs::try_exists(&dest).await.unwrap_or(false) {
            continue;
        }

        let url = base
            .join(&link)
            .map_err(|e| NetworkError::InvalidUrl(format!("{link}: {e}")))?;
        info!(key = %name, "fetching public key");
        let key = client.get_bytes(url.as_str(), None).await?;

        fs::create_dir_all(keys_dir)
            .await
            .map_err(|e| Error::io_with_path(&e, keys_dir))?;
        fs::write(&dest, &key)
            .await
            .map_err(|e| Error::io_with_path(&e, &dest))?;
        written.push(dest);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"<html><body><pre>
<a href="../">../</a>
<a href="alpine-devel%40lists.alpinelinux.org-4a6a0840.rsa.pub">alpine-devel@...</a>
<a href='alpine-devel%40lists.alpinelinux.org-5261cecb.rsa.pub'>alpine-devel@...</a>
<a href="README.txt">README.txt</a>
</pre></body></html>"#;

    #[test]
    fn test_key_links() {
        let links = key_links(LISTING).unwrap();
        assert_eq!(
            links,
            vec![
                "alpine-devel%40lists.alpinelinux.org-4a6a0840.rsa.pub",
                "alpine-devel%40lists.alpinelinux.org-5261cecb.rsa.pub",
            ]
        );
    }

    #[test]
    fn test_key_file_name() {
        assert_eq!(
            key_file_name("keys/alpine-devel%40lists.alpinelinux.org-4a6a0840.rsa.pub").as_deref(),
            Some("alpine-devel@lists.alpinelinux.org-4a6a0840.rsa.pub")
        );
        assert_eq!(key_file_name("..%2F.pub").as_deref(), None);
        assert_eq!(key_file_name("dir/").as_deref(), None);
        assert_eq!(key_file_name("a&b.rsa.pub").as_deref(), Some("a&b.rsa.pub"));
        assert_eq!(key_file_name("x=y.rsa.pub").as_deref(), Some("x=y.rsa.pub"));
        assert_eq!(key_file_name("a+b%2Bc.rsa.pub").as_deref(), Some("a b+c.rsa.pub"));
        assert_eq!(key_file_name("bad%FF.rsa.pub").as_deref(), None);
    }
}
