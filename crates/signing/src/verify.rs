//! Signature verification for repository indexes
//!
//! The signature segment is a gzipped tar archive whose first entry is named
//! `.SIGN.RSA.<key id>`. Its payload is a PKCS#1 v1.5 signature over the
//! SHA-1 digest of the still-compressed content segment, and its mtime is the
//! time the index was signed.

use crate::keys::KeyStore;
use crate::split::{signed_region, split_streams};
use apkidx_errors::SigningError;
use apkidx_types::{IndexFormat, SignatureRecord, VerifiedIndex};
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use sha1::{Digest, Sha1};
use std::io::Read;
use std::path::PathBuf;
use tracing::debug;

/// Marker the signer puts in front of its key file name
pub const SIGNATURE_MARKER: &str = ".SIGN.RSA.";

/// Decode the signature segment and read its first entry
///
/// # Errors
///
/// Returns `Decompress` if the segment is not a gzip stream and `Format` if
/// the archive has no readable first entry or the entry name carries no key id.
pub fn read_signature(segment: &[u8]) -> Result<SignatureRecord, SigningError> {
    if segment.is_empty() {
        return Err(SigningError::Decompress {
            reason: "index carries no signature stream".to_string(),
        });
    }

    let mut archive = Vec::new();
    GzDecoder::new(segment)
        .read_to_end(&mut archive)
        .map_err(|e| SigningError::Decompress {
            reason: e.to_string(),
        })?;

    let format_err = |reason: String| SigningError::Format { reason };

    let mut tar = tar::Archive::new(archive.as_slice());
    let mut entry = tar
        .entries()
        .map_err(|e| format_err(e.to_string()))?
        .next()
        .ok_or_else(|| format_err("signature archive is empty".to_string()))?
        .map_err(|e| format_err(e.to_string()))?;

    let name = entry
        .path()
        .map_err(|e| format_err(e.to_string()))?
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| format_err("signature entry has no file name".to_string()))?;
    let key_id = name.replace(SIGNATURE_MARKER, "");
    if key_id.is_empty() {
        return Err(format_err(format!("no key id in entry name {name}")));
    }

    let mtime = entry
        .header()
        .mtime()
        .map_err(|e| format_err(e.to_string()))?;
    let timestamp = i64::try_from(mtime)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .ok_or_else(|| format_err(format!("entry mtime {mtime} out of range")))?;

    let mut signature = Vec::new();
    entry
        .read_to_end(&mut signature)
        .map_err(|e| format_err(e.to_string()))?;

    Ok(SignatureRecord {
        key_id,
        signature,
        timestamp,
    })
}

/// Checks index signatures against a directory of trusted keys
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    keys: KeyStore,
    formats: Vec<IndexFormat>,
}

impl SignatureVerifier {
    /// Verifier accepting every supported index format
    #[must_use]
    pub fn new<P: Into<PathBuf>>(keys_dir: P) -> Self {
        Self {
            keys: KeyStore::new(keys_dir),
            formats: IndexFormat::ALL.to_vec(),
        }
    }

    /// Restrict the accepted formats; they are tried in the given order
    #[must_use]
    pub fn with_formats(mut self, formats: &[IndexFormat]) -> Self {
        self.formats = formats.to_vec();
        self
    }

    /// Split a raw index blob and verify it
    ///
    /// # Errors
    ///
    /// See [`SignatureVerifier::verify`].
    pub fn verify_blob(&mut self, blob: &[u8]) -> Result<VerifiedIndex, SigningError> {
        let (signature, content) = split_streams(blob);
        self.verify(signature, content)
    }

    /// Verify a signature segment against its content segment
    ///
    /// # Errors
    ///
    /// Returns the decoding or key errors of [`read_signature`] and
    /// [`KeyStore::get`], or `VerificationFailed` when no accepted format's
    /// signed region matches the signature.
    pub fn verify(
        &mut self,
        signature: &[u8],
        content: &[u8],
    ) -> Result<VerifiedIndex, SigningError> {
        let record = read_signature(signature)?;
        let key = self.keys.get(&record.key_id)?;

        for &format in &self.formats {
            let Some(region) = signed_region(format, content) else {
                continue;
            };
            let digest = Sha1::digest(region);
            if key.verify_sha1(&digest, &record.signature) {
                return Ok(VerifiedIndex {
                    timestamp: record.timestamp,
                    key_id: record.key_id,
                    format,
                });
            }
            debug!(key_id = %record.key_id, %format, "signature does not match");
        }

        Err(SigningError::VerificationFailed {
            key_id: record.key_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{gzip, TestSigner};
    use tempfile::tempdir;

    const SIGNED_AT: u64 = 1_700_000_000;

    fn setup() -> (tempfile::TempDir, TestSigner) {
        let dir = tempdir().unwrap();
        let signer = TestSigner::generate("alpine-devel@example.org-5261cecb.rsa.pub");
        signer.install(dir.path()).unwrap();
        (dir, signer)
    }

    #[test]
    fn test_read_signature_record() {
        let signer = TestSigner::generate("k.rsa.pub");
        let segment = signer.signature_segment(b"payload", SIGNED_AT);
        let record = read_signature(&segment).unwrap();
        assert_eq!(record.key_id, "k.rsa.pub");
        assert_eq!(record.timestamp.timestamp(), 1_700_000_000);
        assert!(!record.signature.is_empty());
    }

    #[test]
    fn test_verify_current_format() {
        let (dir, signer) = setup();
        let content = gzip(b"P:busybox\nV:1.36.1-r0\n");
        let blob = signer.signed_index(&content, SIGNED_AT);

        let mut verifier = SignatureVerifier::new(dir.path());
        let verified = verifier.verify_blob(&blob).unwrap();
        assert_eq!(verified.timestamp.timestamp(), 1_700_000_000);
        assert_eq!(verified.key_id, signer.key_id());
        assert_eq!(verified.format, IndexFormat::Current);
    }

    #[test]
    fn test_flipped_content_byte_fails() {
        let (dir, signer) = setup();
        let content = gzip(b"P:busybox\nV:1.36.1-r0\n");
        let mut blob = signer.signed_index(&content, SIGNED_AT);
        let last = blob.len() - 1;
        blob[last] ^= 0x01;

        let mut verifier = SignatureVerifier::new(dir.path());
        assert!(matches!(
            verifier.verify_blob(&blob),
            Err(SigningError::VerificationFailed { .. })
        ));
    }

    #[test]
    fn test_legacy_format_needs_fallback() {
        let (dir, signer) = setup();
        let inner = gzip(b"P:musl\nV:1.2.4-r2\n");
        let trailer = gzip(b"trailer");
        let segment = signer.signature_segment(&inner, SIGNED_AT);
        let blob = [segment.as_slice(), inner.as_slice(), trailer.as_slice()].concat();

        let mut verifier = SignatureVerifier::new(dir.path());
        let verified = verifier.verify_blob(&blob).unwrap();
        assert_eq!(verified.format, IndexFormat::Legacy);

        let mut strict =
            SignatureVerifier::new(dir.path()).with_formats(&[IndexFormat::Current]);
        assert!(matches!(
            strict.verify_blob(&blob),
            Err(SigningError::VerificationFailed { .. })
        ));
    }

    #[test]
    fn test_unsigned_blob_rejected() {
        let (dir, _signer) = setup();
        let blob = gzip(b"unsigned index");
        let mut verifier = SignatureVerifier::new(dir.path());
        assert!(matches!(
            verifier.verify_blob(&blob),
            Err(SigningError::Decompress { .. })
        ));
    }

    #[test]
    fn test_signature_archive_without_entries() {
        let (dir, _signer) = setup();
        let empty_tar = tar::Builder::new(Vec::new()).into_inner().unwrap();
        let segment = gzip(&empty_tar);
        let content = gzip(b"content");

        let mut verifier = SignatureVerifier::new(dir.path());
        assert!(matches!(
            verifier.verify(&segment, &content),
            Err(SigningError::Format { .. })
        ));
    }

    #[test]
    fn test_unknown_signer() {
        let dir = tempdir().unwrap();
        let signer = TestSigner::generate("stranger.rsa.pub");
        let blob = signer.signed_index(&gzip(b"content"), SIGNED_AT);

        let mut verifier = SignatureVerifier::new(dir.path());
        assert!(matches!(
            verifier.verify_blob(&blob),
            Err(SigningError::KeyNotFound { .. })
        ));
    }

    #[test]
    fn test_wrong_key_under_signer_name() {
        let dir = tempdir().unwrap();
        let signer = TestSigner::generate("shared.rsa.pub");
        let impostor = TestSigner::generate("shared.rsa.pub");
        impostor.install(dir.path()).unwrap();
        let blob = signer.signed_index(&gzip(b"content"), SIGNED_AT);

        let mut verifier = SignatureVerifier::new(dir.path());
        assert!(matches!(
            verifier.verify_blob(&blob),
            Err(SigningError::VerificationFailed { .. })
        ));
    }
}
