//! Public keys used to check index signatures
//!
//! Keys live in a flat directory of PEM files, one per signer, named by the
//! key id that signers embed in their signature entries.

use apkidx_errors::SigningError;
use rsa::pkcs8::der::{Decode, Document};
use rsa::pkcs8::SubjectPublicKeyInfoRef;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha1::Sha1;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

const PEM_LABEL: &str = "PUBLIC KEY";

/// A parsed signer key
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PublicKey {
    Rsa(RsaPublicKey),
}

impl PublicKey {
    /// Parse a PEM-encoded `SubjectPublicKeyInfo`
    ///
    /// # Errors
    ///
    /// Returns `KeyFormat` if the PEM or DER is malformed and
    /// `UnsupportedKeyType` if the key is not an RSA key.
    pub fn from_pem(key_id: &str, pem: &str) -> Result<Self, SigningError> {
        let key_format = |reason: String| SigningError::KeyFormat {
            key_id: key_id.to_string(),
            reason,
        };

        let (label, doc) = Document::from_pem(pem).map_err(|e| key_format(e.to_string()))?;
        if label != PEM_LABEL {
            return Err(key_format(format!("unexpected PEM label {label}")));
        }

        let spki = SubjectPublicKeyInfoRef::from_der(doc.as_bytes())
            .map_err(|e| key_format(e.to_string()))?;

        if spki.algorithm.oid != rsa::pkcs1::ALGORITHM_OID {
            return Err(SigningError::UnsupportedKeyType {
                key_id: key_id.to_string(),
                algorithm: spki.algorithm.oid.to_string(),
            });
        }

        RsaPublicKey::try_from(spki)
            .map(Self::Rsa)
            .map_err(|e| key_format(e.to_string()))
    }

    #[must_use]
    pub fn algorithm(&self) -> &'static str {
        match self {
            Self::Rsa(_) => "rsa",
        }
    }

    /// Check a PKCS#1 v1.5 signature over a SHA-1 digest
    #[must_use]
    pub fn verify_sha1(&self, digest: &[u8], signature: &[u8]) -> bool {
        match self {
            Self::Rsa(key) => key
                .verify(Pkcs1v15Sign::new::<Sha1>(), digest, signature)
                .is_ok(),
        }
    }
}

/// Directory-backed key lookup with an in-memory cache
#[derive(Debug, Clone)]
pub struct KeyStore {
    dir: PathBuf,
    cache: HashMap<String, PublicKey>,
}

impl KeyStore {
    #[must_use]
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            dir: dir.into(),
            cache: HashMap::new(),
        }
    }

    /// Look up the key for `key_id`, loading it from disk on first use
    ///
    /// # Errors
    ///
    /// Returns `KeyNotFound` if no readable file exists for the id, or the
    /// errors of [`PublicKey::from_pem`] if the file does not hold a usable key.
    pub fn get(&mut self, key_id: &str) -> Result<&PublicKey, SigningError> {
        if !self.cache.contains_key(key_id) {
            let key = self.load(key_id)?;
            self.cache.insert(key_id.to_string(), key);
        }
        self.cache
            .get(key_id)
            .ok_or_else(|| SigningError::KeyNotFound {
                key_id: key_id.to_string(),
            })
    }

    fn load(&self, key_id: &str) -> Result<PublicKey, SigningError> {
        let not_found = || SigningError::KeyNotFound {
            key_id: key_id.to_string(),
        };

        // ids come from archive entries, keep them inside the directory
        if key_id.is_empty()
            || key_id == "."
            || key_id == ".."
            || key_id.contains(['/', '\\'])
        {
            return Err(not_found());
        }

        let bytes = fs::read(self.dir.join(key_id)).map_err(|e| match e.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => not_found(),
            _ => SigningError::KeyFormat {
                key_id: key_id.to_string(),
                reason: e.to_string(),
            },
        })?;
        let pem = String::from_utf8(bytes).map_err(|e| SigningError::KeyFormat {
            key_id: key_id.to_string(),
            reason: e.to_string(),
        })?;
        PublicKey::from_pem(key_id, &pem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestSigner;
    use tempfile::tempdir;

    // RFC 8410 example Ed25519 key
    const ED25519_PEM: &str = "-----BEGIN PUBLIC KEY-----\n\
        MCowBQYDK2VwAyEAGb9ECWmEzf6FQbrBZ9w7lshQhqowtrbLDFw4rXAxZuE=\n\
        -----END PUBLIC KEY-----\n";

    #[test]
    fn test_parse_rsa_key() {
        let signer = TestSigner::generate("test.rsa.pub");
        let key = PublicKey::from_pem("test.rsa.pub", &signer.public_key_pem()).unwrap();
        assert_eq!(key.algorithm(), "rsa");
    }

    #[test]
    fn test_non_rsa_key_is_unsupported() {
        let err = PublicKey::from_pem("ed.pub", ED25519_PEM).unwrap_err();
        assert!(matches!(err, SigningError::UnsupportedKeyType { .. }));
    }

    #[test]
    fn test_garbage_pem() {
        let err = PublicKey::from_pem("junk.pub", "not a key").unwrap_err();
        assert!(matches!(err, SigningError::KeyFormat { .. }));
    }

    #[test]
    fn test_store_lookup() {
        let dir = tempdir().unwrap();
        let signer = TestSigner::generate("alpine@example.org-1.rsa.pub");
        signer.install(dir.path()).unwrap();

        let mut store = KeyStore::new(dir.path());
        assert!(store.get("alpine@example.org-1.rsa.pub").is_ok());
        // served from cache after the file is gone
        std::fs::remove_file(dir.path().join("alpine@example.org-1.rsa.pub")).unwrap();
        assert!(store.get("alpine@example.org-1.rsa.pub").is_ok());

        assert!(matches!(
            store.get("missing.rsa.pub"),
            Err(SigningError::KeyNotFound { .. })
        ));
        assert!(matches!(
            store.get("../escape.pub"),
            Err(SigningError::KeyNotFound { .. })
        ));
    }
}
