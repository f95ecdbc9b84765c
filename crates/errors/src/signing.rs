//! Signing error types
//!
//! Every variant here means "this mirror's index is not trusted". None of them
//! abort a run on their own.

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum SigningError {
    #[error("failed to decompress signature segment: {reason}")]
    Decompress { reason: String },

    #[error("malformed signature archive: {reason}")]
    Format { reason: String },

    #[error("no public key found for key id: {key_id}")]
    KeyNotFound { key_id: String },

    #[error("invalid public key {key_id}: {reason}")]
    KeyFormat { key_id: String, reason: String },

    #[error("unsupported key type for {key_id}: {algorithm}")]
    UnsupportedKeyType { key_id: String, algorithm: String },

    #[error("signature verification failed for key {key_id}")]
    VerificationFailed { key_id: String },
}

impl UserFacingError for SigningError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::KeyNotFound { .. } => {
                Some("Run with --fetch-keys or copy the signer's public key into the keys directory.")
            }
            Self::UnsupportedKeyType { .. } => Some("Only RSA public keys can verify index signatures."),
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::Decompress { .. } => "signing.decompress",
            Self::Format { .. } => "signing.format",
            Self::KeyNotFound { .. } => "signing.key_not_found",
            Self::KeyFormat { .. } => "signing.key_format",
            Self::UnsupportedKeyType { .. } => "signing.unsupported_key_type",
            Self::VerificationFailed { .. } => "signing.verification_failed",
        })
    }
}
