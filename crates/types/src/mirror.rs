//! Mirror identity and credentials

use apkidx_errors::NetworkError;
use std::fmt;
use url::Url;

/// HTTP basic-auth credentials applied to mirror requests
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl BasicCredentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"xxxxx")
            .finish()
    }
}

/// One candidate source for the repository index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mirror {
    base: Url,
    position: usize,
    credentials: Option<BasicCredentials>,
}

impl Mirror {
    /// Build a mirror from a base URL and its position in the mirror list
    #[must_use]
    pub fn new(base: Url, position: usize) -> Self {
        Self {
            base,
            position,
            credentials: None,
        }
    }

    /// Parse a mirror base URL
    ///
    /// # Errors
    ///
    /// Returns an error if `base` is not an absolute URL.
    pub fn parse(base: &str, position: usize) -> Result<Self, NetworkError> {
        let url = Url::parse(base.trim().trim_end_matches('/'))
            .map_err(|e| NetworkError::InvalidUrl(format!("{base}: {e}")))?;
        Ok(Self::new(url, position))
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: Option<BasicCredentials>) -> Self {
        self.credentials = credentials;
        self
    }

    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Zero-based position in the configured mirror list
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub fn credentials(&self) -> Option<&BasicCredentials> {
        self.credentials.as_ref()
    }

    /// Base URL without a trailing slash and without any userinfo
    #[must_use]
    pub fn redacted(&self) -> String {
        let mut url = self.base.clone();
        let _ = url.set_username("");
        let _ = url.set_password(None);
        url.as_str().trim_end_matches('/').to_string()
    }

    /// Full URL of `file_name` under `repo_path` on this mirror
    #[must_use]
    pub fn file_url(&self, repo_path: &str, file_name: &str) -> String {
        let base = self.base.as_str().trim_end_matches('/');
        let repo_path = repo_path.trim_matches('/');
        if repo_path.is_empty() {
            format!("{base}/{file_name}")
        } else {
            format!("{base}/{repo_path}/{file_name}")
        }
    }
}

impl fmt::Display for Mirror {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}
