//! HTTP client shared by every mirror request
//!
//! Requests are issued exactly once. The transport timeout is the only bound
//! on a mirror that stops responding.

use apkidx_config::NetworkConfig;
use apkidx_errors::{ConfigError, Error, NetworkError};
use apkidx_types::BasicCredentials;
use bytes::Bytes;
use reqwest::{Client, Identity, Response};
use std::path::PathBuf;
use std::time::Duration;

/// PEM files of a TLS client certificate and its private key
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Network client configuration
#[derive(Debug, Clone)]
pub struct NetConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub pool_idle_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub user_agent: String,
    pub identity: Option<ClientIdentity>,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(5),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 4,
            user_agent: format!("apkidx/{}", env!("CARGO_PKG_VERSION")),
            identity: None,
        }
    }
}

impl From<&NetworkConfig> for NetConfig {
    fn from(config: &NetworkConfig) -> Self {
        let defaults = Self::default();
        let identity = match (&config.client_cert, &config.client_key) {
            (Some(cert), Some(key)) => Some(ClientIdentity {
                cert: cert.clone(),
                key: key.clone(),
            }),
            _ => None,
        };
        Self {
            timeout: config.timeout(),
            connect_timeout: config.connect_timeout(),
            user_agent: config.user_agent.clone().unwrap_or(defaults.user_agent),
            identity,
            ..defaults
        }
    }
}

/// HTTP client wrapper
#[derive(Clone)]
pub struct NetClient {
    client: Client,
    config: NetConfig,
}

impl NetClient {
    /// Create a new network client
    ///
    /// # Errors
    ///
    /// Returns an error if the client identity files cannot be read or parsed,
    /// or if the underlying reqwest client fails to initialize.
    pub fn new(config: NetConfig) -> Result<Self, Error> {
        let mut builder = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent);

        if let Some(identity) = &config.identity {
            builder = builder.identity(load_identity(identity)?);
        }

        let client = builder
            .build()
            .map_err(|e| NetworkError::TlsError(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create with default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created with default settings.
    pub fn with_defaults() -> Result<Self, Error> {
        Self::new(NetConfig::default())
    }

    #[must_use]
    pub fn config(&self) -> &NetConfig {
        &self.config
    }

    /// Execute a single GET request
    ///
    /// # Errors
    ///
    /// Returns an error on connection failure or timeout. HTTP error statuses
    /// are returned as a response.
    pub async fn get(
        &self,
        url: &str,
        credentials: Option<&BasicCredentials>,
    ) -> Result<Response, Error> {
        let mut request = self.client.get(url);
        if let Some(creds) = credentials {
            request = request.basic_auth(&creds.username, Some(&creds.password));
        }
        request
            .send()
            .await
            .map_err(|e| classify(&e, url).into())
    }

    /// GET `url` and buffer the whole body
    ///
    /// # Errors
    ///
    /// Returns an error on connection failure, timeout, a non-success status,
    /// or a failure while reading the body.
    pub async fn get_bytes(
        &self,
        url: &str,
        credentials: Option<&BasicCredentials>,
    ) -> Result<Bytes, Error> {
        let response = self.get(url, credentials).await?;

        if !response.status().is_success() {
            return Err(NetworkError::HttpError {
                status: response.status().as_u16(),
                message: response.status().to_string(),
            }
            .into());
        }

        response
            .bytes()
            .await
            .map_err(|e| classify(&e, url).into())
    }
}

fn load_identity(identity: &ClientIdentity) -> Result<Identity, Error> {
    let read = |path: &PathBuf| {
        std::fs::read(path).map_err(|_| ConfigError::NotFound {
            path: path.display().to_string(),
        })
    };
    let cert = read(&identity.cert)?;
    let key = read(&identity.key)?;
    Identity::from_pkcs8_pem(&cert, &key)
        .map_err(|e| NetworkError::TlsError(format!("invalid client certificate: {e}")).into())
}

fn classify(error: &reqwest::Error, url: &str) -> NetworkError {
    if error.is_timeout() {
        NetworkError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        NetworkError::ConnectionRefused(error.to_string())
    } else {
        NetworkError::DownloadFailed(error.to_string())
    }
}
