//! Command line interface definition

use clap::Parser;
use std::path::PathBuf;

/// apkidx - fetch the freshest signed APKINDEX from a list of mirrors
///
/// Unset options fall back to the config file, then to `APKIDX_*`
/// environment variables, then to built-in defaults.
#[derive(Parser, Debug)]
#[command(name = "apkidx")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fetch the freshest signed APKINDEX from a list of mirrors")]
#[command(long_about = None)]
pub struct Cli {
    /// Repository path below each mirror base URL
    #[arg(long, value_name = "PATH")]
    pub repo: Option<String>,

    /// File with one mirror base URL per line
    #[arg(long, value_name = "FILE")]
    pub mirrors: Option<PathBuf>,

    /// Directory the selected index is written to
    #[arg(long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Page listing the trusted public keys
    #[arg(long, value_name = "URL")]
    pub keys_url: Option<String>,

    /// Directory holding trusted public keys
    #[arg(long, value_name = "DIR")]
    pub keys_dir: Option<PathBuf>,

    /// Download keys listed at --keys-url that are missing from --keys-dir
    #[arg(long)]
    pub fetch_keys: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// PEM client certificate for mirrors requiring TLS client auth
    #[arg(long, value_name = "FILE", requires = "client_key")]
    pub client_cert: Option<PathBuf>,

    /// PEM private key matching --client-cert
    #[arg(long, value_name = "FILE", requires = "client_cert")]
    pub client_key: Option<PathBuf>,

    /// Basic-auth user sent to every mirror
    #[arg(long, value_name = "USER")]
    pub client_user: Option<String>,

    /// Basic-auth password sent to every mirror
    #[arg(long, value_name = "PASS", requires = "client_user")]
    pub client_pass: Option<String>,

    /// Use alternate config file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Fail when no mirror serves a verifiable index
    #[arg(long)]
    pub require_verified: bool,

    /// Print the winning mirror and every mirror tied with it
    #[arg(long)]
    pub print_mirrors: bool,

    /// Only accept signatures covering the whole index content
    #[arg(long)]
    pub no_legacy: bool,

    /// Print the selection summary as JSON
    #[arg(long)]
    pub json: bool,
}
