//! Defaults shared by the config file, the environment and the CLI

pub const DEFAULT_REPO_PATH: &str = "latest-stable/main/x86_64";
pub const DEFAULT_MIRROR_LIST: &str = "MIRRORS.txt";
pub const DEFAULT_OUTPUT_DIR: &str = ".";
pub const DEFAULT_KEYS_DIR: &str = "keys/";
pub const DEFAULT_KEYS_URL: &str = "https://alpinelinux.org/keys/";

/// Per-request transport timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Delay between successive mirror requests, multiplied by list position
pub const DEFAULT_STAGGER_MS: u64 = 70;
