//! CLI error handling

use std::fmt;

use apkidx_errors::UserFacingError;

/// Exit status for fatal errors
pub const EXIT_FAILURE: i32 = 1;

/// Exit status when `--require-verified` is set and nothing verified
pub const EXIT_NO_VERIFIED: i32 = 2;

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    /// Error raised while selecting or writing the index
    Run(apkidx_errors::Error),
    /// Could not render output
    Output(String),
}

impl CliError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Run(apkidx_errors::Error::NoVerifiedMirror) => EXIT_NO_VERIFIED,
            _ => EXIT_FAILURE,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Run(e) => {
                let message = e.user_message();
                write!(f, "{message}")?;
                if let Some(code) = e.user_code() {
                    write!(f, "\n  Code: {code}")?;
                }
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                if e.is_retryable() {
                    write!(f, "\n  Retry: safe to retry this operation.")?;
                }
                Ok(())
            }
            CliError::Output(msg) => write!(f, "Output error: {msg}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Run(e) => Some(e),
            CliError::Output(_) => None,
        }
    }
}

impl From<apkidx_errors::Error> for CliError {
    fn from(e: apkidx_errors::Error) -> Self {
        CliError::Run(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Output(e.to_string())
    }
}
