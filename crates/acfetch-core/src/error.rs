//! Errors surfaced by the network leg.
//!
//! A missing credential is not an error; see [`crate::credential::CredentialLookup`].

use std::path::PathBuf;

use reqwest::StatusCode;

/// Failure while talking to the repository host or writing the output file.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Invalid GitLab host '{host}': {reason}")]
    InvalidHost { host: String, reason: String },

    #[error("Credential cannot be sent as an HTTP header: {0}")]
    InvalidCredential(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Request to GitLab failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitLab returned HTTP {status} for {url}: {message}")]
    Status {
        status: StatusCode,
        url: String,
        message: String,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("Cannot block on a download from inside an async runtime; await ConditionalFetcher::fetch instead")]
    InsideRuntime,
}

impl FetchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// HTTP status reported by the host, if the failure came from a response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(err) => err.status(),
            _ => None,
        }
    }
}
