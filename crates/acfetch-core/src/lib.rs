//! Acfetch Core Library
//!
//! Fetches a single file from a GitLab repository when an access token is
//! present in the process environment, and does nothing at all when it is not.

pub mod coordinates;
pub mod credential;
pub mod error;
pub mod fetcher;
pub mod gitlab;
pub mod output;

pub use fetcher::download_if_credential_present;

/// Re-exports of commonly used types
pub mod prelude {
    // Coordinates
    pub use crate::coordinates::{
        DEFAULT_BRANCH, DEFAULT_HOST, DEFAULT_OUTPUT_NAME, DEFAULT_TOKEN_VAR, DownloadCoordinates,
        TokenKind,
    };

    // Credential
    pub use crate::credential::{
        Credential, CredentialLookup, CredentialResolver, EnvSource, ProcessEnv,
    };

    // Fetching
    pub use crate::error::FetchError;
    pub use crate::fetcher::{ConditionalFetcher, FetchOutcome, download_if_credential_present};
    pub use crate::gitlab::{GitLabClient, ProjectInfo};
    pub use crate::output::DownloadReport;
}
