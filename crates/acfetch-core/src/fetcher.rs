//! Conditional download: fetch only when a credential is available.

use std::path::PathBuf;

use crate::coordinates::DownloadCoordinates;
use crate::credential::{Credential, CredentialResolver, EnvSource, ProcessEnv};
use crate::error::FetchError;
use crate::gitlab::GitLabClient;
use crate::output::DownloadReport;

/// Result of [`ConditionalFetcher::try_download`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// No credential; nothing was contacted or written
    Skipped,
    Downloaded(DownloadReport),
}

impl FetchOutcome {
    pub fn performed(&self) -> bool {
        matches!(self, Self::Downloaded(_))
    }
}

/// Downloads a file when, and only when, the configured token variable is set.
///
/// The HTTP client and async runtime are only built after a credential has
/// been found.
#[derive(Debug, Clone, Default)]
pub struct ConditionalFetcher<E = ProcessEnv> {
    resolver: CredentialResolver<E>,
    work_dir: Option<PathBuf>,
}

impl ConditionalFetcher<ProcessEnv> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: EnvSource> ConditionalFetcher<E> {
    /// Create a fetcher reading credentials from a custom source (for testing).
    pub fn with_env(env: E) -> Self {
        Self {
            resolver: CredentialResolver::with_env(env),
            work_dir: None,
        }
    }

    /// Resolve relative output names against `dir` instead of the current directory.
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    /// Download the file if a credential is present.
    ///
    /// Returns `Ok(false)` without any network or filesystem activity when the
    /// token variable is unset or unreadable. Once a credential is found every
    /// failure is returned as an error.
    ///
    /// Blocks the calling thread. Inside an async runtime this returns
    /// [`FetchError::InsideRuntime`] once a credential is found; use
    /// [`ConditionalFetcher::fetch`] there.
    pub fn download_if_credential_present(
        &self,
        coords: &DownloadCoordinates,
    ) -> Result<bool, FetchError> {
        Ok(self.try_download(coords)?.performed())
    }

    /// Like [`ConditionalFetcher::download_if_credential_present`], returning
    /// the download report.
    pub fn try_download(&self, coords: &DownloadCoordinates) -> Result<FetchOutcome, FetchError> {
        let Some(credential) = self.resolver.resolve(coords.token_var()).into_credential() else {
            tracing::debug!(
                variable = coords.token_var(),
                "No credential found, skipping download"
            );
            return Ok(FetchOutcome::Skipped);
        };

        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(FetchError::InsideRuntime);
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(FetchError::Runtime)?;

        let report = runtime.block_on(self.fetch(coords, &credential))?;
        Ok(FetchOutcome::Downloaded(report))
    }

    /// The network leg: verify the project, then stream the file to disk.
    pub async fn fetch(
        &self,
        coords: &DownloadCoordinates,
        credential: &Credential,
    ) -> Result<DownloadReport, FetchError> {
        let dest = self.output_path(coords)?;
        let client = GitLabClient::connect(coords.host(), credential, coords.token_kind())?;

        let project = client.project(coords.project_id()).await?;
        tracing::debug!(
            project = %project.path_with_namespace,
            id = project.id,
            "Resolved project"
        );

        let report = client
            .download_raw(project.id, coords.file_path(), coords.branch(), &dest)
            .await?;

        tracing::info!(
            path = %report.path.display(),
            bytes = report.bytes_written,
            "Downloaded {}",
            coords.file_path()
        );
        Ok(report)
    }

    /// Where `coords.output_name()` will be written.
    pub fn output_path(&self, coords: &DownloadCoordinates) -> Result<PathBuf, FetchError> {
        let base = match &self.work_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().map_err(|e| FetchError::io(coords.output_name(), e))?,
        };
        Ok(base.join(coords.output_name()))
    }
}

/// Download from the process environment's credential, if present.
///
/// # Example
/// ```no_run
/// use acfetch_core::coordinates::DownloadCoordinates;
///
/// let coords = DownloadCoordinates::new(35523853, "hidden_tests.py")
///     .with_output_name("ac_tests_supplemental.py");
/// let performed = acfetch_core::download_if_credential_present(&coords)?;
/// # Ok::<(), acfetch_core::error::FetchError>(())
/// ```
pub fn download_if_credential_present(coords: &DownloadCoordinates) -> Result<bool, FetchError> {
    ConditionalFetcher::new().download_if_credential_present(coords)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::VarError;
    use tempfile::TempDir;

    struct EmptyEnv;

    impl EnvSource for EmptyEnv {
        fn var(&self, _name: &str) -> Result<String, VarError> {
            Err(VarError::NotPresent)
        }
    }

    struct OnlyVar(&'static str, &'static str);

    impl EnvSource for OnlyVar {
        fn var(&self, name: &str) -> Result<String, VarError> {
            if name == self.0 {
                Ok(self.1.to_string())
            } else {
                Err(VarError::NotPresent)
            }
        }
    }

    #[test]
    fn test_absent_credential_skips_everything() {
        let temp = TempDir::new().unwrap();
        let fetcher = ConditionalFetcher::with_env(EmptyEnv).with_work_dir(temp.path());

        // An unusable host proves no client is ever built.
        let coords = DownloadCoordinates::new(1, "tests.py").with_host("not a url");

        assert!(!fetcher.download_if_credential_present(&coords).unwrap());
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_credential_under_other_name_is_ignored() {
        let temp = TempDir::new().unwrap();
        let fetcher = ConditionalFetcher::with_env(OnlyVar("SOME_OTHER_TOKEN", "abc"))
            .with_work_dir(temp.path());
        let coords = DownloadCoordinates::new(1, "tests.py").with_host("not a url");

        assert_eq!(fetcher.try_download(&coords).unwrap(), FetchOutcome::Skipped);
    }

    #[test]
    fn test_present_credential_attempts_network_leg() {
        let temp = TempDir::new().unwrap();
        let fetcher = ConditionalFetcher::with_env(OnlyVar("AC_GITLAB_ACCESS_TOKEN", "abc"))
            .with_work_dir(temp.path());
        let coords = DownloadCoordinates::new(1, "tests.py").with_host("not a url");

        let err = fetcher.download_if_credential_present(&coords).unwrap_err();
        assert!(matches!(err, FetchError::InvalidHost { .. }));
    }

    #[tokio::test]
    async fn test_blocking_call_inside_runtime_is_an_error() {
        let temp = TempDir::new().unwrap();
        let fetcher = ConditionalFetcher::with_env(OnlyVar("AC_GITLAB_ACCESS_TOKEN", "abc"))
            .with_work_dir(temp.path());
        let coords = DownloadCoordinates::new(1, "tests.py");

        let err = fetcher.download_if_credential_present(&coords).unwrap_err();
        assert!(matches!(err, FetchError::InsideRuntime));
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_skip_inside_runtime_still_succeeds() {
        let fetcher = ConditionalFetcher::with_env(EmptyEnv);
        let coords = DownloadCoordinates::new(1, "tests.py");

        assert!(!fetcher.download_if_credential_present(&coords).unwrap());
    }

    #[test]
    fn test_output_path_joins_work_dir() {
        let fetcher = ConditionalFetcher::with_env(EmptyEnv).with_work_dir("/srv/course");
        let coords = DownloadCoordinates::new(1, "tests.py").with_output_name("ac_tests.py");

        assert_eq!(
            fetcher.output_path(&coords).unwrap(),
            PathBuf::from("/srv/course/ac_tests.py")
        );
    }

    #[test]
    fn test_output_path_defaults_to_current_dir() {
        let fetcher = ConditionalFetcher::new();
        let coords = DownloadCoordinates::new(1, "tests.py");

        let expected = std::env::current_dir().unwrap().join("gitlab_download.txt");
        assert_eq!(fetcher.output_path(&coords).unwrap(), expected);
    }
}
