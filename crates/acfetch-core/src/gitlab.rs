//! Minimal GitLab REST v4 client: project lookup and raw file download.

use std::path::Path;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Response;
use serde::Deserialize;
use url::Url;

use crate::coordinates::TokenKind;
use crate::credential::Credential;
use crate::error::FetchError;
use crate::output::{DownloadReport, OutputFile};

const USER_AGENT: &str = concat!("acfetch/", env!("CARGO_PKG_VERSION"));

/// Project metadata returned by `GET /projects/:id`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProjectInfo {
    pub id: u64,
    #[serde(default)]
    pub path_with_namespace: String,
    #[serde(default)]
    pub default_branch: Option<String>,
}

/// Authenticated session against one GitLab host.
#[derive(Debug, Clone)]
pub struct GitLabClient {
    base: Url,
    http: reqwest::Client,
}

impl GitLabClient {
    /// Build a client for `host` that sends `credential` on every request.
    ///
    /// No request is made here; the first call that reaches the host is
    /// [`GitLabClient::project`] or [`GitLabClient::download_raw`].
    pub fn connect(
        host: &str,
        credential: &Credential,
        token_kind: TokenKind,
    ) -> Result<Self, FetchError> {
        let base = Self::parse_host(host)?;

        let (name, value) = token_kind.header(credential.expose());
        let mut value = HeaderValue::from_str(&value)?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(name), value);

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self { base, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `{host}/api/v4/projects/{id}`
    pub fn project_url(&self, project_id: u64) -> Url {
        self.api_url(&["projects", &project_id.to_string()])
    }

    /// `{host}/api/v4/projects/{id}/repository/files/{file_path}/raw?ref={reference}`
    ///
    /// The file path is sent as one encoded segment, so `tests/a.py` becomes
    /// `tests%2Fa.py` as the API requires.
    pub fn raw_file_url(&self, project_id: u64, file_path: &str, reference: &str) -> Url {
        let mut url = self.api_url(&[
            "projects",
            &project_id.to_string(),
            "repository",
            "files",
            file_path,
            "raw",
        ]);
        url.query_pairs_mut().append_pair("ref", reference);
        url
    }

    /// Fetch project metadata. Fails if the project does not exist or the
    /// credential is rejected.
    pub async fn project(&self, project_id: u64) -> Result<ProjectInfo, FetchError> {
        let url = self.project_url(project_id);
        tracing::debug!(%url, "Fetching project");

        let response = Self::check(self.http.get(url.clone()).send().await?, &url).await?;
        Ok(response.json().await?)
    }

    /// Stream the raw content of `file_path` at `reference` into `dest`.
    pub async fn download_raw(
        &self,
        project_id: u64,
        file_path: &str,
        reference: &str,
        dest: &Path,
    ) -> Result<DownloadReport, FetchError> {
        let url = self.raw_file_url(project_id, file_path, reference);
        tracing::debug!(%url, dest = %dest.display(), "Downloading raw file");

        let mut response = Self::check(self.http.get(url.clone()).send().await?, &url).await?;

        let mut output = OutputFile::create(dest)?;
        while let Some(chunk) = response.chunk().await? {
            output.write_chunk(&chunk)?;
        }
        output.commit()
    }

    fn parse_host(host: &str) -> Result<Url, FetchError> {
        let invalid = |reason: String| FetchError::InvalidHost {
            host: host.to_string(),
            reason,
        };

        let mut url = Url::parse(host).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }
        if url.cannot_be_a_base() {
            return Err(invalid("not a base URL".to_string()));
        }
        url.set_query(None);
        url.set_fragment(None);
        Ok(url)
    }

    fn api_url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // parse_host rejects cannot-be-a-base URLs
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("api").push("v4").extend(segments);
        }
        url
    }

    async fn check(response: Response, url: &Url) -> Result<Response, FetchError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(FetchError::Status {
            status,
            url: url.to_string(),
            message: error_message(&body),
        })
    }
}

/// Pull GitLab's `message` or `error` field out of an error body.
fn error_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let field = parsed.as_ref().and_then(|json| {
        ["message", "error_description", "error"]
            .iter()
            .find_map(|key| json.get(key))
    });

    match field {
        Some(serde_json::Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None if body.trim().is_empty() => "no response body".to_string(),
        None => body.trim().to_string(),
    }
}
