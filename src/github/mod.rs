pub mod types;

pub use types::{FileDiff, PrUrl, RepoRef};

use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::retry::RetryPolicy;
use types::PullFile;

/// GitHub caps `per_page` for the PR files listing at 100.
const FILES_PER_PAGE: usize = 100;

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("Invalid PR URL: {0}")]
    InvalidUrl(String),
}

impl GitHubError {
    /// True when GitHub rejected the token itself (401/403), so every other
    /// request in the run will fail the same way.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            GitHubError::ApiRequest(err) => matches!(
                err.status(),
                Some(StatusCode::UNAUTHORIZED) | Some(StatusCode::FORBIDDEN)
            ),
            GitHubError::InvalidUrl(_) => false,
        }
    }
}

/// Parse a GitHub PR URL into its component parts.
///
/// Expected format: https://github.com/{owner}/{repo}/pull/{number}
/// Return GitHubError::InvalidUrl for malformed URLs.
pub fn parse_pr_url(url: &str) -> Result<PrUrl, GitHubError> {
    let invalid = || GitHubError::InvalidUrl(url.to_string());
    let parsed = reqwest::Url::parse(url).map_err(|_| invalid())?;

    if !matches!(parsed.host_str(), Some("github.com") | Some("www.github.com")) {
        return Err(invalid());
    }

    let segments: Vec<_> = parsed
        .path_segments()
        .ok_or_else(invalid)?
        .filter(|segment| !segment.is_empty())
        .collect();

    if segments.len() != 4 || segments[2] != "pull" {
        return Err(invalid());
    }

    let pr_number = segments[3].parse::<u64>().map_err(|_| invalid())?;

    Ok(PrUrl {
        repo: RepoRef::new(segments[0], segments[1]),
        pr_number,
    })
}

/// Client for the GitHub REST API, token authenticated.
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
    retry: RetryPolicy,
}

impl GitHubClient {
    pub fn new(api_url: &str, token: String, retry: RetryPolicy) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
            retry,
        }
    }

    /// List every file changed by a PR, 100 per page, in GitHub's order.
    #[instrument(skip(self, repo), fields(repo = %repo))]
    pub async fn list_pr_files(
        &self,
        repo: &RepoRef,
        pr_number: u64,
    ) -> Result<Vec<FileDiff>, GitHubError> {
        let url = format!(
            "{}/repos/{}/{}/pulls/{}/files",
            self.api_url, repo.owner, repo.name, pr_number
        );
        let per_page = FILES_PER_PAGE.to_string();

        let mut files = Vec::new();
        let mut page: u32 = 1;
        loop {
            let page_str = page.to_string();
            debug!(page, "fetching PR files page");
            let batch = self
                .retry
                .send("github pr files", || {
                    self.http
                        .get(&url)
                        .header("User-Agent", "bug-heatmap")
                        .header("Accept", "application/vnd.github+json")
                        .bearer_auth(&self.token)
                        .query(&[("per_page", per_page.as_str()), ("page", page_str.as_str())])
                })
                .await?
                .error_for_status()?
                .json::<Vec<PullFile>>()
                .await?;

            let received = batch.len();
            files.extend(batch.into_iter().map(FileDiff::from));
            if received < FILES_PER_PAGE {
                break;
            }
            page += 1;
        }

        debug!(files = files.len(), "received PR files");
        Ok(files)
    }
}
