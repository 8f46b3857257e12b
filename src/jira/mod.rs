pub mod types;

pub use types::{Issue, LinkedPr};

use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::JiraSettings;
use crate::retry::RetryPolicy;
use types::{DevStatusResponse, SearchPage};

#[derive(Debug, Error)]
pub enum JiraError {
    #[error("Jira API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    /// The issue has no pull requests linked yet. Expected, not a failure.
    #[error("No linked pull requests for issue {issue_id}")]
    NotFound { issue_id: u64 },

    #[error("Invalid tracker PR id: {0:?}")]
    InvalidPrId(String),
}

/// Client for Jira's issue search and dev-status endpoints.
pub struct JiraClient {
    http: reqwest::Client,
    settings: JiraSettings,
    retry: RetryPolicy,
}

impl JiraClient {
    pub fn new(settings: JiraSettings, retry: RetryPolicy) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
            retry,
        }
    }

    /// Fetch every bug in `project`, following startAt/total until the result set
    /// is exhausted. Each issue id appears at most once in the result.
    #[instrument(skip(self))]
    pub async fn search_bugs(&self, project: &str) -> Result<Vec<Issue>, JiraError> {
        let url = format!("{}/rest/api/latest/search", self.settings.host);
        let jql = format!("project = {} and type = Bug", project);
        let page_size = self.settings.page_size.to_string();

        let mut issues = Vec::new();
        let mut seen = HashSet::new();
        let mut start_at: u64 = 0;
        loop {
            let start = start_at.to_string();
            let page = self
                .retry
                .send("jira search", || {
                    self.http
                        .get(&url)
                        .basic_auth(&self.settings.email, Some(&self.settings.token))
                        .header("Accept", "application/json")
                        .query(&[
                            ("jql", jql.as_str()),
                            ("fields", "id,key"),
                            ("maxResults", page_size.as_str()),
                            ("startAt", start.as_str()),
                        ])
                })
                .await?
                .error_for_status()?
                .json::<SearchPage>()
                .await?;

            let received = page.issues.len() as u64;
            debug!(start_at, received, total = page.total, "received search page");
            for issue in page.issues {
                // offset paging can repeat an issue when results shift between pages
                if seen.insert(issue.id) {
                    issues.push(issue);
                } else {
                    debug!(issue = issue.id, key = %issue.key, "dropping repeated issue");
                }
            }

            start_at += received;
            if received == 0 || start_at >= page.total {
                break;
            }
        }

        debug!(issues = issues.len(), "collected bugs");
        Ok(issues)
    }

    /// Fetch the GitHub pull requests linked to one issue.
    ///
    /// Returns `JiraError::NotFound` when the issue has no linked PRs.
    #[instrument(skip(self))]
    pub async fn dev_status(&self, issue_id: u64) -> Result<Vec<LinkedPr>, JiraError> {
        let url = format!("{}/rest/dev-status/latest/issue/detail", self.settings.host);
        let id = issue_id.to_string();

        let response = self
            .retry
            .send("jira dev-status", || {
                self.http
                    .get(&url)
                    .basic_auth(&self.settings.email, Some(&self.settings.token))
                    .header("Accept", "application/json")
                    .query(&[
                        ("issueId", id.as_str()),
                        ("applicationType", "GitHub"),
                        ("dataType", "pullrequest"),
                    ])
            })
            .await?
            .error_for_status()?
            .json::<DevStatusResponse>()
            .await?;

        let prs: Vec<LinkedPr> = response
            .detail
            .into_iter()
            .flat_map(|d| d.pull_requests)
            .collect();
        if prs.is_empty() {
            return Err(JiraError::NotFound { issue_id });
        }

        debug!(linked = prs.len(), "received dev status");
        Ok(prs)
    }
}

/// Parse the tracker's PR id ("#123") into the GitHub PR number by dropping the
/// one-character prefix.
pub fn parse_pr_id(raw: &str) -> Result<u64, JiraError> {
    let mut chars = raw.chars();
    chars
        .next()
        .ok_or_else(|| JiraError::InvalidPrId(raw.to_string()))?;
    chars
        .as_str()
        .parse::<u64>()
        .map_err(|_| JiraError::InvalidPrId(raw.to_string()))
}
