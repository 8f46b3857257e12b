//! The two batch stages: issue→PR backfill and PR→diff enrichment.
//!
//! Both stages decide what is new by reading the store first, fetch only that,
//! and finish with a single batch write. Per-item failures are logged, counted
//! in the run summary and skipped. Store access, the issue search and a
//! rejected GitHub token are fatal for a run.

pub mod backfill;
pub mod enrich;

pub use backfill::run_backfill;
pub use enrich::run_enrichment;

use thiserror::Error;

use crate::github::GitHubError;
use crate::jira::JiraError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Jira(#[from] JiraError),

    #[error(transparent)]
    GitHub(#[from] GitHubError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Upstream data that doesn't have the shape a mapping needs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataQualityError {
    #[error("PR URL is not of the form https://github.com/{{owner}}/{{repo}}/pull/{{number}}: {url:?}")]
    PrUrl { url: String },

    #[error("PR id has no numeric suffix: {id:?}")]
    PrId { id: String },
}
