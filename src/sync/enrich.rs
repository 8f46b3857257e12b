use std::collections::HashSet;

use tracing::{debug, error, info, instrument, warn};

use super::SyncError;
use crate::github::GitHubClient;
use crate::report::EnrichSummary;
use crate::store::{DiffRecord, HeatmapStore, PrRef};

/// Fetch changed-file stats for every mapped PR that has no diff record yet.
///
/// A PR whose listing fails is skipped and, having no diff record, is retried
/// on the next run. A 401/403 ends the stage with nothing written.
#[instrument(skip(github, store))]
pub async fn run_enrichment(
    github: &GitHubClient,
    store: &dyn HeatmapStore,
) -> Result<EnrichSummary, SyncError> {
    let mut summary = EnrichSummary::default();

    let pending = distinct(store.prs_without_diffs().await?);
    summary.pending = pending.len();
    info!(pending = pending.len(), "found PRs without diffs");
    if pending.is_empty() {
        return Ok(summary);
    }

    let mut records = Vec::with_capacity(pending.len());
    for pr in pending {
        match github.list_pr_files(&pr.repo, pr.pr_id).await {
            Ok(diffs) => {
                debug!(repo = %pr.repo, pr = pr.pr_id, files = diffs.len(), "collected PR diff");
                summary.files_recorded += diffs.len();
                records.push(DiffRecord {
                    id: None,
                    repo: pr.repo,
                    pr_id: pr.pr_id,
                    diffs,
                });
            }
            Err(err) if err.is_auth_failure() => {
                error!(repo = %pr.repo, pr = pr.pr_id, error = %err, "GitHub rejected the token, aborting");
                return Err(err.into());
            }
            Err(err) => {
                warn!(repo = %pr.repo, pr = pr.pr_id, error = %err, "failed to list PR files, leaving for next run");
                summary.fetch_failures += 1;
            }
        }
    }
    summary.fetched = records.len();

    if records.is_empty() {
        info!("no PR diffs collected");
        return Ok(summary);
    }

    summary.inserted = store.insert_diffs(&records).await?;
    info!(inserted = summary.inserted, "inserted diff records");
    Ok(summary)
}

/// Drop repeated (repo, PR) pairs, which appear when one PR fixes several issues.
fn distinct(prs: Vec<PrRef>) -> Vec<PrRef> {
    let mut seen = HashSet::new();
    prs.into_iter().filter(|pr| seen.insert(pr.clone())).collect()
}
