use tracing::{debug, info, instrument, warn};

use super::{DataQualityError, SyncError};
use crate::github;
use crate::jira::{self, JiraClient, JiraError, LinkedPr};
use crate::report::BackfillSummary;
use crate::store::{HeatmapStore, MappingRecord};

/// Map every not-yet-seen bug in `project` to its merged PRs.
///
/// De-duplication is by issue id: an issue that already has any mapping is
/// never looked up again, so a PR merged for it later is not picked up.
#[instrument(skip(jira, store))]
pub async fn run_backfill(
    jira: &JiraClient,
    store: &dyn HeatmapStore,
    project: &str,
) -> Result<BackfillSummary, SyncError> {
    let mut summary = BackfillSummary::new(project);

    let already_mapped = store.mapped_issue_ids().await?;
    debug!(already_mapped = already_mapped.len(), "loaded mapped issue ids");

    let issues = jira.search_bugs(project).await?;
    summary.issues_fetched = issues.len();
    info!(bugs = issues.len(), "fetched bugs");

    let mut new_mappings = Vec::new();
    for issue in &issues {
        if already_mapped.contains(&issue.id) {
            summary.already_mapped += 1;
            continue;
        }

        summary.looked_up += 1;
        let linked = match jira.dev_status(issue.id).await {
            Ok(linked) => linked,
            Err(JiraError::NotFound { .. }) => {
                debug!(issue = issue.id, key = %issue.key, "no linked PRs yet");
                summary.without_dev_status += 1;
                continue;
            }
            Err(err) => {
                warn!(issue = issue.id, key = %issue.key, error = %err, "dev status lookup failed, skipping issue");
                summary.lookup_failures += 1;
                continue;
            }
        };

        for pr in &linked {
            if !pr.is_merged() {
                debug!(issue = issue.id, pr_id = %pr.id, status = %pr.status, "skipping unmerged PR");
                continue;
            }
            match build_mapping(project, issue.id, pr) {
                Ok(record) => new_mappings.push(record),
                Err(err) => {
                    warn!(issue = issue.id, key = %issue.key, pr_id = %pr.id, error = %err, "rejecting malformed PR link");
                    summary.rejected += 1;
                }
            }
        }
    }

    if new_mappings.is_empty() {
        info!("no new mappings found");
        return Ok(summary);
    }

    summary.inserted = store.insert_mappings(&new_mappings).await?;
    info!(inserted = summary.inserted, "inserted mappings");
    Ok(summary)
}

/// Turn one merged PR reported by dev status into a mapping document.
///
/// The repo comes from the PR's web URL, the PR number from the tracker id.
pub fn build_mapping(
    project: &str,
    issue_id: u64,
    pr: &LinkedPr,
) -> Result<MappingRecord, DataQualityError> {
    let pr_url = github::parse_pr_url(&pr.url).map_err(|_| DataQualityError::PrUrl {
        url: pr.url.clone(),
    })?;
    let pr_id = jira::parse_pr_id(&pr.id).map_err(|_| DataQualityError::PrId { id: pr.id.clone() })?;

    if pr_url.pr_number != pr_id {
        warn!(issue = issue_id, pr_id, url = %pr.url, "tracker PR id disagrees with PR URL, keeping tracker id");
    }

    Ok(MappingRecord {
        id: None,
        project: project.to_string(),
        issue_id,
        repo: pr_url.repo,
        pr_id,
    })
}
