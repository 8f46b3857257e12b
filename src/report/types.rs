/// Counters collected by one backfill run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillSummary {
    /// Project key that was searched
    pub project: String,
    /// Bugs returned by the issue search
    pub issues_fetched: usize,
    /// Bugs skipped because their id is already in the mapping collection
    pub already_mapped: usize,
    /// Bugs whose dev status was queried
    pub looked_up: usize,
    /// Lookups that reported no linked PRs
    pub without_dev_status: usize,
    /// Lookups that failed for any other reason
    pub lookup_failures: usize,
    /// Merged PRs whose URL or id could not be parsed
    pub rejected: usize,
    /// Mapping documents written
    pub inserted: usize,
}

impl BackfillSummary {
    pub fn new(project: &str) -> Self {
        Self {
            project: project.to_string(),
            ..Self::default()
        }
    }
}

/// Counters collected by one diff enrichment run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichSummary {
    /// Distinct PRs with no diff record yet
    pub pending: usize,
    /// PRs whose file listing was fetched
    pub fetched: usize,
    /// PRs whose file listing failed and were left for the next run
    pub fetch_failures: usize,
    /// FileDiff entries across all fetched PRs
    pub files_recorded: usize,
    /// Diff documents written
    pub inserted: usize,
}

/// Outcome of whichever stage ran, handed to the report writer.
#[derive(Debug, Clone)]
pub enum RunSummary {
    Backfill(BackfillSummary),
    Enrich(EnrichSummary),
}

impl RunSummary {
    pub fn title(&self) -> &'static str {
        match self {
            RunSummary::Backfill(_) => "Backfill",
            RunSummary::Enrich(_) => "Diff Enrichment",
        }
    }

    /// Label/value rows in display order.
    pub fn rows(&self) -> Vec<(&'static str, usize)> {
        match self {
            RunSummary::Backfill(s) => vec![
                ("Bugs fetched", s.issues_fetched),
                ("Already mapped", s.already_mapped),
                ("Dev status looked up", s.looked_up),
                ("No linked PRs", s.without_dev_status),
                ("Lookup failures", s.lookup_failures),
                ("Rejected (malformed PR data)", s.rejected),
                ("Mappings inserted", s.inserted),
            ],
            RunSummary::Enrich(s) => vec![
                ("PRs pending", s.pending),
                ("PRs fetched", s.fetched),
                ("Fetch failures", s.fetch_failures),
                ("Files recorded", s.files_recorded),
                ("Diff records inserted", s.inserted),
            ],
        }
    }

    pub fn inserted(&self) -> usize {
        match self {
            RunSummary::Backfill(s) => s.inserted,
            RunSummary::Enrich(s) => s.inserted,
        }
    }

    /// Items skipped because of an error (not the expected "no PRs" case).
    pub fn failures(&self) -> usize {
        match self {
            RunSummary::Backfill(s) => s.lookup_failures + s.rejected,
            RunSummary::Enrich(s) => s.fetch_failures,
        }
    }
}
