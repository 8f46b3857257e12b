use serde::{Deserialize, Serialize};

/// A GitHub repository, as stored in both collections.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Represents the parsed components of a GitHub PR URL.
/// Extracted by parse_pr_url() in github/mod.rs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrUrl {
    pub repo: RepoRef,
    pub pr_number: u64,
}

/// Per-file change stats for one PR, in the order GitHub lists them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiff {
    /// File path (e.g., "src/auth/config.rs")
    pub file: String,
    /// added, modified, removed, renamed, copied, changed or unchanged
    pub status: String,
    pub additions: u64,
    pub deletions: u64,
    pub changes: u64,
}

/// One entry of `GET /repos/{owner}/{repo}/pulls/{number}/files`.
#[derive(Debug, Deserialize)]
pub struct PullFile {
    pub filename: String,
    pub status: String,
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    #[serde(default)]
    pub changes: u64,
}

impl From<PullFile> for FileDiff {
    fn from(f: PullFile) -> Self {
        FileDiff {
            file: f.filename,
            status: f.status,
            additions: f.additions,
            deletions: f.deletions,
            changes: f.changes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_ref_display() {
        assert_eq!(RepoRef::new("acme", "widgets").to_string(), "acme/widgets");
    }

    #[test]
    fn test_pull_file_into_file_diff() {
        let raw = r#"{
            "sha": "bbcd538c8e72b8c175046e27cc8f907076331401",
            "filename": "a.go",
            "status": "modified",
            "additions": 3,
            "deletions": 1,
            "changes": 4,
            "patch": "@@ -1,1 +1,3 @@"
        }"#;
        let file: PullFile = serde_json::from_str(raw).unwrap();
        let diff = FileDiff::from(file);
        assert_eq!(
            diff,
            FileDiff {
                file: "a.go".to_string(),
                status: "modified".to_string(),
                additions: 3,
                deletions: 1,
                changes: 4,
            }
        );
    }
}
