//! Persistence for issue→PR mappings and per-PR diff stats.
//!
//! `HeatmapStore` abstracts the two collections so the sync stages don't care
//! whether they talk to MongoDB or the in-memory backend used in tests.

#[cfg(test)]
mod memory;
mod mongo;

#[cfg(test)]
pub use memory::InMemoryStore;
pub use mongo::MongoStore;

use std::collections::HashSet;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::github::{FileDiff, RepoRef};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("MongoDB operation failed: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("Failed to decode stored document: {0}")]
    Decode(#[from] mongodb::bson::de::Error),
}

/// One (issue, merged PR) pair. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRecord {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub project: String,
    pub issue_id: u64,
    pub repo: RepoRef,
    pub pr_id: u64,
}

/// Changed-file stats for one PR. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffRecord {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub repo: RepoRef,
    pub pr_id: u64,
    pub diffs: Vec<FileDiff>,
}

/// Minimal projection of a mapping: which PR in which repo.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrRef {
    pub repo: RepoRef,
    pub pr_id: u64,
}

#[async_trait]
pub trait HeatmapStore: Send + Sync {
    /// Every issue id already present in the mapping collection.
    async fn mapped_issue_ids(&self) -> Result<HashSet<u64>, StoreError>;

    /// Unordered batch insert. Returns how many documents were written.
    async fn insert_mappings(&self, records: &[MappingRecord]) -> Result<usize, StoreError>;

    /// Mapped PRs with no diff record sharing their `pr_id`.
    async fn prs_without_diffs(&self) -> Result<Vec<PrRef>, StoreError>;

    /// Unordered batch insert. Returns how many documents were written.
    async fn insert_diffs(&self, records: &[DiffRecord]) -> Result<usize, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson;

    #[test]
    fn test_mapping_record_document_shape() {
        let record = MappingRecord {
            id: None,
            project: "DEMO".to_string(),
            issue_id: 1001,
            repo: RepoRef::new("acme", "widgets"),
            pr_id: 55,
        };
        let doc = bson::to_document(&record).unwrap();
        assert!(!doc.contains_key("_id"));
        assert_eq!(doc.get_str("project").unwrap(), "DEMO");
        assert_eq!(doc.get_i64("issue_id").unwrap(), 1001);
        assert_eq!(doc.get_i64("pr_id").unwrap(), 55);
        let repo = doc.get_document("repo").unwrap();
        assert_eq!(repo.get_str("owner").unwrap(), "acme");
        assert_eq!(repo.get_str("name").unwrap(), "widgets");
    }

    #[test]
    fn test_pr_ref_decodes_from_projection() {
        let doc = bson::doc! {
            "repo": { "owner": "acme", "name": "widgets" },
            "pr_id": 43_i32,
        };
        let pr: PrRef = bson::from_document(doc).unwrap();
        assert_eq!(
            pr,
            PrRef {
                repo: RepoRef::new("acme", "widgets"),
                pr_id: 43
            }
        );
    }

    #[test]
    fn test_diff_record_document_shape() {
        let record = DiffRecord {
            id: None,
            repo: RepoRef::new("acme", "widgets"),
            pr_id: 55,
            diffs: vec![FileDiff {
                file: "a.go".to_string(),
                status: "modified".to_string(),
                additions: 3,
                deletions: 1,
                changes: 4,
            }],
        };
        let doc = bson::to_document(&record).unwrap();
        let diffs = doc.get_array("diffs").unwrap();
        assert_eq!(diffs.len(), 1);
        let first = diffs[0].as_document().unwrap();
        assert_eq!(first.get_str("file").unwrap(), "a.go");
        assert_eq!(first.get_i64("changes").unwrap(), 4);
    }
}
