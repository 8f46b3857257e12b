//! In-memory implementation of `HeatmapStore`.
//!
//! Mirrors the MongoDB backend's query semantics, including the anti-join
//! on `pr_id` alone. Counts write calls so tests can assert none happened.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{DiffRecord, HeatmapStore, MappingRecord, PrRef, StoreError};

#[derive(Default)]
pub struct InMemoryStore {
    mappings: RwLock<Vec<MappingRecord>>,
    diffs: RwLock<Vec<DiffRecord>>,
    write_calls: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with existing documents, as if written by an earlier run.
    pub fn with_records(mappings: Vec<MappingRecord>, diffs: Vec<DiffRecord>) -> Self {
        Self {
            mappings: RwLock::new(mappings),
            diffs: RwLock::new(diffs),
            write_calls: AtomicUsize::new(0),
        }
    }

    pub async fn mappings(&self) -> Vec<MappingRecord> {
        self.mappings.read().await.clone()
    }

    pub async fn diffs(&self) -> Vec<DiffRecord> {
        self.diffs.read().await.clone()
    }

    /// Number of batch insert calls received.
    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HeatmapStore for InMemoryStore {
    async fn mapped_issue_ids(&self) -> Result<HashSet<u64>, StoreError> {
        let mappings = self.mappings.read().await;
        Ok(mappings.iter().map(|m| m.issue_id).collect())
    }

    async fn insert_mappings(&self, records: &[MappingRecord]) -> Result<usize, StoreError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.mappings.write().await.extend_from_slice(records);
        Ok(records.len())
    }

    async fn prs_without_diffs(&self) -> Result<Vec<PrRef>, StoreError> {
        let mappings = self.mappings.read().await;
        let diffs = self.diffs.read().await;
        let collected: HashSet<u64> = diffs.iter().map(|d| d.pr_id).collect();
        Ok(mappings
            .iter()
            .filter(|m| !collected.contains(&m.pr_id))
            .map(|m| PrRef {
                repo: m.repo.clone(),
                pr_id: m.pr_id,
            })
            .collect())
    }

    async fn insert_diffs(&self, records: &[DiffRecord]) -> Result<usize, StoreError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.diffs.write().await.extend_from_slice(records);
        Ok(records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::RepoRef;

    fn mapping(issue_id: u64, pr_id: u64) -> MappingRecord {
        MappingRecord {
            id: None,
            project: "DEMO".to_string(),
            issue_id,
            repo: RepoRef::new("acme", "widgets"),
            pr_id,
        }
    }

    #[tokio::test]
    async fn test_mapped_issue_ids() {
        let store = InMemoryStore::with_records(vec![mapping(1, 10), mapping(1, 11), mapping(2, 12)], vec![]);
        let ids = store.mapped_issue_ids().await.unwrap();
        assert_eq!(ids, HashSet::from([1, 2]));
    }

    #[tokio::test]
    async fn test_anti_join_skips_collected_prs() {
        let existing = DiffRecord {
            id: None,
            repo: RepoRef::new("acme", "widgets"),
            pr_id: 42,
            diffs: vec![],
        };
        let store = InMemoryStore::with_records(vec![mapping(1, 42), mapping(2, 43)], vec![existing]);

        let pending = store.prs_without_diffs().await.unwrap();
        assert_eq!(
            pending,
            vec![PrRef {
                repo: RepoRef::new("acme", "widgets"),
                pr_id: 43
            }]
        );
    }

    #[tokio::test]
    async fn test_inserts_are_counted() {
        let store = InMemoryStore::new();
        assert_eq!(store.insert_mappings(&[mapping(5, 50)]).await.unwrap(), 1);
        assert_eq!(store.write_calls(), 1);
        assert_eq!(store.mappings().await.len(), 1);
    }
}
