use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{self, doc, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use super::{DiffRecord, HeatmapStore, MappingRecord, PrRef, StoreError};
use crate::config::MongoSettings;

#[derive(Debug, Deserialize)]
struct IssueIdOnly {
    issue_id: u64,
}

/// MongoDB-backed store: one collection of mappings, one of diff records.
pub struct MongoStore {
    mappings: Collection<MappingRecord>,
    diffs: Collection<DiffRecord>,
    diff_collection: String,
}

impl MongoStore {
    /// Connect and ping, so a bad URI or unreachable cluster fails here rather
    /// than halfway through a stage.
    #[instrument(skip(settings), fields(db = %settings.dbname))]
    pub async fn connect(settings: &MongoSettings) -> Result<Self, StoreError> {
        let timeout = Duration::from_secs(settings.connect_timeout_secs);
        let mut options = ClientOptions::parse(&settings.uri).await?;
        options.connect_timeout = Some(timeout);
        options.server_selection_timeout = Some(timeout);
        options.app_name = Some("bug-heatmap".to_string());

        let client = Client::with_options(options)?;
        let db = client.database(&settings.dbname);
        db.run_command(doc! { "ping": 1 }).await?;
        info!("connected to MongoDB");

        Ok(Self {
            mappings: db.collection(&settings.mapping_collection),
            diffs: db.collection(&settings.diff_collection),
            diff_collection: settings.diff_collection.clone(),
        })
    }
}

#[async_trait]
impl HeatmapStore for MongoStore {
    #[instrument(skip(self))]
    async fn mapped_issue_ids(&self) -> Result<HashSet<u64>, StoreError> {
        let ids: Vec<IssueIdOnly> = self
            .mappings
            .clone_with_type::<IssueIdOnly>()
            .find(doc! {})
            .projection(doc! { "_id": 0, "issue_id": 1 })
            .await?
            .try_collect()
            .await?;

        debug!(mappings = ids.len(), "scanned mapped issue ids");
        Ok(ids.into_iter().map(|r| r.issue_id).collect())
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn insert_mappings(&self, records: &[MappingRecord]) -> Result<usize, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }
        let result = self.mappings.insert_many(records).ordered(false).await?;
        Ok(result.inserted_ids.len())
    }

    #[instrument(skip(self))]
    async fn prs_without_diffs(&self) -> Result<Vec<PrRef>, StoreError> {
        let pipeline = vec![
            doc! { "$lookup": {
                "from": self.diff_collection.as_str(),
                "localField": "pr_id",
                "foreignField": "pr_id",
                "as": "diff",
            } },
            doc! { "$match": { "diff": { "$size": 0 } } },
            doc! { "$project": { "_id": 0, "repo": 1, "pr_id": 1 } },
        ];

        let docs: Vec<Document> = self
            .mappings
            .aggregate(pipeline)
            .await?
            .try_collect()
            .await?;

        let prs = docs
            .into_iter()
            .map(bson::from_document::<PrRef>)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(pending = prs.len(), "anti-joined mappings against diffs");
        Ok(prs)
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn insert_diffs(&self, records: &[DiffRecord]) -> Result<usize, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }
        let result = self.diffs.insert_many(records).ordered(false).await?;
        Ok(result.inserted_ids.len())
    }
}
