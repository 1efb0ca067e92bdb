//! The `redirects_clicks` collection
//!
//! One document per link_id ever dispatched, with a monotonically
//! increasing count. The upsert is a single atomic `$inc`/`$setOnInsert`
//! keyed on link_id; the unique index guarantees concurrent first-time
//! writes for the same id collapse into one document.

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::ReturnDocument;
use mongodb::{Collection, Database, IndexModel};
use tracing::debug;

use crate::errors::{RedronError, Result};
use crate::storage::models::ClickCounter;
use crate::storage::CLICKS_COLLECTION;

/// 点击总量（/api/stats 的 clicks 块）
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ClickTotals {
    pub total: i64,
    pub links: u64,
    pub top: Vec<ClickCounter>,
}

#[async_trait]
pub trait ClickStore: Send + Sync {
    /// Atomically upsert-increment the counter for `link_id` and return
    /// the post-increment document.
    async fn increment_click(&self, link_id: &str) -> Result<ClickCounter>;

    /// Aggregate totals for the stats endpoint.
    async fn totals(&self, top_n: i64) -> Result<ClickTotals>;
}

pub struct MongoClickStore {
    collection: Collection<ClickCounter>,
}

impl MongoClickStore {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(CLICKS_COLLECTION),
        }
    }

    /// Ensure the unique index on link_id. Called once at startup.
    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! {"link_id": 1})
            .options(
                mongodb::options::IndexOptions::builder()
                    .unique(true)
                    .build(),
            )
            .build();
        self.collection.create_index(index).await?;
        debug!("Unique index on link_id ensured");
        Ok(())
    }
}

#[async_trait]
impl ClickStore for MongoClickStore {
    async fn increment_click(&self, link_id: &str) -> Result<ClickCounter> {
        let updated = self
            .collection
            .find_one_and_update(
                doc! {"link_id": link_id},
                doc! {
                    "$inc": {"count": 1_i64},
                    "$setOnInsert": {"created_at": Utc::now()},
                },
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?;

        updated.ok_or_else(|| {
            RedronError::database_operation(format!(
                "upsert for link_id '{link_id}' returned no document"
            ))
        })
    }

    async fn totals(&self, top_n: i64) -> Result<ClickTotals> {
        let links = self.collection.count_documents(doc! {}).await?;

        let mut cursor = self
            .collection
            .aggregate(vec![doc! {"$group": {
                "_id": mongodb::bson::Bson::Null,
                "total": {"$sum": "$count"},
            }}])
            .await?;
        let total = match cursor.try_next().await? {
            Some(doc) => crate::storage::models::numeric_field(&doc, "total").unwrap_or(0.0) as i64,
            None => 0,
        };

        let top = self
            .collection
            .find(doc! {})
            .sort(doc! {"count": -1})
            .limit(top_n)
            .await?
            .try_collect()
            .await?;

        Ok(ClickTotals { total, links, top })
    }
}
