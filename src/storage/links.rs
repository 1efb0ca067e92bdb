//! The `redirects_links` collection
//!
//! Holds the currently and previously active best links per domain. Only
//! the refresher writes here: each run flips every active record to
//! inactive, then upserts an active record per winning (domain, url).
//! Dispatch never reads this collection; the shared cache is the source
//! of truth for the hot path.

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::TryStreamExt;
use mongodb::bson::doc;
use mongodb::{Collection, Database};
use tracing::debug;

use crate::errors::Result;
use crate::storage::models::LinkRecord;
use crate::storage::LINKS_COLLECTION;

#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Flip every active record to inactive. Returns the modified count.
    async fn deactivate_all(&self) -> Result<u64>;

    /// Upsert the active record for (domain, url).
    async fn upsert_active(&self, domain: &str, url: &str) -> Result<()>;

    /// List records, optionally filtered by status.
    async fn list(&self, active: Option<bool>) -> Result<Vec<LinkRecord>>;
}

pub struct MongoLinkStore {
    collection: Collection<LinkRecord>,
}

impl MongoLinkStore {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(LINKS_COLLECTION),
        }
    }
}

#[async_trait]
impl LinkStore for MongoLinkStore {
    async fn deactivate_all(&self) -> Result<u64> {
        let result = self
            .collection
            .update_many(
                doc! {"status": true},
                doc! {"$set": {"status": false, "updated_at": Utc::now()}},
            )
            .await?;
        debug!("Deactivated {} link records", result.modified_count);
        Ok(result.modified_count)
    }

    async fn upsert_active(&self, domain: &str, url: &str) -> Result<()> {
        let now = Utc::now();
        self.collection
            .update_one(
                doc! {"domain": domain, "url": url},
                doc! {
                    "$set": {"status": true, "updated_at": now},
                    "$setOnInsert": {"created_at": now},
                },
            )
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn list(&self, active: Option<bool>) -> Result<Vec<LinkRecord>> {
        let filter = match active {
            Some(status) => doc! {"status": status},
            None => doc! {},
        };
        let cursor = self.collection.find(filter).await?;
        let records = cursor.try_collect().await?;
        Ok(records)
    }
}
