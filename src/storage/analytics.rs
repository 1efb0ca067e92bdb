//! Read-only access to the analytics collection
//!
//! The refresher is the only hot consumer: it asks for today's rows
//! grouped by (domain, custom_key, custom_value) with summed metrics and
//! a computed eCPM. The reporting endpoints reuse the same repository for
//! distinct values and the daily totals block of `/api/stats`.

use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::{Collection, Database};
use tracing::debug;

use crate::errors::{RedronError, Result};
use crate::storage::models::{numeric_field, AnalyticsRow};
use crate::storage::ANALYTICS_COLLECTION;

/// 允许 distinct 查询的字段白名单
pub const DISTINCT_FIELDS: &[&str] = &["date", "domain", "custom_key", "custom_value"];

/// 今日总量（/api/stats 的 gam 块）
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct GamTotals {
    pub date: String,
    pub impressions: f64,
    pub clicks: f64,
    pub revenue: f64,
    pub ecpm: f64,
}

#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    /// Rows for `date` restricted to `domains`, grouped by
    /// (domain, custom_key, custom_value) under `custom_key`, with a
    /// computed eCPM per group.
    async fn best_post_rows(
        &self,
        date: &str,
        domains: &[String],
        custom_key: &str,
    ) -> Result<Vec<AnalyticsRow>>;

    /// Distinct values of a whitelisted field.
    async fn distinct(&self, field: &str) -> Result<Vec<String>>;

    /// Summed metrics for `date` across all domains.
    async fn daily_totals(&self, date: &str) -> Result<GamTotals>;
}

pub struct MongoAnalyticsRepository {
    collection: Collection<Document>,
}

impl MongoAnalyticsRepository {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(ANALYTICS_COLLECTION),
        }
    }
}

#[async_trait]
impl AnalyticsRepository for MongoAnalyticsRepository {
    async fn best_post_rows(
        &self,
        date: &str,
        domains: &[String],
        custom_key: &str,
    ) -> Result<Vec<AnalyticsRow>> {
        // start = end = date：刷新任务只看当天
        let pipeline = vec![
            doc! {"$match": {
                "date": date,
                "domain": {"$in": domains.to_vec()},
                "custom_key": custom_key,
            }},
            doc! {"$group": {
                "_id": {
                    "domain": "$domain",
                    "custom_key": "$custom_key",
                    "custom_value": "$custom_value",
                },
                "impressions": {"$sum": "$impressions"},
                "clicks": {"$sum": "$clicks"},
                "revenue": {"$sum": "$revenue"},
            }},
            doc! {"$project": {
                "_id": 0,
                "date": {"$literal": date},
                "domain": "$_id.domain",
                "custom_key": "$_id.custom_key",
                "custom_value": "$_id.custom_value",
                "impressions": 1,
                "clicks": 1,
                "revenue": 1,
                "ecpm": {"$cond": [
                    {"$gt": ["$impressions", 0]},
                    {"$multiply": [{"$divide": ["$revenue", "$impressions"]}, 1000]},
                    0,
                ]},
            }},
        ];

        let mut cursor = self.collection.aggregate(pipeline).await?;
        let mut rows = Vec::new();
        while let Some(doc) = cursor.try_next().await? {
            // 缺域名或缺 post id 的行在这里丢弃
            if let Some(row) = AnalyticsRow::from_document(&doc) {
                rows.push(row);
            }
        }

        debug!("Analytics aggregation returned {} rows for {}", rows.len(), date);
        Ok(rows)
    }

    async fn distinct(&self, field: &str) -> Result<Vec<String>> {
        if !DISTINCT_FIELDS.contains(&field) {
            return Err(RedronError::validation(format!(
                "field '{field}' is not queryable"
            )));
        }

        let values = self.collection.distinct(field, doc! {}).await?;
        let mut out: Vec<String> = values
            .into_iter()
            .filter_map(|v| match v {
                Bson::String(s) => Some(s),
                Bson::Double(d) => Some(d.to_string()),
                Bson::Int32(i) => Some(i.to_string()),
                Bson::Int64(i) => Some(i.to_string()),
                _ => None,
            })
            .collect();
        out.sort();
        Ok(out)
    }

    async fn daily_totals(&self, date: &str) -> Result<GamTotals> {
        let pipeline = vec![
            doc! {"$match": {"date": date}},
            doc! {"$group": {
                "_id": Bson::Null,
                "impressions": {"$sum": "$impressions"},
                "clicks": {"$sum": "$clicks"},
                "revenue": {"$sum": "$revenue"},
            }},
        ];

        let mut cursor = self.collection.aggregate(pipeline).await?;
        let mut totals = GamTotals {
            date: date.to_string(),
            ..Default::default()
        };

        if let Some(doc) = cursor.try_next().await? {
            totals.impressions = numeric_field(&doc, "impressions").unwrap_or(0.0);
            totals.clicks = numeric_field(&doc, "clicks").unwrap_or(0.0);
            totals.revenue = numeric_field(&doc, "revenue").unwrap_or(0.0);
            if totals.impressions > 0.0 {
                totals.ecpm = totals.revenue / totals.impressions * 1000.0;
            }
        }

        Ok(totals)
    }
}
