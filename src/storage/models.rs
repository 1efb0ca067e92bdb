//! Typed documents for the three collections
//!
//! The upstream ETL writes analytics rows with loosely typed fields:
//! numbers arrive as doubles, 32/64-bit ints or strings depending on the
//! producer's mood. `AnalyticsRow` is the strict shape the rest of the
//! system works with; the conversion happens exactly once, in
//! [`AnalyticsRow::from_document`].

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document};
use serde::{Deserialize, Serialize};

/// 分析集合的一行（聚合之后的形态）
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsRow {
    pub date: Option<String>,
    pub domain: String,
    pub custom_key: Option<String>,
    /// post id（`id_post_wp` 分组下的取值）
    pub custom_value: String,
    pub impressions: Option<f64>,
    pub clicks: Option<f64>,
    pub revenue: Option<f64>,
    pub ecpm: Option<f64>,
}

impl AnalyticsRow {
    /// Convert a raw aggregation document into the strict row shape.
    ///
    /// Rows without a usable domain or custom_value are of no use to the
    /// ranking and are dropped here rather than downstream.
    pub fn from_document(doc: &Document) -> Option<Self> {
        let domain = string_field(doc, "domain")?;
        let custom_value = string_field(doc, "custom_value")?;
        if domain.is_empty() || custom_value.is_empty() {
            return None;
        }

        Some(Self {
            date: string_field(doc, "date"),
            domain,
            custom_key: string_field(doc, "custom_key"),
            custom_value,
            impressions: numeric_field(doc, "impressions"),
            clicks: numeric_field(doc, "clicks"),
            revenue: numeric_field(doc, "revenue"),
            ecpm: numeric_field(doc, "ecpm"),
        })
    }
}

/// 读取可能为字符串编码的数值字段
pub fn numeric_field(doc: &Document, key: &str) -> Option<f64> {
    match doc.get(key)? {
        Bson::Double(v) => Some(*v),
        Bson::Int32(v) => Some(*v as f64),
        Bson::Int64(v) => Some(*v as f64),
        Bson::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn string_field(doc: &Document, key: &str) -> Option<String> {
    match doc.get(key)? {
        Bson::String(s) => Some(s.clone()),
        Bson::Double(v) => Some(v.to_string()),
        Bson::Int32(v) => Some(v.to_string()),
        Bson::Int64(v) => Some(v.to_string()),
        _ => None,
    }
}

/// `redirects_links` 的持久化记录
///
/// 每次刷新后，(domain, url) 至多存在一条 active 记录。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub domain: String,
    pub url: String,
    pub status: bool,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// `redirects_clicks` 的计数记录，link_id 上有唯一索引
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickCounter {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub link_id: String,
    pub count: i64,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn test_numeric_field_variants() {
        let doc = doc! {
            "double": 1.5,
            "int32": 3_i32,
            "int64": 9_i64,
            "string": "2.75",
            "padded": " 4.5 ",
            "garbage": "not-a-number",
            "null": Bson::Null,
        };
        assert_eq!(numeric_field(&doc, "double"), Some(1.5));
        assert_eq!(numeric_field(&doc, "int32"), Some(3.0));
        assert_eq!(numeric_field(&doc, "int64"), Some(9.0));
        assert_eq!(numeric_field(&doc, "string"), Some(2.75));
        assert_eq!(numeric_field(&doc, "padded"), Some(4.5));
        assert_eq!(numeric_field(&doc, "garbage"), None);
        assert_eq!(numeric_field(&doc, "null"), None);
        assert_eq!(numeric_field(&doc, "missing"), None);
    }

    #[test]
    fn test_row_from_document() {
        let doc = doc! {
            "date": "2026-08-02",
            "domain": "useuapp.com",
            "custom_key": "id_post_wp",
            "custom_value": "1234",
            "impressions": 1000_i32,
            "clicks": "37",
            "revenue": 4.2,
            "ecpm": "4.2",
        };
        let row = AnalyticsRow::from_document(&doc).unwrap();
        assert_eq!(row.domain, "useuapp.com");
        assert_eq!(row.custom_value, "1234");
        assert_eq!(row.impressions, Some(1000.0));
        assert_eq!(row.clicks, Some(37.0));
        assert_eq!(row.ecpm, Some(4.2));
    }

    #[test]
    fn test_row_requires_domain_and_post() {
        assert!(AnalyticsRow::from_document(&doc! {"custom_value": "1"}).is_none());
        assert!(AnalyticsRow::from_document(&doc! {"domain": "a.com"}).is_none());
        assert!(
            AnalyticsRow::from_document(&doc! {"domain": "", "custom_value": "1"}).is_none()
        );
    }
}
