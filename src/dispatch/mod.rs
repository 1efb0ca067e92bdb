//! Per-request dispatch
//!
//! `DispatchEngine` turns an inbound visitor request into a destination
//! URL and a link id: sequential assignment across the eCPM-sorted
//! domains per (ip, hour), registry-order fallback while no ranking is
//! published, and a global round-robin `/random` spill once the visitor
//! has traversed everything this hour. `ClickRecorder` owns the detached
//! click and anti-replay writes.

pub mod engine;
pub mod language;
pub mod recorder;
pub mod utm;

use serde::Deserialize;

pub use engine::DispatchEngine;
pub use recorder::ClickRecorder;

/// `GET /` 的查询参数
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DispatchParams {
    pub language: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
    pub fbclid: Option<String>,
    pub gclid: Option<String>,
}

/// 一次分发的结果
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub url: String,
    pub link_id: String,
}
