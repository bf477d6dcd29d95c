//! Data models for the migration pipeline.

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::hex_string_as_object_id;
use mongodb::bson::Bson;
use serde::{Deserialize, Serialize};

/// A news article as stored in the source collection.
///
/// Field names mirror the source documents. The body may live under any of
/// several names depending on the authoring tool that produced the record;
/// `normalize::resolve_body` consults them in a fixed order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceArticle {
    /// Hex ObjectId: opaque, monotonically sortable, and the sole
    /// resumption cursor for paginated extraction.
    #[serde(rename = "_id", with = "hex_string_as_object_id")]
    pub id: String,
    pub title: String,
    /// Primary rich-text body.
    pub content: Option<String>,
    /// Plain-text alternates.
    pub body: Option<String>,
    pub text: Option<String>,
    pub summary: Option<String>,
    pub seo_description: Option<String>,
    pub published_at: Option<mongodb::bson::DateTime>,
    /// Lifecycle status code: 1 = published, 0 = draft-like.
    pub status: Option<i32>,
    pub category_ids: Vec<i64>,
    pub topic_ids: Vec<i64>,
    pub hit_count: i64,
    pub slug: Option<String>,
    pub url: Option<String>,
    /// Arbitrary nested attachment metadata, preserved as-is.
    pub attachments: Option<Bson>,
}

impl SourceArticle {
    pub fn published_at_utc(&self) -> Option<DateTime<Utc>> {
        self.published_at.map(|ts| ts.to_chrono())
    }
}

/// Publication-date window for counting and fetching.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}
