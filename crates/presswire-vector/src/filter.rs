//! Search filter translation.
//!
//! Callers describe constraints with a plain struct; this module turns it
//! into Qdrant conditions. Equality fields become `must` matches, id lists
//! become any-of matches, and the publication window becomes a numeric
//! range over the `published_ts` payload field.

use chrono::{DateTime, Utc};
use qdrant_client::qdrant::{Condition, Filter, Range};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub channel_id: Option<Uuid>,
    pub event_category: Option<String>,
    /// Any-of match over category ids.
    pub categories: Option<Vec<i64>>,
    /// Any-of match over topic ids.
    pub topics: Option<Vec<i64>>,
    pub published_after: Option<DateTime<Utc>>,
    pub published_before: Option<DateTime<Utc>>,
}

impl SearchFilter {
    pub fn is_empty(&self) -> bool {
        self.channel_id.is_none()
            && self.event_category.is_none()
            && self.categories.is_none()
            && self.topics.is_none()
            && self.published_after.is_none()
            && self.published_before.is_none()
    }

    pub(crate) fn to_qdrant(&self) -> Option<Filter> {
        let mut must: Vec<Condition> = Vec::new();

        if let Some(channel_id) = self.channel_id {
            must.push(Condition::matches("channel_id", channel_id.to_string()));
        }
        if let Some(ref category) = self.event_category {
            must.push(Condition::matches("event_category", category.clone()));
        }
        if let Some(ref ids) = self.categories {
            must.push(Condition::matches("categories", ids.clone()));
        }
        if let Some(ref ids) = self.topics {
            must.push(Condition::matches("topics", ids.clone()));
        }
        if self.published_after.is_some() || self.published_before.is_some() {
            must.push(Condition::range(
                "published_ts",
                Range {
                    gte: self.published_after.map(|t| t.timestamp() as f64),
                    lte: self.published_before.map(|t| t.timestamp() as f64),
                    ..Default::default()
                },
            ));
        }

        if must.is_empty() {
            None
        } else {
            Some(Filter::must(must))
        }
    }
}
