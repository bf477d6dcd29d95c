//! Source collection access.
//!
//! Pagination is cursor-based on the record id (strictly greater-than), not
//! skip/offset, so a crash mid-run resumes without re-scanning. Connection
//! errors propagate uncaught — the orchestrator decides whether they are
//! fatal to the job.

use anyhow::Context;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{self, doc, oid::ObjectId, Document};
use mongodb::{Client, Collection};
use tracing::{debug, instrument, warn};

use crate::models::{DateRange, SourceArticle};
use crate::normalize::ValidationPolicy;

/// Read access to the source article collection.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Count the records matching the date window (and the status filter).
    async fn count(&self, range: &DateRange) -> anyhow::Result<u64>;

    /// Fetch up to `limit` records ordered ascending by id, strictly after
    /// the cursor when one is given.
    async fn fetch_batch(
        &self,
        limit: usize,
        after: Option<&str>,
        range: &DateRange,
    ) -> anyhow::Result<Vec<SourceArticle>>;

    async fn health_check(&self) -> bool;
}

// ── MongoDB implementation ────────────────────────────────────────────────────

pub struct MongoArticleSource {
    client: Client,
    db_name: String,
    collection_name: String,
    policy: ValidationPolicy,
}

impl MongoArticleSource {
    /// Connect and verify the deployment answers a ping.
    pub async fn connect(
        uri: &str,
        db_name: &str,
        collection_name: &str,
        policy: ValidationPolicy,
    ) -> presswire_common::Result<Self> {
        let client = Client::with_uri_str(uri).await?;
        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(Self {
            client,
            db_name: db_name.to_string(),
            collection_name: collection_name.to_string(),
            policy,
        })
    }

    /// Tear the connection pool down. Fetches after this point fail.
    pub async fn disconnect(self) {
        self.client.shutdown().await;
    }

    fn collection(&self) -> Collection<Document> {
        self.client
            .database(&self.db_name)
            .collection(&self.collection_name)
    }

    fn build_filter(&self, after: Option<&str>, range: &DateRange) -> anyhow::Result<Document> {
        // The status filter mirrors the validation policy so the reader and
        // the normalizer agree on which records are migration-eligible.
        let codes = self.policy.accepted_status_codes().to_vec();
        let mut filter = if self.policy.accepts_missing_status() {
            doc! {
                "$or": [
                    { "status": { "$in": codes } },
                    { "status": { "$exists": false } },
                ]
            }
        } else {
            doc! { "status": { "$in": codes } }
        };

        if let Some(cursor) = after {
            let oid = ObjectId::parse_str(cursor)
                .with_context(|| format!("invalid resume cursor: {cursor}"))?;
            filter.insert("_id", doc! { "$gt": oid });
        }

        let mut window = Document::new();
        if let Some(from) = range.from {
            window.insert("$gte", bson::DateTime::from_chrono(from));
        }
        if let Some(to) = range.to {
            window.insert("$lte", bson::DateTime::from_chrono(to));
        }
        if !window.is_empty() {
            filter.insert("published_at", window);
        }

        Ok(filter)
    }
}

#[async_trait]
impl ArticleSource for MongoArticleSource {
    #[instrument(skip(self))]
    async fn count(&self, range: &DateRange) -> anyhow::Result<u64> {
        let filter = self.build_filter(None, range)?;
        let count = self
            .collection()
            .count_documents(filter)
            .await
            .context("source count failed")?;
        Ok(count)
    }

    #[instrument(skip(self, range))]
    async fn fetch_batch(
        &self,
        limit: usize,
        after: Option<&str>,
        range: &DateRange,
    ) -> anyhow::Result<Vec<SourceArticle>> {
        let filter = self.build_filter(after, range)?;
        let mut cursor = self
            .collection()
            .find(filter)
            .sort(doc! { "_id": 1 })
            .limit(limit as i64)
            .await
            .context("source query failed")?;

        let mut batch = Vec::with_capacity(limit);
        while let Some(document) = cursor.try_next().await.context("source cursor failed")? {
            batch.push(decode_article(document));
        }

        debug!(n = batch.len(), "Batch fetched");
        Ok(batch)
    }

    async fn health_check(&self) -> bool {
        self.client
            .database(&self.db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .is_ok()
    }
}

/// Decode one source document. An undecodable document still yields a
/// record carrying its id, so the resumption cursor keeps advancing and the
/// validator counts it as a skip instead of wedging the batch loop.
fn decode_article(document: Document) -> SourceArticle {
    let fallback_id = document
        .get_object_id("_id")
        .map(|oid| oid.to_hex())
        .unwrap_or_default();

    match bson::from_document::<SourceArticle>(document) {
        Ok(article) => article,
        Err(e) => {
            warn!(id = %fallback_id, "Undecodable source document: {e}");
            SourceArticle {
                id: fallback_id,
                ..Default::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::Bson;

    #[test]
    fn decode_falls_back_to_id_only_record() {
        let document = doc! {
            "_id": ObjectId::new(),
            "title": 17, // wrong type on purpose
        };
        let expected = document.get_object_id("_id").unwrap().to_hex();
        let article = decode_article(document);
        assert_eq!(article.id, expected);
        assert!(article.title.is_empty());
    }

    #[tokio::test]
    async fn filter_includes_cursor_and_window() {
        let source = mongo_source(ValidationPolicy::Strict).await;
        let oid = ObjectId::new();
        let from = chrono::Utc::now();
        let filter = source
            .build_filter(
                Some(&oid.to_hex()),
                &DateRange {
                    from: Some(from),
                    to: None,
                },
            )
            .unwrap();

        assert_eq!(
            filter.get_document("_id").unwrap().get("$gt"),
            Some(&Bson::ObjectId(oid))
        );
        assert!(filter.get_document("published_at").unwrap().contains_key("$gte"));
        assert_eq!(
            filter.get_document("status").unwrap().get("$in"),
            Some(&Bson::Array(vec![Bson::Int32(1)]))
        );
    }

    #[tokio::test]
    async fn permissive_filter_admits_missing_status() {
        let source = mongo_source(ValidationPolicy::Permissive).await;
        let filter = source.build_filter(None, &DateRange::default()).unwrap();
        let branches = filter.get_array("$or").unwrap();
        assert_eq!(branches.len(), 2);
    }

    #[tokio::test]
    async fn invalid_cursor_is_an_error() {
        let source = mongo_source(ValidationPolicy::Strict).await;
        assert!(source
            .build_filter(Some("not-an-object-id"), &DateRange::default())
            .is_err());
    }

    async fn mongo_source(policy: ValidationPolicy) -> MongoArticleSource {
        // Client creation only parses options; nothing dials until the
        // first operation, which filter tests never run.
        let client = Client::with_uri_str("mongodb://localhost:27017")
            .await
            .expect("client options parse");
        MongoArticleSource {
            client,
            db_name: "news".to_string(),
            collection_name: "articles".to_string(),
            policy,
        }
    }
}
