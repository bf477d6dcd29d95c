//! Field transformation into the two target representations.
//!
//! One transformer, two output methods: relational rows for the article
//! store and points for the vector index. Both validate first and
//! short-circuit with a skip (not an error) when validation fails — skips
//! and failures are counted separately throughout the pipeline.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;
use uuid::Uuid;

use presswire_db::NewArticle;
use presswire_vector::{ArticlePayload, ArticlePoint};

use crate::models::SourceArticle;
use crate::normalize::{normalize, resolve_body, ValidationPolicy};

/// How many characters of cleaned content go into the vector payload's
/// preview field.
pub const PREVIEW_MAX_CHARS: usize = 500;

/// Result of transforming one record.
#[derive(Debug, Clone)]
pub enum TransformOutcome<T> {
    Ready(T),
    /// Validation rejected the record — intentionally excluded, never
    /// surfaced as an error.
    Skipped { issues: Vec<String> },
}

impl<T> TransformOutcome<T> {
    pub fn is_skipped(&self) -> bool {
        matches!(self, TransformOutcome::Skipped { .. })
    }
}

pub struct Transformer {
    policy: ValidationPolicy,
}

impl Transformer {
    pub fn new(policy: ValidationPolicy) -> Self {
        Self { policy }
    }

    /// Map a source record into a relational row.
    pub fn to_relational(
        &self,
        article: &SourceArticle,
        channel_id: Uuid,
    ) -> anyhow::Result<TransformOutcome<NewArticle>> {
        let normalized = normalize(article, self.policy);
        if !normalized.validation.is_valid {
            debug!(id = %article.id, issues = ?normalized.validation.issues, "Record skipped");
            return Ok(TransformOutcome::Skipped {
                issues: normalized.validation.issues,
            });
        }

        Ok(TransformOutcome::Ready(NewArticle {
            title: article.title.trim().to_string(),
            content: normalized.content,
            summary: Some(normalized.summary),
            channel_id,
            published_at: article.published_at_utc(),
            source_metadata: source_metadata(article)?,
        }))
    }

    /// Map a source record into a vector-index point. The embedding is left
    /// empty; the index fills it during the batch write.
    pub fn to_vector_point(
        &self,
        article: &SourceArticle,
        channel_id: Uuid,
    ) -> anyhow::Result<TransformOutcome<ArticlePoint>> {
        let normalized = normalize(article, self.policy);
        if !normalized.validation.is_valid {
            return Ok(TransformOutcome::Skipped {
                issues: normalized.validation.issues,
            });
        }

        let id = ArticlePoint::assign_id(&article.id);
        let published = article.published_at_utc();
        let content = normalized.content;
        let preview: String = content.chars().take(PREVIEW_MAX_CHARS).collect();

        Ok(TransformOutcome::Ready(ArticlePoint {
            id,
            vector: None,
            payload: ArticlePayload {
                channel_id,
                title: article.title.trim().to_string(),
                content_preview: preview,
                published_at: published.map(|t| t.to_rfc3339()),
                published_ts: published.map(|t| t.timestamp()),
                categories: article.category_ids.clone(),
                topics: article.topic_ids.clone(),
                // Stance analysis runs in a later phase; reserved until then.
                political_score: None,
                event_category: categorize_event(&format!("{} {}", article.title, content))
                    .to_string(),
                source_url: article.url.clone(),
                source_id: Some(article.id.clone()),
                content,
            },
        }))
    }
}

/// Pack everything the target schemas drop into one JSON blob. This is the
/// only place the original raw data survives after migration.
fn source_metadata(article: &SourceArticle) -> anyhow::Result<serde_json::Value> {
    Ok(serde_json::json!({
        "source_id": article.id,
        "slug": article.slug,
        "url": article.url,
        "status": article.status,
        "category_ids": article.category_ids,
        "topic_ids": article.topic_ids,
        "hit_count": article.hit_count,
        "attachments": article.attachments.clone().map(serde_json::Value::from),
        "raw_content": resolve_body(article),
    }))
}

// ── Event categorization ──────────────────────────────────────────────────────

lazy_static! {
    /// Ordered keyword rules — first match wins, so the earlier category
    /// takes priority when a text matches several.
    static ref EVENT_RULES: Vec<(&'static str, Regex)> = vec![
        ("politics", Regex::new(r"\b(election|government|parliament|senate|minister|policy|president|vote|campaign)\b").unwrap()),
        ("economy", Regex::new(r"\b(economy|markets?|stocks?|inflation|trade|bank|finance|gdp|investment)\b").unwrap()),
        ("sports", Regex::new(r"\b(game|match|league|tournament|championship|olympics?|soccer|football|baseball)\b").unwrap()),
        ("technology", Regex::new(r"\b(tech|software|internet|startup|smartphone|semiconductor|robot|artificial intelligence)\b").unwrap()),
        ("health", Regex::new(r"\b(health|hospital|disease|vaccine|medical|virus|medicine|clinic)\b").unwrap()),
    ];
}

/// Rule-based event categorizer over lowercased title+content.
/// Deterministic and order-sensitive; no model involved.
pub fn categorize_event(text: &str) -> &'static str {
    let lowered = text.to_lowercase();
    EVENT_RULES
        .iter()
        .find(|(_, rule)| rule.is_match(&lowered))
        .map(|(category, _)| *category)
        .unwrap_or("general")
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn published_article() -> SourceArticle {
        SourceArticle {
            id: "64b2f0c8a1d2e3f4a5b6c7d8".to_string(),
            title: "Markets rally on surprise rate cut".to_string(),
            content: Some(
                "<p>The central bank cut rates and the market reacted with a \
                 broad rally across every sector of the exchange.</p>"
                    .to_string(),
            ),
            status: Some(1),
            category_ids: vec![2, 5],
            topic_ids: vec![11],
            hit_count: 1203,
            slug: Some("markets-rally".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn economy_keyword_without_politics_classifies_economy() {
        assert_eq!(categorize_event("the market closed higher on trade news"), "economy");
    }

    #[test]
    fn unmatched_text_classifies_general() {
        assert_eq!(categorize_event("a quiet day in the village"), "general");
    }

    #[test]
    fn earlier_rule_wins_when_both_match() {
        // politics before economy
        assert_eq!(
            categorize_event("the election rattled the stock market"),
            "politics"
        );
        // economy before sports
        assert_eq!(
            categorize_event("inflation worries overshadow the championship"),
            "economy"
        );
    }

    #[test]
    fn relational_transform_cleans_and_preserves_metadata() {
        let transformer = Transformer::new(ValidationPolicy::Strict);
        let article = published_article();
        let channel_id = Uuid::new_v4();

        let outcome = transformer.to_relational(&article, channel_id).unwrap();
        let TransformOutcome::Ready(row) = outcome else {
            panic!("expected a ready row");
        };
        assert_eq!(row.channel_id, channel_id);
        assert!(!row.content.contains('<'), "markup must be stripped");
        assert_eq!(row.source_metadata["source_id"], article.id.as_str());
        assert_eq!(row.source_metadata["hit_count"], 1203);
        assert_eq!(row.source_metadata["category_ids"][1], 5);
        assert!(row.source_metadata["raw_content"]
            .as_str()
            .unwrap()
            .contains("<p>"));
    }

    #[test]
    fn invalid_record_is_skipped_not_failed() {
        let transformer = Transformer::new(ValidationPolicy::Strict);
        let mut article = published_article();
        article.content = None;

        let outcome = transformer.to_relational(&article, Uuid::new_v4()).unwrap();
        assert!(outcome.is_skipped());
        let outcome = transformer
            .to_vector_point(&article, Uuid::new_v4())
            .unwrap();
        assert!(outcome.is_skipped());
    }

    #[test]
    fn vector_point_mints_uuid_and_keeps_original_id() {
        let transformer = Transformer::new(ValidationPolicy::Strict);
        let article = published_article();

        let outcome = transformer
            .to_vector_point(&article, Uuid::new_v4())
            .unwrap();
        let TransformOutcome::Ready(point) = outcome else {
            panic!("expected a ready point");
        };
        // ObjectId hex is not a UUID, so a fresh id is minted.
        assert_eq!(point.id.get_version_num(), 4);
        assert_eq!(point.payload.source_id.as_deref(), Some(article.id.as_str()));
        assert!(point.vector.is_none(), "embedding is filled at write time");
        assert_eq!(point.payload.event_category, "economy");
        assert_eq!(point.payload.categories, vec![2, 5]);
    }
}
