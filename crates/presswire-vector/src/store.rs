//! Qdrant-backed article index.
//!
//! Sole owner of the article collection's lifecycle: creates it with cosine
//! distance and the configured dimensionality, maintains payload indexes
//! for filtered search, and writes points in batches with
//! wait-for-completion semantics. Points arriving without a vector are
//! embedded inline through [`EmbeddingClient`].

use qdrant_client::qdrant::{
    point_id::PointIdOptions, value::Kind, Condition, CreateCollectionBuilder,
    CreateFieldIndexCollectionBuilder, DeletePointsBuilder, Distance, FieldType, Filter,
    PointId, PointStruct, ScrollPointsBuilder, SearchPointsBuilder, UpsertPointsBuilder,
    Value, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::embedding::EmbeddingClient;
use crate::error::{Result, VectorError};
use crate::filter::SearchFilter;

// ── Config ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct IndexConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub collection: String,
    pub vector_dim: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6334".to_string(),
            api_key: None,
            collection: "news_articles".to_string(),
            vector_dim: 1536,
        }
    }
}

// ── Point model ───────────────────────────────────────────────────────────────

/// Payload stored alongside each vector.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ArticlePayload {
    pub channel_id: Uuid,
    pub title: String,
    pub content: String,
    pub content_preview: String,
    /// ISO-8601 publication timestamp.
    pub published_at: Option<String>,
    /// Unix seconds duplicate of `published_at`, used for range filters.
    pub published_ts: Option<i64>,
    pub categories: Vec<i64>,
    pub topics: Vec<i64>,
    pub political_score: Option<f32>,
    pub event_category: String,
    pub source_url: Option<String>,
    /// Original source identifier, kept when the point id had to be minted.
    pub source_id: Option<String>,
}

/// A point ready for upsert. `vector` may be None; the index embeds the
/// title+content inline during the batch write.
#[derive(Debug, Clone)]
pub struct ArticlePoint {
    pub id: Uuid,
    pub vector: Option<Vec<f32>>,
    pub payload: ArticlePayload,
}

impl ArticlePoint {
    /// Derive an index-compatible id: re-use the source identifier when it
    /// already is a UUID, otherwise mint a fresh one (callers keep the
    /// original in the payload's `source_id`).
    pub fn assign_id(source_id: &str) -> Uuid {
        Uuid::parse_str(source_id).unwrap_or_else(|_| Uuid::new_v4())
    }

    fn embedding_text(&self) -> String {
        format!("{} {}", self.payload.title, self.payload.content)
    }
}

/// A search or scroll hit.
#[derive(Debug, Clone)]
pub struct ScoredArticle {
    pub id: String,
    pub score: f32,
    pub payload: ArticlePayload,
}

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub limit: usize,
    pub offset: usize,
    pub score_threshold: Option<f32>,
    pub filter: SearchFilter,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            offset: 0,
            score_threshold: None,
            filter: SearchFilter::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IndexStats {
    pub total_points: u64,
    pub indexed_vectors: u64,
    pub status: String,
}

// ── Index ─────────────────────────────────────────────────────────────────────

pub struct ArticleIndex {
    client: Qdrant,
    cfg: IndexConfig,
    embedder: EmbeddingClient,
}

impl ArticleIndex {
    pub fn connect(cfg: IndexConfig, embedder: EmbeddingClient) -> Result<Self> {
        let mut builder = Qdrant::from_url(&cfg.url);
        if let Some(ref key) = cfg.api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder.build()?;
        Ok(Self { client, cfg, embedder })
    }

    pub fn collection(&self) -> &str {
        &self.cfg.collection
    }

    /// Create the collection and its payload indexes if absent. No-op when
    /// the collection already exists.
    #[instrument(skip(self), fields(collection = %self.cfg.collection))]
    pub async fn init_collection(&self) -> Result<()> {
        if self.client.collection_exists(&self.cfg.collection).await? {
            debug!("Collection already present");
            return Ok(());
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.cfg.collection).vectors_config(
                    VectorParamsBuilder::new(self.cfg.vector_dim as u64, Distance::Cosine),
                ),
            )
            .await?;

        // Secondary indexes for the filterable payload fields.
        for (field, field_type) in [
            ("channel_id", FieldType::Keyword),
            ("categories", FieldType::Integer),
            ("topics", FieldType::Integer),
            ("published_ts", FieldType::Integer),
            ("event_category", FieldType::Keyword),
        ] {
            self.client
                .create_field_index(CreateFieldIndexCollectionBuilder::new(
                    &self.cfg.collection,
                    field,
                    field_type,
                ))
                .await?;
        }

        info!(dim = self.cfg.vector_dim, "Vector collection created");
        Ok(())
    }

    /// Upsert a batch of points, embedding any that arrive without a
    /// vector. A point whose inline embedding comes back wrong-sized is
    /// skipped rather than aborting the batch; a caller-supplied vector of
    /// the wrong dimensionality is a hard failure.
    #[instrument(skip(self, points), fields(n = points.len()))]
    pub async fn upsert_batch(&self, points: Vec<ArticlePoint>) -> Result<usize> {
        if points.is_empty() {
            return Ok(0);
        }

        let mut structs = Vec::with_capacity(points.len());
        for point in points {
            let text = point.embedding_text();
            let ArticlePoint { id, vector, payload } = point;
            let vector = match vector {
                Some(vec) => {
                    if vec.len() != self.cfg.vector_dim {
                        return Err(VectorError::InvalidEmbeddingDimension {
                            expected: self.cfg.vector_dim,
                            actual: vec.len(),
                        });
                    }
                    vec
                }
                None => {
                    let vec = self.embedder.embed(&text).await;
                    if vec.len() != self.cfg.vector_dim {
                        warn!(point_id = %id, "Embedding wrong-sized — skipping point");
                        continue;
                    }
                    vec
                }
            };

            let payload = Payload::try_from(serde_json::to_value(&payload)?)
                .map_err(|e| VectorError::Qdrant(e.to_string()))?;
            structs.push(PointStruct::new(id.to_string(), vector, payload));
        }

        let written = structs.len();
        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.cfg.collection, structs).wait(true))
            .await?;

        debug!(written, "Batch upserted");
        Ok(written)
    }

    /// Similarity search: embed the query, apply the translated filter and
    /// return hits ordered by descending score.
    #[instrument(skip(self, opts))]
    pub async fn search(&self, query: &str, opts: &SearchOptions) -> Result<Vec<ScoredArticle>> {
        let vector = self.embedder.embed(query).await;

        let mut builder =
            SearchPointsBuilder::new(&self.cfg.collection, vector, opts.limit as u64)
                .with_payload(true);
        if let Some(filter) = opts.filter.to_qdrant() {
            builder = builder.filter(filter);
        }
        if let Some(threshold) = opts.score_threshold {
            builder = builder.score_threshold(threshold);
        }
        if opts.offset > 0 {
            builder = builder.offset(opts.offset as u64);
        }

        let response = self.client.search_points(builder).await?;
        Ok(response
            .result
            .into_iter()
            .filter_map(|point| {
                scored_article(point.id, point.score, point.payload)
            })
            .collect())
    }

    /// Exact-match lookup by channel and event category — a filtered
    /// scroll, not a similarity search, so every hit scores 1.0.
    #[instrument(skip(self))]
    pub async fn find_by_channel_and_category(
        &self,
        channel_id: Uuid,
        category: &str,
        limit: usize,
    ) -> Result<Vec<ScoredArticle>> {
        let filter = Filter::must([
            Condition::matches("channel_id", channel_id.to_string()),
            Condition::matches("event_category", category.to_string()),
        ]);

        let response = self.client
            .scroll(
                ScrollPointsBuilder::new(&self.cfg.collection)
                    .filter(filter)
                    .limit(limit as u32)
                    .with_payload(true),
            )
            .await?;

        Ok(response
            .result
            .into_iter()
            .filter_map(|point| scored_article(point.id, 1.0, point.payload))
            .collect())
    }

    /// Remove every point belonging to a channel.
    #[instrument(skip(self))]
    pub async fn delete_by_channel(&self, channel_id: Uuid) -> Result<()> {
        let filter = Filter::must([Condition::matches("channel_id", channel_id.to_string())]);
        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.cfg.collection)
                    .points(filter)
                    .wait(true),
            )
            .await?;
        Ok(())
    }

    pub async fn stats(&self) -> Result<IndexStats> {
        let response = self.client.collection_info(&self.cfg.collection).await?;
        let info = response
            .result
            .ok_or_else(|| VectorError::CollectionNotFound(self.cfg.collection.clone()))?;
        Ok(IndexStats {
            total_points: info.points_count.unwrap_or(0),
            indexed_vectors: info.indexed_vectors_count.unwrap_or(0),
            status: info.status().as_str_name().to_string(),
        })
    }

    pub async fn health_check(&self) -> bool {
        self.client.health_check().await.is_ok()
    }
}

// ── Payload plumbing ──────────────────────────────────────────────────────────

fn scored_article(
    id: Option<PointId>,
    score: f32,
    payload: std::collections::HashMap<String, Value>,
) -> Option<ScoredArticle> {
    let id = id.map(point_id_string).unwrap_or_default();
    let json = serde_json::Value::Object(
        payload
            .into_iter()
            .map(|(key, value)| (key, value_to_json(value)))
            .collect(),
    );
    match serde_json::from_value::<ArticlePayload>(json) {
        Ok(payload) => Some(ScoredArticle { id, score, payload }),
        Err(e) => {
            warn!(%id, "Dropping hit with undecodable payload: {e}");
            None
        }
    }
}

fn point_id_string(id: PointId) -> String {
    match id.point_id_options {
        Some(PointIdOptions::Uuid(uuid)) => uuid,
        Some(PointIdOptions::Num(num)) => num.to_string(),
        None => String::new(),
    }
}

fn value_to_json(value: Value) -> serde_json::Value {
    match value.kind {
        None | Some(Kind::NullValue(_)) => serde_json::Value::Null,
        Some(Kind::BoolValue(b)) => serde_json::Value::Bool(b),
        Some(Kind::IntegerValue(i)) => serde_json::json!(i),
        Some(Kind::DoubleValue(d)) => serde_json::json!(d),
        Some(Kind::StringValue(s)) => serde_json::Value::String(s),
        Some(Kind::ListValue(list)) => {
            serde_json::Value::Array(list.values.into_iter().map(value_to_json).collect())
        }
        Some(Kind::StructValue(fields)) => serde_json::Value::Object(
            fields
                .fields
                .into_iter()
                .map(|(key, value)| (key, value_to_json(value)))
                .collect(),
        ),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
