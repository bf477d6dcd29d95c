//! Round-trip test against a live Qdrant instance.
//!
//! Requires Qdrant on localhost. Run with:
//! ```bash
//! cargo test --package presswire-vector --test test_index_roundtrip -- --ignored --nocapture
//! ```

use presswire_vector::{
    ArticleIndex, ArticlePayload, ArticlePoint, EmbeddingClient, EmbeddingConfig, IndexConfig,
    SearchFilter, SearchOptions,
};
use uuid::Uuid;

fn sample_point(channel_id: Uuid, title: &str, category: &str) -> ArticlePoint {
    ArticlePoint {
        id: Uuid::new_v4(),
        vector: None,
        payload: ArticlePayload {
            channel_id,
            title: title.to_string(),
            content: format!("{title} — full article body for the round-trip test."),
            content_preview: title.to_string(),
            published_at: Some("2024-03-01T09:00:00+00:00".to_string()),
            published_ts: Some(1_709_283_600),
            categories: vec![1],
            topics: vec![4],
            political_score: None,
            event_category: category.to_string(),
            source_url: None,
            source_id: None,
        },
    }
}

#[tokio::test(flavor = "multi_thread")]
#[ignore] // Requires a running Qdrant
async fn test_upsert_search_scroll_delete() {
    let _ = tracing_subscriber::fmt::try_init();

    let cfg = IndexConfig {
        collection: format!("presswire_test_{}", Uuid::new_v4().simple()),
        vector_dim: 128,
        ..Default::default()
    };
    // No API key configured: every point takes the offline fallback path.
    let embedder = EmbeddingClient::new(EmbeddingConfig {
        dim: 128,
        ..Default::default()
    });
    let index = ArticleIndex::connect(cfg, embedder).expect("connect");

    assert!(index.health_check().await, "Qdrant should be reachable");
    index.init_collection().await.expect("init");
    // Idempotent: a second call is a no-op.
    index.init_collection().await.expect("re-init");

    let channel_id = Uuid::new_v4();
    let points = vec![
        sample_point(channel_id, "Parliament passes the budget", "politics"),
        sample_point(channel_id, "Markets rally on rate cut", "economy"),
        sample_point(channel_id, "Cup final goes to penalties", "sports"),
    ];
    let written = index.upsert_batch(points).await.expect("upsert");
    assert_eq!(written, 3);

    let stats = index.stats().await.expect("stats");
    assert_eq!(stats.total_points, 3);

    let hits = index
        .search(
            "budget vote in parliament",
            &SearchOptions {
                limit: 2,
                filter: SearchFilter {
                    channel_id: Some(channel_id),
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .await
        .expect("search");
    assert!(!hits.is_empty());
    assert!(hits.len() <= 2);

    let exact = index
        .find_by_channel_and_category(channel_id, "economy", 10)
        .await
        .expect("scroll");
    assert_eq!(exact.len(), 1);
    assert_eq!(exact[0].score, 1.0);
    assert_eq!(exact[0].payload.event_category, "economy");

    index.delete_by_channel(channel_id).await.expect("delete");
    let stats = index.stats().await.expect("stats after delete");
    assert_eq!(stats.total_points, 0);
}

#[tokio::test(flavor = "multi_thread")]
#[ignore] // Requires a running Qdrant
async fn test_mismatched_vector_is_rejected() {
    let cfg = IndexConfig {
        collection: format!("presswire_test_{}", Uuid::new_v4().simple()),
        vector_dim: 128,
        ..Default::default()
    };
    let embedder = EmbeddingClient::new(EmbeddingConfig {
        dim: 128,
        ..Default::default()
    });
    let index = ArticleIndex::connect(cfg, embedder).expect("connect");
    index.init_collection().await.expect("init");

    let mut point = sample_point(Uuid::new_v4(), "Wrong-sized vector", "general");
    point.vector = Some(vec![0.5; 64]); // half the configured size

    let err = index.upsert_batch(vec![point]).await.unwrap_err();
    assert!(matches!(
        err,
        presswire_vector::VectorError::InvalidEmbeddingDimension { expected: 128, actual: 64 }
    ));
}
