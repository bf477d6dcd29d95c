//! Embedding client — produces fixed-length vectors for article text.
//!
//! Primary path calls an OpenAI-compatible `/v1/embeddings` endpoint with
//! the configured model. Any remote failure (quota, network, auth) logs a
//! warning and falls back to [`fallback_embedding`], a deterministic offline
//! vector — the migration never stalls on the embedding service. Both paths
//! produce vectors of the configured dimensionality, so downstream storage
//! is agnostic to which one ran.

use std::collections::HashMap;
use std::time::Duration;

use tracing::{instrument, warn};

// ── Config ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EmbeddingConfig {
    pub api_key:         Option<String>,
    pub model:           String,
    pub dim:             usize,
    pub base_url:        Option<String>,  // for any /v1/embeddings-compatible host
    /// Input is truncated to this many characters to bound cost and latency.
    pub max_input_chars: usize,
    pub timeout_secs:    u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_key:         None,
            model:           "text-embedding-3-small".to_string(),
            dim:             1536,
            base_url:        None,
            max_input_chars: 1000,
            timeout_secs:    30,
        }
    }
}

// ── Client ────────────────────────────────────────────────────────────────────

pub struct EmbeddingClient {
    cfg:    EmbeddingConfig,
    client: reqwest::Client,
}

impl EmbeddingClient {
    pub fn new(cfg: EmbeddingConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .unwrap_or_default();
        Self { cfg, client }
    }

    pub fn dim(&self) -> usize {
        self.cfg.dim
    }

    /// Embed one text. Never raises to the caller: remote failures and
    /// wrong-sized responses fall back to the offline embedding.
    #[instrument(skip(self, text), fields(len = text.len()))]
    pub async fn embed(&self, text: &str) -> Vec<f32> {
        let input: String = text.chars().take(self.cfg.max_input_chars).collect();
        match self.embed_remote(&input).await {
            Ok(vec) if vec.len() == self.cfg.dim => vec,
            Ok(vec) => {
                warn!(
                    expected = self.cfg.dim,
                    actual = vec.len(),
                    "Remote embedding has wrong dimensionality — using offline fallback"
                );
                fallback_embedding(&input, self.cfg.dim)
            }
            Err(e) => {
                warn!("Remote embedding failed: {e} — using offline fallback");
                fallback_embedding(&input, self.cfg.dim)
            }
        }
    }

    async fn embed_remote(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let key = self
            .cfg
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("no embedding API key configured"))?;
        let base = self
            .cfg
            .base_url
            .as_deref()
            .unwrap_or("https://api.openai.com")
            .trim_end_matches('/');
        let url = format!("{base}/v1/embeddings");

        let body = serde_json::json!({
            "model": &self.cfg.model,
            "input": [text],
        });
        let resp = self.client
            .post(&url)
            .bearer_auth(key)
            .json(&body)
            .send()
            .await?;
        if !resp.status().is_success() {
            anyhow::bail!("embedding endpoint returned HTTP {}", resp.status());
        }
        let json: serde_json::Value = resp.json().await?;

        parse_openai_embeddings(&json)
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("empty embedding response"))
    }
}

fn parse_openai_embeddings(resp: &serde_json::Value) -> Vec<Vec<f32>> {
    resp["data"].as_array().unwrap_or(&vec![])
        .iter()
        .map(|item| item["embedding"].as_array().unwrap_or(&vec![])
            .iter().map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect())
        .collect()
}

// ── Offline fallback ──────────────────────────────────────────────────────────

const SCATTER_POSITIONS: u32 = 3;
const FILL_DIMS: usize = 32;

/// Deterministic offline embedding used when the remote model is unavailable.
///
/// Normalized word frequencies are scattered across hash-derived positions,
/// weighted by a cosine spread factor, then low dimensions that hashing left
/// empty are filled from text length and character diversity, and the whole
/// vector is L2-normalized. Identical input always yields an identical
/// vector; an input with no words yields the zero vector.
pub fn fallback_embedding(text: &str, dim: usize) -> Vec<f32> {
    let mut vector = vec![0.0f32; dim];
    if dim == 0 {
        return vector;
    }

    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().collect();
    if words.is_empty() {
        return vector;
    }

    let total = words.len() as f32;
    let mut frequencies: HashMap<&str, usize> = HashMap::new();
    for word in &words {
        *frequencies.entry(*word).or_insert(0) += 1;
    }

    for (word, count) in &frequencies {
        let freq = *count as f32 / total;
        let hash = fnv64(word.as_bytes());
        for i in 0..SCATTER_POSITIONS {
            let position = (hash.rotate_left(i * 21) % dim as u64) as usize;
            let spread = (i as f32 * 0.5).cos();
            vector[position] += freq * spread;
        }
    }

    // Character-level features for low dimensions the hash scatter missed.
    let char_count = lowered.chars().count().max(1);
    let unique_chars: std::collections::HashSet<char> = lowered.chars().collect();
    let diversity = unique_chars.len() as f32 / char_count as f32;
    let length_feature = (lowered.len() as f32).ln_1p() / 10.0;
    for (i, slot) in vector.iter_mut().take(FILL_DIMS).enumerate() {
        if *slot == 0.0 {
            *slot = length_feature * diversity / (i as f32 + 1.0);
        }
    }

    l2_normalize(&mut vector);
    vector
}

fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

fn fnv64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 14695981039346656037;
    for &byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(1099511628211);
    }
    hash
}

// ── Tests ─────────────────────────────────────────────────────────────────────
