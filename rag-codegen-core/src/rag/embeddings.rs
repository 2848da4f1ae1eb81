use crate::llm::types::EmbeddingRequest;
use crate::llm::{LLMError, LLMProvider};
use async_trait::async_trait;
use std::sync::Arc;

// Vector type for embeddings
pub type Vector = Vec<f32>;

/// Default dimension, matching small sentence-embedding models
pub const DEFAULT_DIMENSION: usize = 384;

/// Turns text into vectors for similarity search
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Identifies the embedding scheme; persisted next to the vectors
    fn id(&self) -> String;

    /// Embed a batch of texts, one vector per input in the same order
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vector>, LLMError>;
}

/// Offline embedder using signed feature hashing of code tokens.
///
/// Identifiers contribute both as whole words and through their
/// snake_case/camelCase parts, so `read_csv_file` and `readCsv` land close
/// together. Vectors are L2-normalised.
#[derive(Debug, Clone)]
pub struct HashedEmbedder {
    dimension: usize,
}

impl HashedEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension: dimension.max(1) }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn embed_one(&self, text: &str) -> Vector {
        let mut embedding = vec![0.0f32; self.dimension];

        for m in regex_utils::tokens::WORD_PATTERN.find_iter(text) {
            self.add_feature(&mut embedding, &m.as_str().to_lowercase(), 1.0);
            for part in regex_utils::tokens::sub_words(m.as_str()) {
                self.add_feature(&mut embedding, &part, 0.5);
            }
        }

        normalize(&mut embedding);
        embedding
    }

    fn add_feature(&self, embedding: &mut [f32], feature: &str, weight: f32) {
        let hash = fnv1a(feature.as_bytes());
        let idx = (hash % self.dimension as u64) as usize;
        let sign = if (hash >> 63) & 1 == 0 { 1.0 } else { -1.0 };
        embedding[idx] += sign * weight;
    }
}

impl Default for HashedEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

#[async_trait]
impl Embedder for HashedEmbedder {
    fn id(&self) -> String {
        format!("hashed-v1-{}", self.dimension)
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vector>, LLMError> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }
}

/// Embedder backed by a provider's embeddings endpoint
pub struct ProviderEmbedder {
    provider: Arc<dyn LLMProvider>,
    model: String,
}

impl ProviderEmbedder {
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self { provider, model: model.into() }
    }
}

#[async_trait]
impl Embedder for ProviderEmbedder {
    fn id(&self) -> String {
        format!("{}:{}", self.provider.name(), self.model)
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vector>, LLMError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .provider
            .embed(EmbeddingRequest { input: texts.to_vec(), model: Some(self.model.clone()) })
            .await?;

        let mut data = response.data;
        if data.len() != texts.len() {
            return Err(LLMError::parse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                data.len()
            )));
        }
        data.sort_by_key(|e| e.index);

        Ok(data
            .into_iter()
            .map(|e| {
                let mut v = e.embedding;
                normalize(&mut v);
                v
            })
            .collect())
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a > 0.0 && norm_b > 0.0 { dot_product / (norm_a * norm_b) } else { 0.0 }
}

fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for val in v.iter_mut() {
            *val /= norm;
        }
    }
}

/// FNV-1a; stable across platforms and releases, unlike `DefaultHasher`
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}
