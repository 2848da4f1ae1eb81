//! Persistent snippet store
//!
//! Snippets keep their full text plus one embedding per chunk. A query
//! scores each snippet by its best-matching chunk; ties keep insertion order
//! so repeated queries over an unchanged store return the same sequence.

use super::embeddings::{Embedder, Vector, cosine_similarity};
use super::splitter::TextSplitter;
use crate::llm::LLMError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

const STORE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Snippet store I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Snippet store file {path} is corrupt: {source}")]
    Serde {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to embed snippet text: {0}")]
    Embedding(#[from] LLMError),

    #[error("Refusing to store an empty snippet")]
    EmptySnippet,
}

impl StoreError {
    /// The embedder could not run because of missing or invalid settings
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Embedding(e) if e.is_configuration())
    }
}

/// Where a snippet came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SnippetOrigin {
    /// Output of a generation request
    Generated { requirement: String },
    /// Source file added through indexing
    Indexed { path: PathBuf },
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnippetMetadata {
    pub origin: SnippetOrigin,
    pub language: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

impl SnippetMetadata {
    pub fn new(origin: SnippetOrigin) -> Self {
        Self { origin, language: None, created_at: Utc::now(), tags: BTreeMap::new() }
    }

    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// A piece of a snippet's text and its vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkEmbedding {
    pub text: String,
    pub embedding: Vector,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    pub id: Uuid,
    pub text: String,
    pub content_hash: String,
    pub metadata: SnippetMetadata,
    pub chunks: Vec<ChunkEmbedding>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredSnippet {
    pub snippet: Snippet,
    pub score: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    embedder: String,
    snippets: Vec<Snippet>,
}

/// Embedding-indexed collection of code snippets
pub struct SnippetStore {
    snippets: RwLock<Vec<Snippet>>,
    embedder: Arc<dyn Embedder>,
    splitter: TextSplitter,
    storage_path: Option<PathBuf>,
}

impl SnippetStore {
    /// A store that lives only in memory
    pub fn in_memory(embedder: Arc<dyn Embedder>, splitter: TextSplitter) -> Self {
        Self { snippets: RwLock::new(Vec::new()), embedder, splitter, storage_path: None }
    }

    /// Open (or create on first write) a store persisted at `path`.
    ///
    /// Snippets embedded with a different embedder are re-embedded from their text.
    pub async fn open(
        path: impl Into<PathBuf>,
        embedder: Arc<dyn Embedder>,
        splitter: TextSplitter,
    ) -> Result<Self, StoreError> {
        let path = path.into();
        let store = Self {
            snippets: RwLock::new(Vec::new()),
            embedder,
            splitter,
            storage_path: Some(path.clone()),
        };

        if !tokio::fs::try_exists(&path).await.map_err(|source| io_error(&path, source))? {
            debug!("No snippet store at {}, starting empty", path.display());
            return Ok(store);
        }

        let content =
            tokio::fs::read_to_string(&path).await.map_err(|source| io_error(&path, source))?;
        let file: StoreFile = serde_json::from_str(&content)
            .map_err(|source| StoreError::Serde { path: path.clone(), source })?;

        let mut snippets = file.snippets;
        let embedder_id = store.embedder.id();
        if file.embedder != embedder_id {
            warn!(
                "Snippet store was built with embedder '{}', re-embedding {} snippets with '{}'",
                file.embedder,
                snippets.len(),
                embedder_id
            );
            for snippet in &mut snippets {
                snippet.chunks = store.embed_chunks(&snippet.text).await?;
            }
            let mut guard = store.snippets.write().await;
            *guard = snippets;
            store.persist(&guard).await?;
        } else {
            *store.snippets.write().await = snippets;
        }

        info!("Loaded {} snippets from {}", store.len().await, path.display());
        Ok(store)
    }

    pub fn storage_path(&self) -> Option<&Path> {
        self.storage_path.as_deref()
    }

    pub fn embedder_id(&self) -> String {
        self.embedder.id()
    }

    /// Embed and append a snippet, persisting the store afterwards
    pub async fn add(&self, text: &str, metadata: SnippetMetadata) -> Result<Snippet, StoreError> {
        if text.trim().is_empty() {
            return Err(StoreError::EmptySnippet);
        }

        let chunks = self.embed_chunks(text).await?;
        let snippet = Snippet {
            id: Uuid::new_v4(),
            text: text.to_string(),
            content_hash: hash_content(text),
            metadata,
            chunks,
        };

        // Hold the write lock through persistence so the file never lags memory
        let mut snippets = self.snippets.write().await;
        snippets.push(snippet.clone());
        if let Err(e) = self.persist(&snippets).await {
            snippets.pop();
            return Err(e);
        }

        debug!("Stored snippet {} ({} chunks)", snippet.id, snippet.chunks.len());
        Ok(snippet)
    }

    /// The `k` snippets most similar to `text`, best first
    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<ScoredSnippet>, StoreError> {
        if k == 0 || self.is_empty().await {
            return Ok(Vec::new());
        }

        let query = self
            .embedder
            .embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| LLMError::parse("embedder returned no vector for the query"))?;

        let snippets = self.snippets.read().await;
        let mut scored: Vec<(usize, f32)> = snippets
            .iter()
            .enumerate()
            .map(|(i, snippet)| (i, best_chunk_score(&query, &snippet.chunks)))
            .collect();

        // Stable sort: equal scores keep insertion order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(i, score)| ScoredSnippet { snippet: snippets[i].clone(), score })
            .collect())
    }

    pub async fn len(&self) -> usize {
        self.snippets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.snippets.read().await.is_empty()
    }

    /// All snippets in insertion order
    pub async fn snippets(&self) -> Vec<Snippet> {
        self.snippets.read().await.clone()
    }

    pub async fn get(&self, id: Uuid) -> Option<Snippet> {
        self.snippets.read().await.iter().find(|s| s.id == id).cloned()
    }

    async fn embed_chunks(&self, text: &str) -> Result<Vec<ChunkEmbedding>, StoreError> {
        let mut pieces = self.splitter.split(text);
        if pieces.is_empty() {
            pieces.push(text.trim().to_string());
        }

        let vectors = self.embedder.embed(&pieces).await?;
        if vectors.len() != pieces.len() {
            return Err(LLMError::parse(format!(
                "embedder returned {} vectors for {} chunks",
                vectors.len(),
                pieces.len()
            ))
            .into());
        }

        Ok(pieces
            .into_iter()
            .zip(vectors)
            .map(|(text, embedding)| ChunkEmbedding { text, embedding })
            .collect())
    }

    async fn persist(&self, snippets: &[Snippet]) -> Result<(), StoreError> {
        let Some(path) = &self.storage_path else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|source| io_error(parent, source))?;
        }

        let file = StoreFile {
            version: STORE_FORMAT_VERSION,
            embedder: self.embedder.id(),
            snippets: snippets.to_vec(),
        };
        let content = serde_json::to_string_pretty(&file)
            .map_err(|source| StoreError::Serde { path: path.clone(), source })?;

        // Write to a sibling file and rename so readers never see a partial store
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, content).await.map_err(|source| io_error(&tmp_path, source))?;
        tokio::fs::rename(&tmp_path, path).await.map_err(|source| io_error(path, source))?;

        Ok(())
    }
}

fn best_chunk_score(query: &[f32], chunks: &[ChunkEmbedding]) -> f32 {
    chunks
        .iter()
        .map(|chunk| cosine_similarity(query, &chunk.embedding))
        .fold(f32::NEG_INFINITY, f32::max)
        .max(-1.0)
}

fn hash_content(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io { path: path.to_path_buf(), source }
}
