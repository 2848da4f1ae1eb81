//! Retrieval store and retrieval-augmented generation
//!
//! Generated code is written back to the store, so later requests see what
//! earlier ones produced.

pub mod embeddings;
pub mod manager;
pub mod splitter;
pub mod store;

#[cfg(test)]
mod tests;

pub use embeddings::{Embedder, HashedEmbedder, ProviderEmbedder};
pub use manager::{CodeReview, Generation, IndexReport, RagError, RagManager};
pub use splitter::TextSplitter;
pub use store::{
    ChunkEmbedding, ScoredSnippet, Snippet, SnippetMetadata, SnippetOrigin, SnippetStore,
    StoreError,
};
