// Command implementations

pub mod analyze;
pub mod generate;
pub mod index;
pub mod review;
pub mod search;
pub mod shell;
pub mod tools;

use anyhow::{Context, Result, bail};
use rag_codegen_core::config::EmbedderKind;
use rag_codegen_core::llm::{AsyncOpenAIProvider, CompletionOptions, LLMProvider};
use rag_codegen_core::rag::{Embedder, HashedEmbedder, ProviderEmbedder, TextSplitter};
use rag_codegen_core::{AnalysisRunner, AppConfig, RagManager, SnippetStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Resolve configuration; `--data-dir` wins over file and environment
pub fn load_config(path: Option<&Path>, data_dir: Option<PathBuf>) -> Result<AppConfig> {
    let mut config = AppConfig::load(path).context("Failed to load configuration")?;
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    Ok(config)
}

/// Everything a generation-side command needs
pub struct AppContext {
    pub config: AppConfig,
    pub manager: RagManager,
    pub analyzer: AnalysisRunner,
}

impl AppContext {
    pub async fn build(config: AppConfig) -> Result<Self> {
        let provider: Arc<dyn LLMProvider> = Arc::new(AsyncOpenAIProvider::new(config.llm.clone()));

        let embedder: Arc<dyn Embedder> = match config.retrieval.embedder {
            EmbedderKind::Hashed => Arc::new(HashedEmbedder::default()),
            EmbedderKind::OpenAI => {
                Arc::new(ProviderEmbedder::new(provider.clone(), config.llm.embedding_model.clone()))
            }
        };
        debug!("Using embedder {}", embedder.id());

        let splitter =
            TextSplitter::new(config.retrieval.chunk_size, config.retrieval.chunk_overlap);
        let store_path = config.store_path();
        let store = match SnippetStore::open(&store_path, embedder, splitter).await {
            Ok(store) => store,
            Err(e) if e.is_configuration() => bail!("Configuration error: {}", e),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to open snippet store {}", store_path.display())
                });
            }
        };

        let manager = RagManager::new(
            provider,
            Arc::new(store),
            config.retrieval.top_k,
            CompletionOptions::default(),
        );
        let analyzer = AnalysisRunner::new(&config.analysis);

        Ok(Self { config, manager, analyzer })
    }
}
