//! Retrieval-augmented generation and review

use super::store::{ScoredSnippet, SnippetMetadata, SnippetOrigin, SnippetStore, StoreError};
use crate::llm::prompts;
use crate::llm::types::Usage;
use crate::llm::{CompletionOptions, LLMError, LLMProvider};
use crate::utils;
use regex_utils::language::LanguageMatcher;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;
use walkdir::{DirEntry, WalkDir};

const SKIPPED_DIRS: [&str; 3] = ["__pycache__", "target", "node_modules"];

#[derive(Debug, Error)]
pub enum RagError {
    #[error("Requirement is empty")]
    EmptyRequirement,

    #[error("Nothing to process: input is empty")]
    EmptyInput,

    #[error("{0}")]
    Configuration(LLMError),

    #[error("Generation failed: {0}")]
    Generation(LLMError),

    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error(transparent)]
    Store(StoreError),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RagError {
    fn from_llm(err: LLMError) -> Self {
        if err.is_configuration() { Self::Configuration(err) } else { Self::Generation(err) }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

impl From<StoreError> for RagError {
    fn from(err: StoreError) -> Self {
        // A provider-backed embedder hits the same credential checks as generation
        match err {
            StoreError::Embedding(e) if e.is_configuration() => Self::Configuration(e),
            other => Self::Store(other),
        }
    }
}

/// Result of a generation request
#[derive(Debug, Clone, Serialize)]
pub struct Generation {
    pub code: String,
    /// Snippets placed in the prompt, best first
    pub context: Vec<ScoredSnippet>,
    /// Id of the snippet written back to the store, if the write succeeded
    pub stored: Option<Uuid>,
    pub model: String,
    pub usage: Option<Usage>,
}

/// Result of an LLM-backed review
#[derive(Debug, Clone, Serialize)]
pub struct CodeReview {
    pub review: String,
    pub context: Vec<ScoredSnippet>,
    pub model: String,
}

/// Summary of an indexing run
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexReport {
    pub added: Vec<PathBuf>,
    pub skipped: Vec<(PathBuf, String)>,
}

/// Ties the snippet store to a completion provider
pub struct RagManager {
    provider: Arc<dyn LLMProvider>,
    store: Arc<SnippetStore>,
    top_k: usize,
    options: CompletionOptions,
    languages: LanguageMatcher,
}

impl RagManager {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        store: Arc<SnippetStore>,
        top_k: usize,
        options: CompletionOptions,
    ) -> Self {
        Self { provider, store, top_k, options, languages: LanguageMatcher::new() }
    }

    pub fn store(&self) -> &Arc<SnippetStore> {
        &self.store
    }

    pub fn provider(&self) -> &Arc<dyn LLMProvider> {
        &self.provider
    }

    /// Generate code for a requirement using related stored snippets as context.
    ///
    /// The generated code is written back to the store; a failed write is
    /// logged and reported through `Generation::stored`.
    pub async fn generate_code(&self, requirement: &str) -> Result<Generation, RagError> {
        let requirement = requirement.trim();
        if requirement.is_empty() {
            return Err(RagError::EmptyRequirement);
        }

        let context = self.retrieve(requirement).await?;
        let messages = prompts::generation_messages(
            requirement,
            &prompts::format_context(context.iter().map(|s| s.snippet.text.as_str())),
        );

        info!("Generating code with {} context snippets", context.len());
        let response = self
            .provider
            .complete(messages, self.options.clone())
            .await
            .map_err(RagError::from_llm)?;

        let code = response.text().unwrap_or_default().to_string();
        if code.trim().is_empty() {
            return Err(RagError::EmptyResponse);
        }

        let language = self.detect_language(requirement, &code);
        let metadata = SnippetMetadata::new(SnippetOrigin::Generated {
            requirement: requirement.to_string(),
        })
        .with_language(language);

        let stored = match self.store.add(&code, metadata).await {
            Ok(snippet) => Some(snippet.id),
            Err(e) => {
                warn!("Generated code was not saved to the snippet store: {}", e);
                None
            }
        };

        Ok(Generation { code, context, stored, model: response.model, usage: response.usage })
    }

    /// Ask the model to review code, with related snippets as context
    pub async fn review_code(&self, code: &str) -> Result<CodeReview, RagError> {
        if code.trim().is_empty() {
            return Err(RagError::EmptyInput);
        }

        let context = self.retrieve(code).await?;
        let messages = prompts::review_messages(
            code,
            &prompts::format_context(context.iter().map(|s| s.snippet.text.as_str())),
        );

        let response = self
            .provider
            .complete(messages, self.options.clone())
            .await
            .map_err(RagError::from_llm)?;

        let review = response.text().unwrap_or_default().trim().to_string();
        if review.is_empty() {
            return Err(RagError::EmptyResponse);
        }

        Ok(CodeReview { review, context, model: response.model })
    }

    pub async fn search_similar_code(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredSnippet>, RagError> {
        if query.trim().is_empty() {
            return Err(RagError::EmptyInput);
        }
        Ok(self.store.query(query, k).await?)
    }

    /// Store a snippet directly
    pub async fn add_code(&self, code: &str, metadata: SnippetMetadata) -> Result<Uuid, RagError> {
        if code.trim().is_empty() {
            return Err(RagError::EmptyInput);
        }
        let snippet = self.store.add(code, metadata).await?;
        Ok(snippet.id)
    }

    /// Add every Python file under the given files and directories.
    ///
    /// Unreadable or empty files are skipped and listed in the report; a store
    /// failure aborts the run.
    pub async fn index_paths(&self, paths: &[PathBuf]) -> Result<IndexReport, RagError> {
        let mut report = IndexReport::default();

        for root in paths {
            if !root.exists() {
                return Err(RagError::Io {
                    path: root.clone(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such path"),
                });
            }

            for file in python_files(root) {
                let code = match tokio::fs::read_to_string(&file).await {
                    Ok(code) => code,
                    Err(e) => {
                        debug!("Skipping {}: {}", file.display(), e);
                        report.skipped.push((file, e.to_string()));
                        continue;
                    }
                };

                if code.trim().is_empty() {
                    report.skipped.push((file, "empty file".to_string()));
                    continue;
                }

                let metadata = SnippetMetadata::new(SnippetOrigin::Indexed { path: file.clone() })
                    .with_language(utils::detect_language_from_path(&file));
                self.store.add(&code, metadata).await?;
                report.added.push(file);
            }
        }

        info!("Indexed {} files ({} skipped)", report.added.len(), report.skipped.len());
        Ok(report)
    }

    async fn retrieve(&self, text: &str) -> Result<Vec<ScoredSnippet>, RagError> {
        let context = self.store.query(text, self.top_k).await?;
        debug!(
            "Retrieved {} snippets (best score {:?})",
            context.len(),
            context.first().map(|s| s.score)
        );
        Ok(context)
    }

    fn detect_language(&self, requirement: &str, code: &str) -> Option<String> {
        utils::extract_code_blocks(code)
            .into_iter()
            .find_map(|block| block.language)
            .or_else(|| self.languages.detect(requirement))
    }
}

fn python_files(root: &Path) -> Vec<PathBuf> {
    if root.is_file() {
        return if utils::is_python_file(root) { vec![root.to_path_buf()] } else { Vec::new() };
    }

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped(entry))
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && utils::is_python_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

fn is_skipped(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || (entry.file_type().is_dir() && SKIPPED_DIRS.contains(&name.as_ref()))
}
