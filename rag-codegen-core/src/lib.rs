//! Core functionality for rag-codegen
//!
//! This crate contains the business logic behind the `rag-codegen` tool:
//! configuration loading, the LLM generation client, the snippet retrieval
//! store used for retrieval-augmented prompting, and the analysis runner that
//! reviews Python source files with external checkers.

pub mod analysis;
pub mod config;
pub mod llm;
pub mod rag;
pub mod utils;

pub use analysis::{AnalysisReport, AnalysisRunner};
pub use config::{AppConfig, ConfigError};
pub use rag::{RagError, RagManager, SnippetStore};
