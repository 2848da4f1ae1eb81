//! Configuration system
//!
//! Settings are resolved once at start-up in this order: built-in defaults,
//! an optional TOML file, a `.env` file plus the process environment, and
//! finally whatever the CLI overrides. The result is read-only afterwards.

use crate::analysis::tools::{ExitCodes, ExternalTool, ToolCommand};
use crate::analysis::CheckKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {field}: {message}")]
    Invalid { field: String, message: String },

    #[error("API key is not configured; set OPENAI_API_KEY in the environment or a .env file")]
    MissingCredential,

    #[error("API key is malformed: {reason}")]
    InvalidCredential { reason: String },
}

impl ConfigError {
    fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid { field: field.into(), message: message.into() }
    }
}

/// Main configuration for rag-codegen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the snippet store
    pub data_dir: PathBuf,

    /// Completion endpoint settings
    pub llm: LlmSettings,

    /// Retrieval store settings
    pub retrieval: RetrievalSettings,

    /// External checker settings
    pub analysis: AnalysisSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            llm: LlmSettings::default(),
            retrieval: RetrievalSettings::default(),
            analysis: AnalysisSettings::default(),
        }
    }
}

/// Settings for the hosted completion endpoint
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// API credential; never serialized back out
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Alternative base URL for OpenAI-compatible endpoints
    pub api_base: Option<String>,

    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout_secs: u64,

    /// Model used when the OpenAI embedder is selected
    pub embedding_model: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: None,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.0,
            max_tokens: 2048,
            request_timeout_secs: 120,
            embedding_model: "text-embedding-3-small".to_string(),
        }
    }
}

impl fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("embedding_model", &self.embedding_model)
            .finish()
    }
}

impl LlmSettings {
    /// Return the API key, or the reason it cannot be used
    pub fn credential(&self) -> Result<&str, ConfigError> {
        let key = match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key,
            _ => return Err(ConfigError::MissingCredential),
        };

        if key.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ConfigError::InvalidCredential {
                reason: "contains whitespace or control characters".to_string(),
            });
        }

        Ok(key)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Which embedding scheme the snippet store uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
    /// Offline feature hashing
    Hashed,
    /// Remote embeddings endpoint
    OpenAI,
}

impl std::str::FromStr for EmbedderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hashed" | "hash" | "local" => Ok(Self::Hashed),
            "openai" => Ok(Self::OpenAI),
            other => Err(ConfigError::invalid(
                "retrieval.embedder",
                format!("unknown embedder '{}', expected 'hashed' or 'openai'", other),
            )),
        }
    }
}

/// Retrieval store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of snippets placed in the prompt context
    pub top_k: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub embedder: EmbedderKind,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { top_k: 4, chunk_size: 1000, chunk_overlap: 200, embedder: EmbedderKind::Hashed }
    }
}

/// External checker settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub tool_timeout_secs: u64,
    pub security: ToolCommand,
    pub quality: ToolCommand,
    pub style: ToolCommand,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            tool_timeout_secs: 60,
            security: ToolCommand::new("bandit", ["-f", "json", "-q"]),
            quality: ToolCommand::new("pylint", ["--output-format=json", "--score=n"]),
            style: ToolCommand::new("black", ["--check", "--diff", "--quiet"]),
        }
    }
}

impl AnalysisSettings {
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    /// Build the security scanner definition
    pub fn security_tool(&self) -> ExternalTool {
        ExternalTool {
            name: "bandit".to_string(),
            kind: CheckKind::Security,
            command: self.security.clone(),
            exit_codes: ExitCodes::OneOf(vec![0, 1]),
            install_hint: Some("pip install bandit".to_string()),
        }
    }

    /// Build the lint tool definition
    pub fn quality_tool(&self) -> ExternalTool {
        ExternalTool {
            name: "pylint".to_string(),
            kind: CheckKind::Quality,
            command: self.quality.clone(),
            // pylint reports message categories as a bit mask; 32 is a usage error
            exit_codes: ExitCodes::Below(32),
            install_hint: Some("pip install pylint".to_string()),
        }
    }

    /// Build the formatter definition
    pub fn style_tool(&self) -> ExternalTool {
        ExternalTool {
            name: "black".to_string(),
            kind: CheckKind::Style,
            command: self.style.clone(),
            exit_codes: ExitCodes::OneOf(vec![0, 1]),
            install_hint: Some("pip install black".to_string()),
        }
    }
}

impl AppConfig {
    /// Default location of the persisted snippet store
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("snippets.json")
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;

        toml::from_str(&content)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Resolve configuration from an optional file plus `.env` and the environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Ok(env_file) = dotenv::dotenv() {
            tracing::debug!("Loaded environment from {}", env_file.display());
        }

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;

        tracing::debug!("Resolved configuration: {:?}", config);
        Ok(config)
    }

    /// Apply overrides from a key/value source such as the process environment
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(base) = lookup("OPENAI_API_BASE").or_else(|| lookup("OPENAI_BASE_URL")) {
            self.llm.api_base = Some(base);
        }
        if let Some(model) = lookup("OPENAI_MODEL") {
            self.llm.model = model;
        }
        if let Some(value) = lookup("OPENAI_TEMPERATURE") {
            self.llm.temperature = parse_value("OPENAI_TEMPERATURE", &value)?;
        }
        if let Some(value) = lookup("OPENAI_MAX_TOKENS") {
            self.llm.max_tokens = parse_value("OPENAI_MAX_TOKENS", &value)?;
        }
        if let Some(dir) = lookup("RAG_CODEGEN_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(value) = lookup("RAG_CODEGEN_TOP_K") {
            self.retrieval.top_k = parse_value("RAG_CODEGEN_TOP_K", &value)?;
        }
        if let Some(value) = lookup("RAG_CODEGEN_EMBEDDER") {
            self.retrieval.embedder = value.parse()?;
        }

        Ok(())
    }

    /// Check value ranges; the credential is checked lazily by the generation client
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::invalid("llm.temperature", "must be between 0.0 and 2.0"));
        }
        if self.llm.max_tokens == 0 {
            return Err(ConfigError::invalid("llm.max_tokens", "must be greater than zero"));
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::invalid("llm.model", "must not be empty"));
        }
        if self.retrieval.top_k == 0 {
            return Err(ConfigError::invalid("retrieval.top_k", "must be greater than zero"));
        }
        if self.retrieval.chunk_size == 0 {
            return Err(ConfigError::invalid("retrieval.chunk_size", "must be greater than zero"));
        }
        if self.retrieval.chunk_overlap >= self.retrieval.chunk_size {
            return Err(ConfigError::invalid(
                "retrieval.chunk_overlap",
                "must be smaller than retrieval.chunk_size",
            ));
        }
        for (field, command) in [
            ("analysis.security", &self.analysis.security),
            ("analysis.quality", &self.analysis.quality),
            ("analysis.style", &self.analysis.style),
        ] {
            if command.program.trim().is_empty() {
                return Err(ConfigError::invalid(field, "program must not be empty"));
            }
        }

        Ok(())
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::invalid(key, format!("'{}': {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.temperature, 0.0);
        assert_eq!(config.retrieval.top_k, 4);
        assert_eq!(config.retrieval.chunk_size, 1000);
        assert_eq!(config.retrieval.chunk_overlap, 200);
        assert_eq!(config.store_path(), PathBuf::from("data").join("snippets.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_env(lookup_from(&[
                ("OPENAI_API_KEY", "sk-test"),
                ("OPENAI_MODEL", "gpt-4o"),
                ("OPENAI_TEMPERATURE", "0.5"),
                ("OPENAI_MAX_TOKENS", "512"),
                ("OPENAI_BASE_URL", "http://localhost:8080/v1"),
                ("RAG_CODEGEN_TOP_K", "7"),
                ("RAG_CODEGEN_EMBEDDER", "openai"),
            ]))
            .unwrap();

        assert_eq!(config.llm.credential().unwrap(), "sk-test");
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.temperature, 0.5);
        assert_eq!(config.llm.max_tokens, 512);
        assert_eq!(config.llm.api_base.as_deref(), Some("http://localhost:8080/v1"));
        assert_eq!(config.retrieval.top_k, 7);
        assert_eq!(config.retrieval.embedder, EmbedderKind::OpenAI);
    }

    #[test]
    fn test_unparseable_env_value_names_key() {
        let mut config = AppConfig::default();
        let err = config.apply_env(lookup_from(&[("OPENAI_MAX_TOKENS", "lots")])).unwrap_err();
        assert!(err.to_string().contains("OPENAI_MAX_TOKENS"));
    }

    #[test]
    fn test_validation_rejects_out_of_range_values() {
        let mut config = AppConfig::default();
        config.llm.temperature = 3.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));

        let mut config = AppConfig::default();
        config.retrieval.chunk_overlap = config.retrieval.chunk_size;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_credential_checks() {
        let mut settings = LlmSettings::default();
        assert!(matches!(settings.credential(), Err(ConfigError::MissingCredential)));

        settings.api_key = Some("   ".to_string());
        assert!(matches!(settings.credential(), Err(ConfigError::MissingCredential)));

        settings.api_key = Some("sk-abc def".to_string());
        assert!(matches!(settings.credential(), Err(ConfigError::InvalidCredential { .. })));

        settings.api_key = Some(" sk-abc ".to_string());
        assert_eq!(settings.credential().unwrap(), "sk-abc");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let settings = LlmSettings { api_key: Some("sk-secret".to_string()), ..Default::default() };
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_from_file_merges_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rag-codegen.toml");
        std::fs::write(
            &path,
            r#"
data_dir = "/tmp/snippets"

[llm]
model = "gpt-4o"

[analysis.security]
program = "bandit3"
args = ["-f", "json"]
"#,
        )
        .unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/snippets"));
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.max_tokens, 2048);
        assert_eq!(config.analysis.security.program, "bandit3");
        assert_eq!(config.analysis.quality.program, "pylint");
    }

    #[test]
    fn test_from_file_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[llm\nmodel = ").unwrap();
        assert!(matches!(AppConfig::from_file(&path), Err(ConfigError::Parse { .. })));
    }
}
