//! Static analysis of Python source
//!
//! Three external checkers (security scanner, linter, formatter) plus an
//! in-process structural pass. Each check reports its own outcome; a failing
//! check never hides the result of another.

pub mod quality;
pub mod report;
pub mod runner;
pub mod security;
pub mod structure;
pub mod style;
pub mod tools;

pub use quality::{MessageType, QualityMessage, QualityReport};
pub use runner::AnalysisRunner;
pub use security::{IssueLevel, SecurityIssue, SecurityReport};
pub use structure::{ClassInfo, Complexity, FunctionInfo, StructureSummary};
pub use style::StyleReport;
pub use tools::{DiscoveryReport, ExternalTool, ToolCommand, ToolRunner};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// The four checks run on every file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckKind {
    Security,
    Quality,
    Style,
    Structure,
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CheckKind::Security => "security",
            CheckKind::Quality => "quality",
            CheckKind::Style => "style",
            CheckKind::Structure => "structure",
        };
        f.pad(name)
    }
}

/// 1-based line and column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

/// Why a single check produced no result
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum CheckError {
    #[error("{tool} is not installed{}", install_suffix(.install_hint))]
    ToolUnavailable { tool: String, install_hint: Option<String> },

    #[error("{tool} failed{}: {stderr}", exit_suffix(.code))]
    ToolFailed { tool: String, code: Option<i32>, stderr: String },

    #[error("{tool} timed out after {duration:?}")]
    Timeout { tool: String, duration: Duration },

    #[error("Could not parse {tool} output: {message}")]
    InvalidOutput { tool: String, message: String },

    #[error("{tool} reported errors: {}", .messages.join("; "))]
    ToolReported { tool: String, messages: Vec<String> },

    #[error("Syntax error at line {line}, column {column}")]
    Syntax { line: usize, column: usize },

    #[error("Failed to read {path}: {message}")]
    Io { path: PathBuf, message: String },
}

fn install_suffix(hint: &Option<String>) -> String {
    hint.as_ref().map(|h| format!(" (install with `{}`)", h)).unwrap_or_default()
}

fn exit_suffix(code: &Option<i32>) -> String {
    code.map(|c| format!(" with exit code {}", c)).unwrap_or_default()
}

/// Result of one check
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "result", rename_all = "snake_case")]
pub enum CheckOutcome<T> {
    Completed(T),
    Failed(CheckError),
}

impl<T> CheckOutcome<T> {
    pub fn completed(&self) -> Option<&T> {
        match self {
            CheckOutcome::Completed(value) => Some(value),
            CheckOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&CheckError> {
        match self {
            CheckOutcome::Completed(_) => None,
            CheckOutcome::Failed(err) => Some(err),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, CheckOutcome::Failed(_))
    }
}

impl<T> From<Result<T, CheckError>> for CheckOutcome<T> {
    fn from(result: Result<T, CheckError>) -> Self {
        match result {
            Ok(value) => CheckOutcome::Completed(value),
            Err(err) => CheckOutcome::Failed(err),
        }
    }
}

/// Outcome of all checks on one file
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub file: PathBuf,
    pub security: CheckOutcome<SecurityReport>,
    pub quality: CheckOutcome<QualityReport>,
    pub style: CheckOutcome<StyleReport>,
    pub structure: CheckOutcome<StructureSummary>,
    pub suggestions: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl AnalysisReport {
    pub fn new(
        file: PathBuf,
        security: CheckOutcome<SecurityReport>,
        quality: CheckOutcome<QualityReport>,
        style: CheckOutcome<StyleReport>,
        structure: CheckOutcome<StructureSummary>,
    ) -> Self {
        let mut report = Self {
            file,
            security,
            quality,
            style,
            structure,
            suggestions: Vec::new(),
            started_at: Utc::now(),
            duration_ms: 0,
        };
        report.suggestions = report::improvement_suggestions(&report);
        report
    }

    /// Failed checks in report order
    pub fn failures(&self) -> Vec<(CheckKind, &CheckError)> {
        [
            (CheckKind::Quality, self.quality.failure()),
            (CheckKind::Security, self.security.failure()),
            (CheckKind::Style, self.style.failure()),
            (CheckKind::Structure, self.structure.failure()),
        ]
        .into_iter()
        .filter_map(|(kind, failure)| failure.map(|f| (kind, f)))
        .collect()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures().is_empty()
    }

    pub fn render_text(&self) -> String {
        report::render_text(self)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_from_result() {
        let ok: CheckOutcome<u8> = Ok(3).into();
        assert_eq!(ok.completed(), Some(&3));
        assert!(!ok.is_failed());

        let failed: CheckOutcome<u8> = Err(CheckError::Syntax { line: 2, column: 5 }).into();
        assert!(failed.is_failed());
        assert_eq!(failed.failure(), Some(&CheckError::Syntax { line: 2, column: 5 }));
    }

    #[test]
    fn test_error_messages() {
        let missing = CheckError::ToolUnavailable {
            tool: "bandit".to_string(),
            install_hint: Some("pip install bandit".to_string()),
        };
        assert_eq!(missing.to_string(), "bandit is not installed (install with `pip install bandit`)");

        let failed = CheckError::ToolFailed {
            tool: "black".to_string(),
            code: Some(123),
            stderr: "error: cannot format".to_string(),
        };
        assert_eq!(failed.to_string(), "black failed with exit code 123: error: cannot format");
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome: CheckOutcome<StyleReport> =
            CheckOutcome::Failed(CheckError::Syntax { line: 1, column: 4 });
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["result"]["error"], "syntax");
        assert_eq!(json["result"]["line"], 1);
    }

    #[test]
    fn test_failures_keep_report_order() {
        let report = AnalysisReport::new(
            PathBuf::from("x.py"),
            CheckOutcome::Failed(CheckError::ToolUnavailable {
                tool: "bandit".to_string(),
                install_hint: None,
            }),
            CheckOutcome::Completed(QualityReport::default()),
            CheckOutcome::Completed(StyleReport::default()),
            CheckOutcome::Failed(CheckError::Syntax { line: 1, column: 1 }),
        );

        let kinds: Vec<CheckKind> = report.failures().into_iter().map(|(k, _)| k).collect();
        assert_eq!(kinds, vec![CheckKind::Security, CheckKind::Structure]);
        assert!(report.has_failures());
    }
}
