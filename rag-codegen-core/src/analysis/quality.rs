//! Lint checks with pylint

use super::tools::{ExternalTool, ToolRunner};
use super::{CheckError, SourceLocation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Pylint message category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Fatal,
    Error,
    Warning,
    Refactor,
    Convention,
    Info,
    #[serde(other)]
    Other,
}

impl MessageType {
    /// Errors and warnings, as opposed to style advice
    pub fn is_problem(self) -> bool {
        matches!(self, MessageType::Fatal | MessageType::Error | MessageType::Warning)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageType::Fatal => "fatal",
            MessageType::Error => "error",
            MessageType::Warning => "warning",
            MessageType::Refactor => "refactor",
            MessageType::Convention => "convention",
            MessageType::Info => "info",
            MessageType::Other => "other",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMessage {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub symbol: String,
    #[serde(rename = "message-id")]
    pub message_id: String,
    pub message: String,
    pub line: usize,
    /// 0-based in pylint output
    pub column: usize,
    #[serde(default)]
    pub obj: String,
}

impl QualityMessage {
    pub fn location(&self) -> SourceLocation {
        SourceLocation { line: self.line, column: self.column + 1 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QualityReport {
    pub messages: Vec<QualityMessage>,
}

pub async fn check(
    runner: &ToolRunner,
    tool: &ExternalTool,
    file: &Path,
) -> Result<QualityReport, CheckError> {
    let output = runner.run(tool, file).await?;
    parse_output(&tool.name, &output.stdout)
}

/// Parse pylint's JSON message list. Some releases print nothing at all
/// when there are no messages.
pub fn parse_output(tool: &str, stdout: &str) -> Result<QualityReport, CheckError> {
    let stdout = stdout.trim();
    if stdout.is_empty() {
        return Ok(QualityReport::default());
    }

    let messages: Vec<QualityMessage> = serde_json::from_str(stdout).map_err(|e| {
        CheckError::InvalidOutput { tool: tool.to_string(), message: e.to_string() }
    })?;

    Ok(QualityReport { messages })
}
