//! Security scanning with bandit

use super::tools::{ExternalTool, ToolRunner};
use super::{CheckError, SourceLocation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Bandit severity and confidence levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IssueLevel {
    Low,
    Medium,
    High,
    #[serde(other)]
    Undefined,
}

impl IssueLevel {
    /// Undefined ranks below every named level
    pub fn rank(self) -> u8 {
        match self {
            IssueLevel::Undefined => 0,
            IssueLevel::Low => 1,
            IssueLevel::Medium => 2,
            IssueLevel::High => 3,
        }
    }
}

impl PartialOrd for IssueLevel {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IssueLevel {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for IssueLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IssueLevel::Undefined => "UNDEFINED",
            IssueLevel::Low => "LOW",
            IssueLevel::Medium => "MEDIUM",
            IssueLevel::High => "HIGH",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecurityIssue {
    pub test_id: String,
    pub test_name: String,
    pub issue: String,
    pub severity: IssueLevel,
    pub confidence: IssueLevel,
    pub location: SourceLocation,
    pub more_info: Option<String>,
}

impl SecurityIssue {
    /// Worth acting on before anything else
    pub fn is_significant(&self) -> bool {
        self.severity >= IssueLevel::Medium
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SecurityReport {
    pub issues: Vec<SecurityIssue>,
}

#[derive(Debug, Deserialize)]
struct BanditOutput {
    #[serde(default)]
    errors: Vec<BanditError>,
    #[serde(default)]
    results: Vec<BanditResult>,
}

#[derive(Debug, Deserialize)]
struct BanditError {
    #[serde(default)]
    filename: String,
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Deserialize)]
struct BanditResult {
    test_id: String,
    #[serde(default)]
    test_name: String,
    issue_text: String,
    issue_severity: IssueLevel,
    issue_confidence: IssueLevel,
    line_number: usize,
    /// 0-based; missing from older bandit releases
    #[serde(default)]
    col_offset: usize,
    #[serde(default)]
    more_info: Option<String>,
}

pub async fn check(
    runner: &ToolRunner,
    tool: &ExternalTool,
    file: &Path,
) -> Result<SecurityReport, CheckError> {
    let output = runner.run(tool, file).await?;
    parse_output(&tool.name, &output.stdout)
}

/// Parse bandit's JSON report; entries under `errors` fail the check
pub fn parse_output(tool: &str, stdout: &str) -> Result<SecurityReport, CheckError> {
    let parsed: BanditOutput = serde_json::from_str(stdout.trim()).map_err(|e| {
        CheckError::InvalidOutput { tool: tool.to_string(), message: e.to_string() }
    })?;

    if !parsed.errors.is_empty() {
        return Err(CheckError::ToolReported {
            tool: tool.to_string(),
            messages: parsed
                .errors
                .into_iter()
                .map(|e| format!("{}: {}", e.filename, e.reason))
                .collect(),
        });
    }

    let issues = parsed
        .results
        .into_iter()
        .map(|r| SecurityIssue {
            test_id: r.test_id,
            test_name: r.test_name,
            issue: r.issue_text,
            severity: r.issue_severity,
            confidence: r.issue_confidence,
            location: SourceLocation { line: r.line_number, column: r.col_offset + 1 },
            more_info: r.more_info,
        })
        .collect();

    Ok(SecurityReport { issues })
}
