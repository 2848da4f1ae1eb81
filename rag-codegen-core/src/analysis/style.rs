//! Formatting check with black

use super::CheckError;
use super::tools::{ExternalTool, ToolRunner};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StyleReport {
    pub needs_formatting: bool,
    /// Unified diff black would apply
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
}

pub async fn check(
    runner: &ToolRunner,
    tool: &ExternalTool,
    file: &Path,
) -> Result<StyleReport, CheckError> {
    let output = runner.run(tool, file).await?;
    Ok(interpret(output.code, &output.stdout))
}

/// Exit status 1 means the file would be reformatted. Other accepted codes
/// are treated as clean.
pub fn interpret(code: i32, stdout: &str) -> StyleReport {
    if code != 1 {
        return StyleReport::default();
    }

    let diff = Some(stdout.trim_end()).filter(|d| !d.is_empty()).map(|d| format!("{}\n", d));
    StyleReport { needs_formatting: true, diff }
}
