//! External tool discovery and execution
//!
//! Checkers are plain command lines with the target file appended as the
//! last argument. Each run is bounded by a timeout and the child is killed
//! if the run is abandoned.

use super::{CheckError, CheckKind};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Program and leading arguments of a checker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { program: program.into(), args: args.into_iter().map(Into::into).collect() }
    }
}

/// Exit codes that still mean the tool did its job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitCodes {
    OneOf(Vec<i32>),
    Below(i32),
}

impl ExitCodes {
    pub fn accepts(&self, code: i32) -> bool {
        match self {
            ExitCodes::OneOf(codes) => codes.contains(&code),
            ExitCodes::Below(limit) => (0..*limit).contains(&code),
        }
    }
}

/// A checker the runner knows how to invoke
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalTool {
    pub name: String,
    pub kind: CheckKind,
    pub command: ToolCommand,
    pub exit_codes: ExitCodes,
    /// Installation instructions if tool is missing
    pub install_hint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AvailableTool {
    pub name: String,
    pub kind: CheckKind,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MissingTool {
    pub name: String,
    pub kind: CheckKind,
    pub install_hint: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DiscoveryReport {
    pub available: Vec<AvailableTool>,
    pub missing: Vec<MissingTool>,
}

impl DiscoveryReport {
    pub fn summary(&self) -> String {
        format!(
            "{} of {} analysis tools available",
            self.available.len(),
            self.available.len() + self.missing.len()
        )
    }
}

/// Runs external checkers as child processes
#[derive(Debug, Clone)]
pub struct ToolRunner {
    timeout: Duration,
}

impl ToolRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Run `tool` on `file`, rejecting exit codes the tool does not accept
    pub async fn run(&self, tool: &ExternalTool, file: &Path) -> Result<ToolOutput, CheckError> {
        let mut command = Command::new(&tool.command.program);
        command.args(&tool.command.args).arg(file);

        debug!("Running {} on {}", tool.name, file.display());
        let output = self.execute(tool, command).await?;

        if !tool.exit_codes.accepts(output.code) {
            return Err(CheckError::ToolFailed {
                tool: tool.name.clone(),
                code: Some(output.code),
                stderr: output.stderr.trim().to_string(),
            });
        }

        Ok(output)
    }

    /// Check which tools respond to `--version`
    pub async fn discover(&self, tools: &[ExternalTool]) -> DiscoveryReport {
        let mut report = DiscoveryReport::default();

        for tool in tools {
            let mut command = Command::new(&tool.command.program);
            command.arg("--version");

            match self.execute(tool, command).await {
                Ok(output) if output.code == 0 => {
                    let version = output
                        .stdout
                        .lines()
                        .chain(output.stderr.lines())
                        .map(str::trim)
                        .find(|line| !line.is_empty())
                        .map(String::from);
                    report.available.push(AvailableTool {
                        name: tool.name.clone(),
                        kind: tool.kind,
                        version,
                    });
                }
                result => {
                    if let Err(e) = result {
                        debug!("{} unavailable: {}", tool.name, e);
                    }
                    report.missing.push(MissingTool {
                        name: tool.name.clone(),
                        kind: tool.kind,
                        install_hint: tool.install_hint.clone(),
                    });
                }
            }
        }

        report
    }

    async fn execute(
        &self,
        tool: &ExternalTool,
        mut command: Command,
    ) -> Result<ToolOutput, CheckError> {
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command.spawn().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                CheckError::ToolUnavailable {
                    tool: tool.name.clone(),
                    install_hint: tool.install_hint.clone(),
                }
            } else {
                CheckError::ToolFailed { tool: tool.name.clone(), code: None, stderr: e.to_string() }
            }
        })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(CheckError::ToolFailed {
                    tool: tool.name.clone(),
                    code: None,
                    stderr: e.to_string(),
                });
            }
            Err(_) => {
                warn!("{} did not finish within {:?}", tool.name, self.timeout);
                return Err(CheckError::Timeout { tool: tool.name.clone(), duration: self.timeout });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        // Killed by a signal
        let Some(code) = output.status.code() else {
            return Err(CheckError::ToolFailed {
                tool: tool.name.clone(),
                code: None,
                stderr: stderr.trim().to_string(),
            });
        };

        Ok(ToolOutput { code, stdout, stderr })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A tool that runs `script` under `sh`; the file path arrives as `$1`
    pub(crate) fn shell_tool(kind: CheckKind, script: &str, exit_codes: ExitCodes) -> ExternalTool {
        ExternalTool {
            name: format!("fake-{}", kind),
            kind,
            command: ToolCommand::new("sh", ["-c", script, "sh"]),
            exit_codes,
            install_hint: None,
        }
    }

    pub(crate) fn missing_tool(kind: CheckKind) -> ExternalTool {
        ExternalTool {
            name: format!("missing-{}", kind),
            kind,
            command: ToolCommand::new("rag-codegen-no-such-tool", Vec::<String>::new()),
            exit_codes: ExitCodes::OneOf(vec![0]),
            install_hint: Some("pip install something".to_string()),
        }
    }

    #[test]
    fn test_exit_codes() {
        let bandit = ExitCodes::OneOf(vec![0, 1]);
        assert!(bandit.accepts(1));
        assert!(!bandit.accepts(2));

        let pylint = ExitCodes::Below(32);
        assert!(pylint.accepts(0));
        assert!(pylint.accepts(30));
        assert!(!pylint.accepts(32));
        assert!(!pylint.accepts(-1));
    }

    #[tokio::test]
    async fn test_missing_program_is_unavailable() {
        let runner = ToolRunner::new(Duration::from_secs(5));
        let err = runner
            .run(&missing_tool(CheckKind::Security), Path::new("x.py"))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            CheckError::ToolUnavailable {
                tool: "missing-security".to_string(),
                install_hint: Some("pip install something".to_string()),
            }
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_is_last_argument() {
        let runner = ToolRunner::new(Duration::from_secs(5));
        let tool = shell_tool(CheckKind::Style, "echo \"checked $1\"", ExitCodes::OneOf(vec![0]));

        let output = runner.run(&tool, Path::new("/tmp/sample.py")).await.unwrap();
        assert_eq!(output.code, 0);
        assert_eq!(output.stdout.trim(), "checked /tmp/sample.py");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unaccepted_exit_code_fails() {
        let runner = ToolRunner::new(Duration::from_secs(5));
        let tool = shell_tool(CheckKind::Quality, "echo boom >&2; exit 32", ExitCodes::Below(32));

        let err = runner.run(&tool, Path::new("x.py")).await.unwrap_err();
        assert_eq!(
            err,
            CheckError::ToolFailed {
                tool: "fake-quality".to_string(),
                code: Some(32),
                stderr: "boom".to_string(),
            }
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout() {
        let runner = ToolRunner::new(Duration::from_millis(200));
        let tool = shell_tool(CheckKind::Security, "sleep 5", ExitCodes::OneOf(vec![0]));

        let err = runner.run(&tool, Path::new("x.py")).await.unwrap_err();
        assert!(matches!(err, CheckError::Timeout { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_discover() {
        let runner = ToolRunner::new(Duration::from_secs(5));
        // `true` exits 0 whatever its arguments
        let present = ExternalTool {
            name: "true".to_string(),
            kind: CheckKind::Style,
            command: ToolCommand::new("true", Vec::<String>::new()),
            exit_codes: ExitCodes::OneOf(vec![0]),
            install_hint: None,
        };

        let report = runner.discover(&[present, missing_tool(CheckKind::Quality)]).await;
        assert_eq!(report.available.len(), 1);
        assert_eq!(report.available[0].name, "true");
        assert_eq!(report.missing.len(), 1);
        assert_eq!(report.missing[0].install_hint.as_deref(), Some("pip install something"));
        assert_eq!(report.summary(), "1 of 2 analysis tools available");
    }
}
