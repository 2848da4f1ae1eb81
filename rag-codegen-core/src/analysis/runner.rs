//! Runs all checks on a file concurrently

use super::tools::{DiscoveryReport, ExternalTool, ToolRunner};
use super::{AnalysisReport, CheckError, CheckOutcome, quality, security, structure, style};
use crate::config::AnalysisSettings;
use crate::utils;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

pub struct AnalysisRunner {
    runner: ToolRunner,
    security: ExternalTool,
    quality: ExternalTool,
    style: ExternalTool,
}

impl AnalysisRunner {
    pub fn new(settings: &AnalysisSettings) -> Self {
        Self {
            runner: ToolRunner::new(settings.tool_timeout()),
            security: settings.security_tool(),
            quality: settings.quality_tool(),
            style: settings.style_tool(),
        }
    }

    /// Build a runner from explicit tool definitions
    pub fn with_tools(
        runner: ToolRunner,
        security: ExternalTool,
        quality: ExternalTool,
        style: ExternalTool,
    ) -> Self {
        Self { runner, security, quality, style }
    }

    pub fn tools(&self) -> [&ExternalTool; 3] {
        [&self.security, &self.quality, &self.style]
    }

    /// Run every check on `path`. Individual check failures are recorded in
    /// the report; they never abort the analysis.
    pub async fn analyze_file(&self, path: &Path) -> AnalysisReport {
        info!("Analyzing {}", path.display());
        let started_at = Utc::now();
        let timer = Instant::now();

        let (security, quality, style, structure) = tokio::join!(
            security::check(&self.runner, &self.security, path),
            quality::check(&self.runner, &self.quality, path),
            style::check(&self.runner, &self.style, path),
            structure::check(path),
        );

        let mut report = AnalysisReport::new(
            path.to_path_buf(),
            CheckOutcome::from(security),
            CheckOutcome::from(quality),
            CheckOutcome::from(style),
            CheckOutcome::from(structure),
        );
        report.started_at = started_at;
        report.duration_ms = timer.elapsed().as_millis() as u64;

        for (kind, failure) in report.failures() {
            debug!("{} check failed: {}", kind, failure);
        }
        report
    }

    /// Analyze code that is not on disk yet, through a temporary `.py` file
    pub async fn analyze_source(&self, code: &str) -> Result<AnalysisReport, CheckError> {
        let temp = utils::save_to_temp_file(code, "py").map_err(|e| CheckError::Io {
            path: PathBuf::from("<temporary file>"),
            message: e.to_string(),
        })?;

        let mut report = self.analyze_file(temp.path()).await;
        report.file = PathBuf::from("<generated>");
        Ok(report)
    }

    /// Report which external checkers are installed
    pub async fn discover(&self) -> DiscoveryReport {
        let tools: Vec<ExternalTool> = self.tools().into_iter().cloned().collect();
        self.runner.discover(&tools).await
    }
}
