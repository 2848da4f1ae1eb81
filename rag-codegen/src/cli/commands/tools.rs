//! Tools command - report installed analysis tools

use anyhow::Result;
use rag_codegen_core::{AnalysisRunner, AppConfig};

pub async fn execute(config: AppConfig) -> Result<()> {
    let runner = AnalysisRunner::new(&config.analysis);
    let report = runner.discover().await;

    println!("{}\n", report.summary());
    for tool in &report.available {
        println!(
            "  ✓ {:<8} {:<10} {}",
            tool.name,
            tool.kind,
            tool.version.as_deref().unwrap_or("")
        );
    }
    for tool in &report.missing {
        match &tool.install_hint {
            Some(hint) => println!("  ✗ {:<8} {:<10} install with: {}", tool.name, tool.kind, hint),
            None => println!("  ✗ {:<8} {}", tool.name, tool.kind),
        }
    }

    if !report.missing.is_empty() {
        println!("\nMissing tools are reported as failed checks; the other checks still run.");
    }
    Ok(())
}
