//! Index command - add Python sources to the snippet store

use super::AppContext;
use crate::cli::app::IndexArgs;
use crate::cli::progress;
use anyhow::{Context, Result};
use rag_codegen_core::AppConfig;
use rag_codegen_core::utils;

pub async fn execute(args: IndexArgs, config: AppConfig) -> Result<()> {
    let ctx = AppContext::build(config).await?;
    let cwd = std::env::current_dir().context("Failed to read the current directory")?;

    let spinner = progress::spinner("Indexing Python files...");
    let result = ctx.manager.index_paths(&args.paths).await;
    spinner.finish_and_clear();
    let report = result.context("Indexing failed")?;

    for path in &report.added {
        println!("  + {}", utils::relative_path(path, &cwd).display());
    }
    for (path, reason) in &report.skipped {
        println!("  - {} ({})", utils::relative_path(path, &cwd).display(), reason);
    }

    println!(
        "\nIndexed {} files, skipped {}. The store now holds {} snippets.",
        report.added.len(),
        report.skipped.len(),
        ctx.manager.store().len().await
    );
    Ok(())
}
