//! Review command - LLM review of a file with stored context

use super::AppContext;
use super::generate::print_context;
use crate::cli::app::ReviewArgs;
use crate::cli::progress;
use anyhow::{Context, Result};
use rag_codegen_core::AppConfig;
use rag_codegen_core::rag::CodeReview;
use std::path::Path;

pub async fn execute(args: ReviewArgs, config: AppConfig) -> Result<()> {
    let ctx = AppContext::build(config).await?;
    let review = run(&ctx, &args.file).await?;

    print_context(&review.context);
    println!("{}", review.review);
    Ok(())
}

pub async fn run(ctx: &AppContext, file: &Path) -> Result<CodeReview> {
    let code = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let spinner = progress::spinner(&format!("Reviewing {}...", file.display()));
    let result = ctx.manager.review_code(&code).await;
    spinner.finish_and_clear();

    result.context("Code review failed")
}
