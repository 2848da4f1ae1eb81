//! Generate command - requirement in, code out

use super::AppContext;
use crate::cli::app::GenerateArgs;
use crate::cli::progress;
use anyhow::{Context, Result};
use rag_codegen_core::AppConfig;
use rag_codegen_core::rag::{Generation, ScoredSnippet, SnippetOrigin};
use rag_codegen_core::utils;
use std::path::Path;
use tracing::{info, warn};

pub async fn execute(args: GenerateArgs, config: AppConfig) -> Result<()> {
    let ctx = AppContext::build(config).await?;
    let requirement = args.requirement.join(" ");

    let generation = run(&ctx, &requirement).await?;

    if args.show_context {
        print_context(&generation.context);
    }
    println!("{}", generation.code.trim_end());

    let code = utils::primary_code(&generation.code);
    if let Some(path) = &args.output {
        save(path, &code).await?;
        println!("\nSaved to {}", path.display());
    }

    if args.analyze {
        let spinner = progress::spinner("Analyzing generated code...");
        let report = ctx.analyzer.analyze_source(&code).await;
        spinner.finish_and_clear();
        println!("\n{}", report.context("Failed to analyze generated code")?.render_text());
    }

    Ok(())
}

/// Generate with a spinner; shared with the interactive shell
pub async fn run(ctx: &AppContext, requirement: &str) -> Result<Generation> {
    let spinner = progress::spinner("Generating code...");
    let result = ctx.manager.generate_code(requirement).await;
    spinner.finish_and_clear();

    let generation = result.context("Code generation failed")?;
    match generation.stored {
        Some(id) => info!("Stored generated code as snippet {}", id),
        None => warn!("Generated code could not be added to the snippet store"),
    }
    if let Some(usage) = &generation.usage {
        info!(
            "Model {} used {} prompt + {} completion tokens",
            generation.model, usage.prompt_tokens, usage.completion_tokens
        );
    }

    Ok(generation)
}

pub fn print_context(context: &[ScoredSnippet]) {
    if context.is_empty() {
        println!("(no stored snippets were used as context)\n");
        return;
    }

    println!("Context snippets:");
    for scored in context {
        println!("  [{:.3}] {}", scored.score, describe_origin(&scored.snippet.metadata.origin));
    }
    println!();
}

pub fn describe_origin(origin: &SnippetOrigin) -> String {
    match origin {
        SnippetOrigin::Generated { requirement } => format!("generated for \"{}\"", requirement),
        SnippetOrigin::Indexed { path } => format!("indexed from {}", path.display()),
        SnippetOrigin::Manual => "added manually".to_string(),
    }
}

async fn save(path: &Path, code: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    tokio::fs::write(path, code)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}
