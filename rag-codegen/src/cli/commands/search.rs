//! Search command - similar stored snippets

use super::AppContext;
use super::generate::describe_origin;
use crate::cli::app::SearchArgs;
use anyhow::{Context, Result};
use rag_codegen_core::AppConfig;

const PREVIEW_LINES: usize = 6;

pub async fn execute(args: SearchArgs, config: AppConfig) -> Result<()> {
    let k = args.k.unwrap_or(config.retrieval.top_k);
    let ctx = AppContext::build(config).await?;
    run(&ctx, &args.query.join(" "), k).await
}

pub async fn run(ctx: &AppContext, query: &str, k: usize) -> Result<()> {
    let results = ctx.manager.search_similar_code(query, k).await.context("Search failed")?;

    if results.is_empty() {
        println!("No stored snippets yet. Generate some code or run `rag-codegen index`.");
        return Ok(());
    }

    for (rank, scored) in results.iter().enumerate() {
        let snippet = &scored.snippet;
        println!(
            "{}. [{:.3}] {} ({})",
            rank + 1,
            scored.score,
            describe_origin(&snippet.metadata.origin),
            snippet.metadata.language.as_deref().unwrap_or("unknown language")
        );

        let lines: Vec<&str> = snippet.text.lines().collect();
        for line in lines.iter().take(PREVIEW_LINES) {
            println!("    {}", line);
        }
        if lines.len() > PREVIEW_LINES {
            println!("    ... ({} more lines)", lines.len() - PREVIEW_LINES);
        }
        println!();
    }

    Ok(())
}
