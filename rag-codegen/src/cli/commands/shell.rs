//! Interactive shell
//!
//! Plain lines are requirements; `:`-prefixed lines are commands. Ctrl-C
//! abandons the request in flight and returns to the prompt.

use super::{AppContext, analyze, generate, review, search};
use crate::cli::app::OutputFormat;
use crate::cli::progress;
use anyhow::{Context, Result, bail};
use rag_codegen_core::AppConfig;
use rag_codegen_core::utils;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

const HELP: &str = "\
Type a requirement to generate code, or one of:
  :analyze FILE   run the analysis checks on a Python file
  :analyze        run the analysis checks on the last generated code
  :review FILE    ask the model to review a file
  :search QUERY   show stored snippets similar to QUERY
  :help           show this help
  :quit           leave the shell
Ctrl-C cancels the running request.";

#[derive(Debug, Clone, PartialEq, Eq)]
enum ShellCommand {
    Generate(String),
    /// `None` analyzes the most recent generation
    Analyze(Option<PathBuf>),
    Review(PathBuf),
    Search(String),
    Help,
    Quit,
}

impl ShellCommand {
    fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        let Some(rest) = line.strip_prefix(':') else {
            return Ok(Self::Generate(line.to_string()));
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        let needs_arg = |what: &str| -> Result<String> {
            if arg.is_empty() {
                bail!(":{} needs {}", name, what);
            }
            Ok(arg.to_string())
        };

        match name {
            "analyze" | "a" => Ok(Self::Analyze((!arg.is_empty()).then(|| PathBuf::from(arg)))),
            "review" | "r" => Ok(Self::Review(PathBuf::from(needs_arg("a file")?))),
            "search" | "s" => Ok(Self::Search(needs_arg("a query")?)),
            "help" | "h" | "?" => Ok(Self::Help),
            "quit" | "q" | "exit" => Ok(Self::Quit),
            other => bail!("Unknown command :{} (try :help)", other),
        }
    }
}

pub async fn execute(config: AppConfig) -> Result<()> {
    let ctx = AppContext::build(config).await?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_code: Option<String> = None;

    println!("rag-codegen interactive shell ({} stored snippets)", ctx.manager.store().len().await);
    println!("{}\n", HELP);

    loop {
        print!("rag> ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };
        // End of input
        let Some(line) = line else {
            println!();
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match ShellCommand::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };

        match command {
            ShellCommand::Quit => break,
            ShellCommand::Help => println!("{}", HELP),
            command => {
                // Dropping the request future abandons it; its result is never shown
                tokio::select! {
                    result = run(&ctx, command, &mut last_code) => {
                        if let Err(e) = result {
                            eprintln!("Error: {:#}", e);
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        debug!("Request cancelled");
                        eprintln!("\nCancelled");
                    }
                }
            }
        }
    }

    Ok(())
}

async fn run(ctx: &AppContext, command: ShellCommand, last_code: &mut Option<String>) -> Result<()> {
    match command {
        ShellCommand::Generate(requirement) => {
            let generation = generate::run(ctx, &requirement).await?;
            println!("{}\n", generation.code.trim_end());
            println!("(type :analyze to check this code)\n");
            *last_code = Some(utils::primary_code(&generation.code));
        }
        ShellCommand::Analyze(None) => {
            let Some(code) = last_code.as_deref() else {
                bail!("Nothing generated yet; use :analyze FILE");
            };
            let spinner = progress::spinner("Analyzing generated code...");
            let report = ctx.analyzer.analyze_source(code).await;
            spinner.finish_and_clear();
            let report = report.context("Failed to analyze generated code")?;
            analyze::print_report(&report, OutputFormat::Text)?;
        }
        ShellCommand::Analyze(Some(file)) => {
            if !file.is_file() {
                bail!("File not found: {}", file.display());
            }
            let spinner = progress::spinner(&format!("Analyzing {}...", file.display()));
            let report = ctx.analyzer.analyze_file(&file).await;
            spinner.finish_and_clear();
            analyze::print_report(&report, OutputFormat::Text)?;
        }
        ShellCommand::Review(file) => {
            let review = review::run(ctx, &file).await?;
            println!("{}\n", review.review);
        }
        ShellCommand::Search(query) => {
            search::run(ctx, &query, ctx.config.retrieval.top_k).await?;
        }
        ShellCommand::Help | ShellCommand::Quit => {}
    }
    Ok(())
}
