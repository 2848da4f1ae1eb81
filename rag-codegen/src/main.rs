use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    // Parse CLI arguments first to get verbosity level
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    // Logs go to stderr so `--format json` output stays clean
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let config = cli::commands::load_config(cli.config.as_deref(), cli.data_dir.clone())?;

    match cli.command {
        Commands::Generate(args) => {
            info!("Generate command: {:?}", args);
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(cli::commands::generate::execute(args, config))?;
        }
        Commands::Analyze(args) => {
            info!("Analyze command: {:?}", args);
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(cli::commands::analyze::execute(args, config))?;
        }
        Commands::Review(args) => {
            info!("Review command: {:?}", args);
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(cli::commands::review::execute(args, config))?;
        }
        Commands::Search(args) => {
            info!("Search command: {:?}", args);
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(cli::commands::search::execute(args, config))?;
        }
        Commands::Index(args) => {
            info!("Index command: {:?}", args);
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(cli::commands::index::execute(args, config))?;
        }
        Commands::Tools => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(cli::commands::tools::execute(config))?;
        }
        Commands::Shell => {
            info!("Starting interactive shell");
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(cli::commands::shell::execute(config))?;
        }
    }

    Ok(())
}
