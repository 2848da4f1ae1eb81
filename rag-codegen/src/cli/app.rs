use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "rag-codegen",
    version,
    about = "Generate code with retrieval-augmented prompting and review Python sources",
    long_about = "rag-codegen turns natural-language requirements into code using a hosted LLM, \
grounding each request in similar snippets it has stored before, and reviews Python files with \
bandit, pylint, black and a structural pass."
)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the snippet store
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate code from a requirement
    #[command(about = "Generate code from a natural-language requirement")]
    Generate(GenerateArgs),

    /// Analyze a Python file
    #[command(about = "Run security, lint, formatting and structure checks on a Python file")]
    Analyze(AnalyzeArgs),

    /// LLM review of a file
    #[command(about = "Ask the model to review a file, using stored snippets as context")]
    Review(ReviewArgs),

    /// Search stored snippets
    #[command(about = "Find stored snippets similar to a query")]
    Search(SearchArgs),

    /// Add source files to the snippet store
    #[command(about = "Add Python files or directories to the snippet store")]
    Index(IndexArgs),

    /// Check for external analysis tools
    #[command(about = "Show which external analysis tools are installed")]
    Tools,

    /// Interactive session
    #[command(about = "Start an interactive generation and analysis session")]
    Shell,
}

#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// What the code should do
    #[arg(required = true, num_args = 1.., help = "Requirement text")]
    pub requirement: Vec<String>,

    /// Write the generated code to a file
    #[arg(short, long, help = "Save the generated code to this file")]
    pub output: Option<PathBuf>,

    /// Analyze the generated code
    #[arg(long, help = "Run the analysis checks on the generated code")]
    pub analyze: bool,

    /// Print the snippets used as context
    #[arg(long, help = "Show the stored snippets used as context")]
    pub show_context: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    /// Python file to analyze
    #[arg(help = "Path to the Python file to analyze")]
    pub file: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text, help = "Report format")]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct ReviewArgs {
    #[arg(help = "Path to the file to review")]
    pub file: PathBuf,
}

#[derive(Parser, Debug)]
pub struct SearchArgs {
    #[arg(required = true, num_args = 1.., help = "Search text")]
    pub query: Vec<String>,

    /// Number of results (defaults to the configured top-k)
    #[arg(short, help = "Number of results to show")]
    pub k: Option<usize>,
}

#[derive(Parser, Debug)]
pub struct IndexArgs {
    #[arg(required = true, num_args = 1.., help = "Files or directories to index")]
    pub paths: Vec<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_args() {
        let cli = Cli::parse_from([
            "rag-codegen",
            "-vv",
            "--data-dir",
            "/tmp/store",
            "generate",
            "parse",
            "a",
            "csv",
            "--analyze",
            "-o",
            "out.py",
        ]);

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/store")));
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.requirement.join(" "), "parse a csv");
                assert!(args.analyze);
                assert!(!args.show_context);
                assert_eq!(args.output, Some(PathBuf::from("out.py")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_analyze_format() {
        let cli = Cli::parse_from(["rag-codegen", "analyze", "app.py", "--format", "json"]);
        match cli.command {
            Commands::Analyze(args) => assert_eq!(args.format, OutputFormat::Json),
            other => panic!("unexpected command {other:?}"),
        }

        assert!(Cli::try_parse_from(["rag-codegen", "generate"]).is_err());
    }

    #[test]
    fn test_search_k() {
        let cli = Cli::parse_from(["rag-codegen", "search", "-k", "2", "http", "client"]);
        match cli.command {
            Commands::Search(args) => {
                assert_eq!(args.k, Some(2));
                assert_eq!(args.query, vec!["http", "client"]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
