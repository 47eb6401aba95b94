//! equadiag CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "equadiag",
    version,
    about = "Diagnostic quiz and remediation planner for first-degree equations"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade one solution
    Grade {
        /// Question id (e.g. "q1")
        #[arg(long)]
        question: String,

        /// Solution text
        #[arg(long, conflicts_with = "solution_file", required_unless_present = "solution_file")]
        solution: Option<String>,

        /// Read the solution from a file
        #[arg(long)]
        solution_file: Option<PathBuf>,

        /// Catalog file or directory (default: built-in catalog)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Grade a full set of answers and plan remediation
    Quiz {
        /// TOML file with [[answers]] entries
        #[arg(long)]
        answers: PathBuf,

        /// Catalog file or directory (default: built-in catalog)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory (default: output_dir from the config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Report format: json, html, all
        #[arg(long, default_value = "json")]
        format: String,
    },

    /// Show learning resources for a list of skills
    Plan {
        /// Skills (comma-separated)
        #[arg(long)]
        skills: String,

        /// Catalog file or directory (default: built-in catalog)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List questions, or fetch generated ones for a theme
    Questions {
        /// Theme to generate or filter questions for
        #[arg(long)]
        theme: Option<String>,

        /// Catalog file or directory (default: built-in catalog)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate a question catalog
    Validate {
        /// Catalog file or directory (default: built-in catalog)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and example catalog
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("equadiag=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Grade {
            question,
            solution,
            solution_file,
            catalog,
            config,
            format,
        } => {
            commands::grade::execute(question, solution, solution_file, catalog, config, format)
                .await
        }
        Commands::Quiz {
            answers,
            catalog,
            config,
            output,
            format,
        } => commands::quiz::execute(answers, catalog, config, output, format).await,
        Commands::Plan {
            skills,
            catalog,
            config,
        } => commands::plan::execute(skills, catalog, config),
        Commands::Questions {
            theme,
            catalog,
            config,
        } => commands::questions::execute(theme, catalog, config).await,
        Commands::Validate { catalog, config } => commands::validate::execute(catalog, config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
