//! quizforge CLI: generate tests from PDFs, take them, or serve the HTTP API.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "quizforge",
    version,
    about = "Turn PDF study material into timed multiple-choice tests"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP upload and grading API
    Serve {
        /// Address to listen on (overrides the config file)
        #[arg(long)]
        bind: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Generate tests from one or more PDFs and print them
    Generate {
        /// PDF files to turn into tests
        #[arg(long, required = true, num_args = 1..)]
        pdf: Vec<PathBuf>,

        /// Test title (defaults to the file name without extension)
        #[arg(long)]
        title: Option<String>,

        /// Test description
        #[arg(long)]
        description: Option<String>,

        /// Number of questions per test
        #[arg(long)]
        questions: Option<usize>,

        /// Print full tests as JSON instead of a summary table
        #[arg(long)]
        json: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Generate a test from a PDF and take it on the terminal
    Take {
        /// PDF file to turn into a test
        #[arg(long)]
        pdf: PathBuf,

        /// Number of questions
        #[arg(long)]
        questions: Option<usize>,

        /// Time limit in seconds (defaults to the test's own duration)
        #[arg(long)]
        time_limit: Option<u64>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter quizforge.toml
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quizforge=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { bind, config } => commands::serve::execute(bind, config).await,
        Commands::Generate {
            pdf,
            title,
            description,
            questions,
            json,
            config,
        } => commands::generate::execute(pdf, title, description, questions, json, config).await,
        Commands::Take {
            pdf,
            questions,
            time_limit,
            config,
        } => commands::take::execute(pdf, questions, time_limit, config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
