//! Compass CLI - repository dependency-graph analyzer

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "compass")]
#[command(about = "Build queryable file and symbol dependency graphs", long_about = None)]
#[command(version = compass_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (repeat for debug output)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a repository and persist its dependency graphs
    Analyze {
        /// Path to repository (default: current directory)
        path: Option<PathBuf>,

        /// Database file (default: <repo>/.compass/graph.db)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Ignore prior state and re-analyze everything
        #[arg(long)]
        full: bool,

        /// Include test files
        #[arg(long)]
        include_tests: bool,

        /// Descend into node_modules/ and vendor/
        #[arg(long)]
        include_vendored: bool,

        /// Truncate discovery at this many files
        #[arg(long)]
        max_files: Option<usize>,

        /// Force cross-stack eligibility on or off
        #[arg(long)]
        cross_stack: Option<bool>,
    },

    /// Write a default .compass.toml
    Init {
        /// Path to initialize (default: current directory)
        path: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Analyze {
            path,
            db,
            full,
            include_tests,
            include_vendored,
            max_files,
            cross_stack,
        } => commands::analyze::run(commands::analyze::AnalyzeArgs {
            path: path.unwrap_or_else(|| PathBuf::from(".")),
            db,
            full,
            include_tests,
            include_vendored,
            max_files,
            cross_stack,
        }),
        Commands::Init { path } => commands::init::run(path.unwrap_or_else(|| PathBuf::from("."))),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn init_logging(verbosity: u8) {
    let default = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
