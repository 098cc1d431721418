//! `compass analyze` - run one analysis pass and print the summary

use anyhow::Result;
use colored::Colorize;
use compass_core::pipeline::{AnalysisSummary, PassStatus};
use compass_core::{AnalysisConfig, AnalysisPipeline, CrossStackDecision, SqliteStore};
use std::path::PathBuf;

/// How many suppressed errors are printed verbatim before summarizing.
const MAX_ERRORS_SHOWN: usize = 10;

pub struct AnalyzeArgs {
    pub path: PathBuf,
    pub db: Option<PathBuf>,
    pub full: bool,
    pub include_tests: bool,
    pub include_vendored: bool,
    pub max_files: Option<usize>,
    pub cross_stack: Option<bool>,
}

pub fn run(args: AnalyzeArgs) -> Result<i32> {
    let mut config = AnalysisConfig::find_and_load(&args.path)?;
    if args.full {
        config.force_full_analysis = true;
    }
    if args.include_tests {
        config.include_test_files = true;
    }
    if args.include_vendored {
        config.include_vendored_dependencies = true;
    }
    if let Some(max_files) = args.max_files {
        config.max_files = max_files;
    }
    if args.cross_stack.is_some() {
        config.cross_stack_enabled = args.cross_stack;
    }

    let db_path = args
        .db
        .unwrap_or_else(|| args.path.join(".compass").join("graph.db"));
    let store = SqliteStore::open(&db_path)?;

    let pipeline = AnalysisPipeline::new(&store, config);
    let summary = pipeline.run(&args.path)?;
    print_summary(&summary);

    Ok(match summary.status {
        PassStatus::Completed => 0,
        PassStatus::Aborted => 1,
    })
}

fn print_summary(summary: &AnalysisSummary) {
    match summary.status {
        PassStatus::Completed => println!("{}", "Analysis complete".green().bold()),
        PassStatus::Aborted => println!("{}", "Analysis aborted".yellow().bold()),
    }

    println!(
        "  {} files discovered, {} processed, {} skipped",
        summary.files_discovered, summary.files_processed, summary.files_skipped
    );
    println!(
        "  {} symbols, {} symbol edges, {} file edges, {} framework entities",
        summary.symbols_extracted,
        summary.symbol_edges_created,
        summary.file_edges_created,
        summary.framework_entities_created
    );
    println!(
        "  graph: {} file nodes / {} file edges, {} symbol nodes / {} symbol edges",
        summary.graph_counts.file_nodes,
        summary.graph_counts.file_edges,
        summary.graph_counts.symbol_nodes,
        summary.graph_counts.symbol_edges
    );
    println!(
        "  resolution: {} resolved, {} fallback, {} unresolved",
        summary.resolution.resolved,
        summary.resolution.fallback,
        summary.resolution.unresolved + summary.resolution.vetoed
    );
    if let CrossStackDecision::ExternalApi(url) = &summary.cross_stack {
        println!("  cross-stack disabled: external API at {url}");
    } else if summary.cross_stack.is_eligible() {
        println!("  cross-stack analysis eligible");
    }
    println!("  completed in {:.2?}", summary.duration);

    if !summary.errors.is_empty() {
        println!();
        println!(
            "{} {} file problems:",
            "warning:".yellow().bold(),
            summary.errors.len()
        );
        for error in summary.errors.iter().take(MAX_ERRORS_SHOWN) {
            println!("  {}: {}", error.path.display(), error.message);
        }
        if summary.errors.len() > MAX_ERRORS_SHOWN {
            println!("  ... and {} more", summary.errors.len() - MAX_ERRORS_SHOWN);
        }
    }
}
