//! Mimicry CLI - multi-representation source similarity reports.
//!
//! Terminal front-end for the similarity engine: collects Python sources
//! from files and directories, runs the pairwise analysis, and renders the
//! result sets as a table, JSON, or CSV.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indexmap::IndexMap;
use tabled::{Table, Tabled};
use tracing::{info, warn};
use walkdir::WalkDir;

use mimicry_rs::{AnalysisConfig, AnalysisResults, MimicryEngine, SimilarityWeights};

#[derive(Parser)]
#[command(name = "mimicry", version, about = "Near-duplicate and disguised-copy detection for Python sources")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare every pair of the given Python sources
    Analyze(AnalyzeArgs),

    /// Print the default configuration as YAML
    PrintDefaultConfig,
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Files or directories to analyze (.py files are collected from
    /// directories recursively)
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Optional YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Type-1 similarity weight
    #[arg(long, default_value_t = 0.25)]
    w1: f64,

    /// Type-2 similarity weight
    #[arg(long, default_value_t = 0.25)]
    w2: f64,

    /// Type-3 similarity weight
    #[arg(long, default_value_t = 0.25)]
    w3: f64,

    /// Type-4 similarity weight
    #[arg(long, default_value_t = 0.25)]
    w4: f64,

    /// Minimum combined score for a pair to be shown
    #[arg(long)]
    min_score: Option<f64>,

    /// Maximum number of function pairs to show (table output only)
    #[arg(long, default_value_t = 100)]
    max_pairs: usize,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Tabled)]
struct FilePairRow {
    #[tabled(rename = "File A")]
    file_a: String,
    #[tabled(rename = "File B")]
    file_b: String,
    #[tabled(rename = "Type-1")]
    type1: String,
    #[tabled(rename = "Type-2")]
    type2: String,
    #[tabled(rename = "Type-3")]
    type3: String,
    #[tabled(rename = "Type-4")]
    type4: String,
    #[tabled(rename = "Combined")]
    combined: String,
}

#[derive(Tabled)]
struct FunctionPairRow {
    #[tabled(rename = "File A")]
    file_a: String,
    #[tabled(rename = "Function A")]
    function_a: String,
    #[tabled(rename = "File B")]
    file_b: String,
    #[tabled(rename = "Function B")]
    function_b: String,
    #[tabled(rename = "Names")]
    names: String,
    #[tabled(rename = "Combined")]
    combined: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Analyze(args) => analyze_command(args),
        Commands::PrintDefaultConfig => {
            print!("{}", AnalysisConfig::default_yaml()?);
            Ok(())
        }
    }
}

fn analyze_command(args: AnalyzeArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_yaml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => AnalysisConfig {
            weights: SimilarityWeights::new(args.w1, args.w2, args.w3, args.w4),
            ..AnalysisConfig::default()
        },
    };
    if let Some(min_score) = args.min_score {
        config.min_combined_score = min_score;
    }

    let files = collect_sources(&args.paths)?;
    if files.len() < 2 {
        bail!("need at least two Python files to compare, found {}", files.len());
    }
    info!("Comparing {} files", files.len());

    let engine = MimicryEngine::new(config.clone())?;
    let results = engine.analyze(&files);

    let summary = results.summary();
    info!(
        "Top file-pair similarity: {:.1}%",
        100.0 * summary.max_file_similarity
    );

    match args.format {
        OutputFormat::Table => render_table(&results, &config, args.max_pairs),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
        OutputFormat::Csv => render_csv(&results, &config),
    }

    Ok(())
}

/// Collect `.py` sources from the given files and directories, keyed by
/// path. Order is deterministic: arguments in the given order, directory
/// contents sorted.
fn collect_sources(paths: &[PathBuf]) -> anyhow::Result<IndexMap<String, String>> {
    let mut collected = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .filter(|p| is_python_file(p))
                .collect();
            found.sort();
            collected.extend(found);
        } else if path.is_file() {
            collected.push(path.clone());
        } else {
            bail!("path does not exist: {}", path.display());
        }
    }

    let mut files = IndexMap::new();
    for path in collected {
        let name = path.display().to_string();
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                files.insert(name, content);
            }
            Err(error) => warn!("Skipping unreadable file {name}: {error}"),
        }
    }

    Ok(files)
}

fn is_python_file(path: &Path) -> bool {
    path.extension().map(|ext| ext == "py").unwrap_or(false)
}

fn percent(score: f64) -> String {
    format!("{:.1}%", 100.0 * score)
}

fn render_table(results: &AnalysisResults, config: &AnalysisConfig, max_pairs: usize) {
    let file_rows: Vec<FilePairRow> = results
        .file_pairs
        .iter()
        .filter(|pair| pair.scores.combined >= config.min_combined_score)
        .map(|pair| FilePairRow {
            file_a: pair.file_a.clone(),
            file_b: pair.file_b.clone(),
            type1: percent(pair.scores.type1),
            type2: percent(pair.scores.type2),
            type3: percent(pair.scores.type3),
            type4: percent(pair.scores.type4),
            combined: percent(pair.scores.combined),
        })
        .collect();

    println!("File pair similarities");
    if file_rows.is_empty() {
        println!("  (no file pairs above the score threshold)");
    } else {
        println!("{}", Table::new(file_rows));
    }

    let function_rows: Vec<FunctionPairRow> = results
        .function_pairs
        .iter()
        .filter(|pair| pair.scores.combined >= config.min_combined_score)
        .take(max_pairs)
        .map(|pair| FunctionPairRow {
            file_a: pair.file_a.clone(),
            function_a: pair.function_a.clone(),
            file_b: pair.file_b.clone(),
            function_b: pair.function_b.clone(),
            names: percent(pair.name_similarity),
            combined: percent(pair.scores.combined),
        })
        .collect();

    println!();
    println!("Function-level similarities (top matches by combined score)");
    if function_rows.is_empty() {
        println!("  (no function pairs above the score threshold)");
    } else {
        println!("{}", Table::new(function_rows));
    }
}

fn render_csv(results: &AnalysisResults, config: &AnalysisConfig) {
    println!("file_a,file_b,type1,type2,type3,type4,combined");
    for pair in &results.file_pairs {
        if pair.scores.combined < config.min_combined_score {
            continue;
        }
        println!(
            "{},{},{:.4},{:.4},{:.4},{:.4},{:.4}",
            csv_field(&pair.file_a),
            csv_field(&pair.file_b),
            pair.scores.type1,
            pair.scores.type2,
            pair.scores.type3,
            pair.scores.type4,
            pair.scores.combined,
        );
    }

    println!();
    println!("file_a,func_a,file_b,func_b,name_sim,type1,type2,type3,type4,combined");
    for pair in &results.function_pairs {
        if pair.scores.combined < config.min_combined_score {
            continue;
        }
        println!(
            "{},{},{},{},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4}",
            csv_field(&pair.file_a),
            csv_field(&pair.function_a),
            csv_field(&pair.file_b),
            csv_field(&pair.function_b),
            pair.name_similarity,
            pair.scores.type1,
            pair.scores.type2,
            pair.scores.type3,
            pair.scores.type4,
            pair.scores.combined,
        );
    }
}

/// Quote a CSV field when it contains a delimiter, quote, or newline.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
