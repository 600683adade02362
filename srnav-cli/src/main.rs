//! srnav CLI - risk scoring and correlation for service requests

#![deny(warnings)]

// Global invariants enforced:
// - Deterministic output ordering
// - Identical input yields byte-for-byte identical output for a fixed
//   reference date

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use srnav_core::{config, report};
use srnav_core::{DataCatalog, RiskEngine, DEFAULT_TOP_K};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "srnav")]
#[command(about = "Risk scoring and correlation engine for service requests")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the aggregate risk score for one SR or the whole catalog
    Score {
        /// SR id to score (omit with --all)
        sr_id: Option<String>,

        /// Score every SR in the catalog, highest risk first
        #[arg(long)]
        all: bool,

        /// Data directory containing the SR and incident JSON files
        #[arg(long, default_value = ".")]
        data: PathBuf,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Reference date for freshness decay (YYYY-MM-DD, default: today)
        #[arg(long)]
        reference_date: Option<String>,
    },
    /// Rank similar SRs and related incidents for one SR
    Rank {
        /// SR id to correlate
        sr_id: String,

        /// Number of matches per list
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        top: usize,

        /// Data directory containing the SR and incident JSON files
        #[arg(long, default_value = ".")]
        data: PathBuf,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Reference date for freshness decay (YYYY-MM-DD, default: today)
        #[arg(long)]
        reference_date: Option<String>,
    },
    /// Produce the full risk evaluation for one SR
    Evaluate {
        /// SR id to evaluate
        sr_id: String,

        /// Data directory containing the SR and incident JSON files
        #[arg(long, default_value = ".")]
        data: PathBuf,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Reference date for freshness decay (YYYY-MM-DD, default: today)
        #[arg(long)]
        reference_date: Option<String>,
    },
    /// Run an FMEA development risk analysis for a free-text task
    Analyze {
        /// Development task description
        task: String,

        /// Number of correlated service requests
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        top_srs: usize,

        /// Number of correlated incidents
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        top_incidents: usize,

        /// Data directory containing the SR and incident JSON files
        #[arg(long, default_value = ".")]
        data: PathBuf,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Reference date for freshness decay (YYYY-MM-DD, default: today)
        #[arg(long)]
        reference_date: Option<String>,
    },
    /// Summarize the data catalog
    Data {
        /// Data directory containing the SR and incident JSON files
        #[arg(long, default_value = ".")]
        data: PathBuf,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Reference date for the recent-incident window (YYYY-MM-DD)
        #[arg(long)]
        reference_date: Option<String>,
    },
    /// Validate or show the engine configuration
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate a config file without running any analysis
    Validate {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Show the resolved configuration (merged defaults + config file)
    Show {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Score {
            sr_id,
            all,
            data,
            format,
            config: config_path,
            reference_date,
        } => {
            let engine = build_engine(&data, config_path.as_deref(), reference_date.as_deref())?;
            if all {
                let bar = spinner("scoring catalog");
                let results = engine.score_all();
                bar.finish_and_clear();
                match format {
                    OutputFormat::Json => println!("{}", report::render_json(&results)),
                    OutputFormat::Text => {
                        for result in &results {
                            print!("{}", report::render_score_text(result));
                            println!();
                        }
                    }
                }
            } else {
                let sr_id = sr_id
                    .ok_or_else(|| anyhow::anyhow!("provide an SR id or pass --all"))?;
                let result = engine.score_by_id(&sr_id)?;
                match format {
                    OutputFormat::Json => println!("{}", report::render_json(&result)),
                    OutputFormat::Text => print!("{}", report::render_score_text(&result)),
                }
            }
        }
        Commands::Rank {
            sr_id,
            top,
            data,
            format,
            config: config_path,
            reference_date,
        } => {
            let engine = build_engine(&data, config_path.as_deref(), reference_date.as_deref())?;
            let sr = engine
                .catalog()
                .sr_by_id(&sr_id)
                .ok_or_else(|| anyhow::anyhow!("no service request with id {sr_id}"))?
                .clone();
            let similar = engine.similar_srs(&sr, top);
            let incidents = engine.related_incidents(&sr, top);
            match format {
                OutputFormat::Json => {
                    let value = serde_json::json!({
                        "sr_id": sr.id,
                        "similar_srs": similar,
                        "related_incidents": incidents,
                    });
                    println!("{}", report::render_json(&value));
                }
                OutputFormat::Text => {
                    println!("Similar SRs for {}:", sr.id);
                    print!("{}", report::render_sr_matches_text(&similar));
                    println!("\nRelated incidents for {}:", sr.id);
                    print!("{}", report::render_incident_matches_text(&incidents));
                }
            }
        }
        Commands::Evaluate {
            sr_id,
            data,
            format,
            config: config_path,
            reference_date,
        } => {
            let engine = build_engine(&data, config_path.as_deref(), reference_date.as_deref())?;
            let sr = engine
                .catalog()
                .sr_by_id(&sr_id)
                .ok_or_else(|| anyhow::anyhow!("no service request with id {sr_id}"))?
                .clone();
            let evaluation = engine.evaluate(&sr, None);
            match format {
                OutputFormat::Json => println!("{}", report::render_json(&evaluation)),
                OutputFormat::Text => print!("{}", report::render_evaluation_text(&evaluation)),
            }
        }
        Commands::Analyze {
            task,
            top_srs,
            top_incidents,
            data,
            format,
            config: config_path,
            reference_date,
        } => {
            let engine = build_engine(&data, config_path.as_deref(), reference_date.as_deref())?;
            let bar = spinner("correlating task");
            let analysis = engine.analyze_development_risk(&task, top_srs, top_incidents, None);
            bar.finish_and_clear();
            match format {
                OutputFormat::Json => println!("{}", report::render_json(&analysis)),
                OutputFormat::Text => {
                    print!("{}", report::render_fmea_text(&analysis.analysis));
                    println!("\nRelated SRs:");
                    print!("{}", report::render_sr_matches_text(&analysis.related_srs));
                    println!("\nRelated incidents:");
                    print!(
                        "{}",
                        report::render_incident_matches_text(&analysis.related_incidents)
                    );
                }
            }
        }
        Commands::Data {
            data,
            format,
            reference_date,
        } => {
            let catalog = DataCatalog::load(&data).context("failed to load data catalog")?;
            let reference = parse_reference_date(reference_date.as_deref())?;
            let summary = catalog.summary(reference);
            match format {
                OutputFormat::Json => println!("{}", report::render_json(&summary)),
                OutputFormat::Text => print!("{}", report::render_summary_text(&summary)),
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Validate { path } => {
                let cwd = std::env::current_dir()?;
                match config::load_and_resolve(&cwd, path.as_deref()) {
                    Ok(resolved) => {
                        if let Some(ref p) = resolved.config_path {
                            println!("Config valid: {}", p.display());
                        } else {
                            println!("No config file found. Using defaults.");
                        }
                    }
                    Err(e) => {
                        eprintln!("Config validation failed: {:#}", e);
                        std::process::exit(1);
                    }
                }
            }
            ConfigAction::Show { path } => {
                let cwd = std::env::current_dir()?;
                let resolved = config::load_and_resolve(&cwd, path.as_deref())?;
                let value = serde_json::json!({
                    "config_path": resolved.config_path,
                    "risk_weights": resolved.risk_weights,
                    "risk_thresholds": resolved.risk_thresholds,
                    "decay_half_life_days": resolved.decay_half_life_days,
                    "domain_keywords": resolved.domain_keywords,
                    "system_importance": resolved.system_importance,
                    "default_system_importance": resolved.default_system_importance,
                    "relevance_divisor": resolved.relevance_divisor,
                });
                println!("{}", report::render_json(&value));
            }
        },
    }

    Ok(())
}

fn build_engine(
    data_dir: &std::path::Path,
    config_path: Option<&std::path::Path>,
    reference_date: Option<&str>,
) -> anyhow::Result<RiskEngine> {
    let catalog = DataCatalog::load(data_dir).context("failed to load data catalog")?;
    let resolved = config::load_and_resolve(data_dir, config_path)
        .context("failed to load configuration")?;
    if let Some(path) = &resolved.config_path {
        eprintln!("Using config: {}", path.display());
    }
    let reference = parse_reference_date(reference_date)?;
    Ok(RiskEngine::new(catalog, resolved, reference))
}

fn parse_reference_date(text: Option<&str>) -> anyhow::Result<chrono::NaiveDate> {
    match text {
        Some(text) => chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .with_context(|| format!("invalid reference date: {text} (expected YYYY-MM-DD)")),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

fn spinner(message: &'static str) -> ProgressBar {
    let bar = ProgressBar::new_spinner().with_message(message);
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.enable_steady_tick(std::time::Duration::from_millis(100));
    bar
}
