use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use imgstep_engine::NavConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::{HarnessError, Result};
use crate::fixture::Fixture;
use crate::replay::{ReplayReport, replay};

/// Environment variable holding a tracing filter directive.
pub const LOG_ENV: &str = "IMGSTEP_LOG";

#[derive(Debug, Parser)]
#[command(
    name = "imgstep-replay",
    about = "Replay scripted image-navigation sessions against synthetic pages",
    version
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Replay fixtures and check their expectations.
    Run(RunArgs),

    /// Load and validate a configuration file.
    #[command(name = "check-config")]
    CheckConfig(CheckConfigArgs),

    /// Print the default configuration as TOML.
    #[command(name = "print-defaults")]
    PrintDefaults,
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Fixture files (JSON).
    #[arg(required = true)]
    pub fixtures: Vec<PathBuf>,

    /// Configuration file (.toml or .json).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print reports as JSON instead of a summary.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct CheckConfigArgs {
    pub path: PathBuf,
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli)
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run(args) => run_fixtures(&args),
        Commands::CheckConfig(args) => {
            load_config(&args.path)?;
            println!("{}: ok", args.path.display());
            Ok(())
        }
        Commands::PrintDefaults => {
            print!("{}", toml::to_string_pretty(&NavConfig::default())?);
            Ok(())
        }
    }
}

/// Load a configuration file by extension and validate it.
pub fn load_config(path: &Path) -> Result<NavConfig> {
    let config = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => NavConfig::from_toml_file(path)?,
        Some("json") => NavConfig::from_json_file(path)?,
        _ => {
            return Err(HarnessError::ConfigFormat {
                path: path.to_path_buf(),
            });
        }
    };
    Ok(config.validated()?)
}

/// Replay every fixture; fails with [`HarnessError::Mismatches`] if any
/// expectation did not hold.
pub fn run_fixtures(args: &RunArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => NavConfig::default(),
    };

    let reports = replay_paths(&args.fixtures, &config)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            println!("{}", summary_line(report));
            for step in report.steps.iter().filter(|step| !step.mismatches.is_empty()) {
                for mismatch in &step.mismatches {
                    println!("    step {} ({}): {mismatch}", step.index, step.action);
                }
            }
        }
    }

    let failed = reports.iter().filter(|report| !report.passed()).count();
    info!(total = reports.len(), failed, "replay run complete");
    if failed > 0 {
        return Err(HarnessError::Mismatches {
            failed,
            total: reports.len(),
        });
    }
    Ok(())
}

/// Load and replay each fixture path.
pub fn replay_paths(paths: &[PathBuf], config: &NavConfig) -> Result<Vec<ReplayReport>> {
    paths
        .iter()
        .map(|path| {
            let fixture = Fixture::from_path(path)?;
            Ok(replay(&fixture, config))
        })
        .collect()
}

#[must_use]
pub fn summary_line(report: &ReplayReport) -> String {
    let status = if report.passed() { "PASS" } else { "FAIL" };
    format!(
        "{status} {}: {} steps, final offset {}px, stuck {}, cache {} hits / {} rebuilds",
        report.name,
        report.steps.len(),
        report.final_offset,
        report.stuck_count,
        report.cache.hits,
        report.cache.rebuilds,
    )
}
