//! petromerge - Multi-LAS Curve Merge Engine
//!
//! Command-line front end: merge LAS files of one well, inspect LAS files,
//! and check configuration files.
//!
//! # Usage
//!
//! ```bash
//! # Merge three runs of the same well at 0.5 ft, filling gaps up to 5 ft
//! petromerge merge run1.las run2.las run3.las --output merged.las --report report.json
//!
//! # Show curves, extents and quality scores
//! petromerge inspect run1.las run2.las
//!
//! # Validate a config file
//! petromerge check-config petromerge.toml
//! ```
//!
//! # Environment Variables
//!
//! - `PETROMERGE_CONFIG`: Path to the TOML config (default: ./petromerge.toml)
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use petromerge::config::MergeConfig;
use petromerge::las::{read_las, write_las_file, LasFile, UnmappedReason, WriteOptions};
use petromerge::merge::MergeEngine;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "petromerge")]
#[command(about = "Merge LAS well-log files of one well onto a uniform depth grid")]
#[command(version)]
struct CliArgs {
    /// Config file (default: ./petromerge.toml if present)
    #[arg(short, long, global = true, env = "PETROMERGE_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge LAS files of one well
    Merge {
        /// Input LAS files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output grid step in feet (0.1-1.0)
        #[arg(long)]
        step: Option<f64>,

        /// Longest null gap to interpolate, in feet (1.0-50.0)
        #[arg(long)]
        max_gap: Option<f64>,

        /// Write the merged dataset as LAS 2.0
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Write the merge report as JSON
        #[arg(short, long, value_name = "PATH")]
        report: Option<PathBuf>,
    },

    /// Show curves, depth extents and quality scores of LAS files
    Inspect {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Validate a config file and print the effective settings
    CheckConfig {
        /// Config file (default: --config, then ./petromerge.toml)
        path: Option<PathBuf>,
    },
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&Path>) -> Result<MergeConfig> {
    match path {
        Some(p) => MergeConfig::load_from_file(p)
            .with_context(|| format!("Failed to load config {}", p.display())),
        None => MergeConfig::load().context("Failed to load config"),
    }
}

fn load_files(
    files: &[PathBuf],
    engine: &MergeEngine,
    config: &MergeConfig,
) -> Result<Vec<LasFile>> {
    files
        .iter()
        .map(|path| {
            let las = read_las(path, engine.registry(), &config.las)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            for u in &las.unmapped {
                if u.reason == UnmappedReason::Unknown {
                    warn!(
                        file = %path.display(),
                        mnemonic = %u.mnemonic,
                        "Curve not recognised, skipped"
                    );
                }
            }
            Ok(las)
        })
        .collect()
}

// ============================================================================
// Subcommands
// ============================================================================

fn run_merge(
    config: &MergeConfig,
    files: &[PathBuf],
    step: Option<f64>,
    max_gap: Option<f64>,
    output: Option<&Path>,
    report_path: Option<&Path>,
) -> Result<()> {
    let engine = MergeEngine::from_config(config).context("Invalid configuration")?;
    let step = step.unwrap_or(config.merge.target_step_ft);
    let max_gap = max_gap.unwrap_or(config.merge.max_gap_ft);

    let loaded = load_files(files, &engine, config)?;
    let datasets: Vec<_> = loaded.into_iter().map(|las| las.dataset).collect();

    let outcome = engine
        .merge(&datasets, step, max_gap)
        .context("Merge failed")?;
    let report = &outcome.report;

    for warning in &report.warnings {
        warn!("{}", warning);
    }

    println!(
        "Well {} | {} datasets | {:.4}-{:.4} ft @ {} ft | {} points",
        report.well_id,
        report.datasets.len(),
        report.grid.top,
        report.grid.base,
        report.grid.step,
        report.grid.points
    );
    for curve in &report.curves {
        println!(
            "  {:<8} {:<6} primary={:<24} coverage={:>6.1}% filled={} unfilled={}",
            curve.curve_type.mnemonic(),
            curve.unit,
            curve.primary_source,
            curve.coverage * 100.0,
            curve.filled_gaps.len(),
            curve.unfilled_gaps.len()
        );
    }

    if let Some(path) = output {
        let options = WriteOptions::new(config.export.company.clone());
        write_las_file(path, &outcome.dataset, &options)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    if let Some(path) = report_path {
        let json = report.to_json().context("Failed to serialize merge report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "Merge report written");
    }

    Ok(())
}

fn run_inspect(config: &MergeConfig, files: &[PathBuf]) -> Result<()> {
    let engine = MergeEngine::from_config(config).context("Invalid configuration")?;
    for las in load_files(files, &engine, config)? {
        let ds = &las.dataset;
        println!(
            "{} | well {} | depth unit {} | {} curves",
            ds.id(),
            ds.well_id(),
            ds.depth_unit(),
            ds.curve_count()
        );
        for curve in ds.curves() {
            let extent = curve
                .extent()
                .map_or_else(|| "empty".to_string(), |e| e.to_string());
            let score = engine.score_curve(curve, &[]);
            println!(
                "  {:<8} {:<6} {:<24} complete={:>6.1}% score={:.3}",
                curve.curve_type().mnemonic(),
                curve.unit(),
                extent,
                curve.completeness() * 100.0,
                score.value
            );
        }
        for u in &las.unmapped {
            match &u.reason {
                UnmappedReason::Unknown => println!("  {:<8} (not recognised)", u.mnemonic),
                UnmappedReason::Superseded { by } => {
                    println!("  {:<8} (superseded by {})", u.mnemonic, by);
                }
            }
        }
    }
    Ok(())
}

fn run_check_config(path: Option<&Path>) -> Result<()> {
    let config = load_config(path)?;
    if let Err(e) = MergeEngine::from_config(&config) {
        bail!("{e}");
    }
    println!("Configuration OK");
    print!("{}", config.to_toml().context("Failed to render config")?);
    Ok(())
}

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.log_json);

    match &args.command {
        Command::Merge {
            files,
            step,
            max_gap,
            output,
            report,
        } => {
            let config = load_config(args.config.as_deref())?;
            run_merge(
                &config,
                files,
                *step,
                *max_gap,
                output.as_deref(),
                report.as_deref(),
            )
        }
        Command::Inspect { files } => {
            let config = load_config(args.config.as_deref())?;
            run_inspect(&config, files)
        }
        Command::CheckConfig { path } => {
            run_check_config(path.as_deref().or(args.config.as_deref()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_config_flag_reads_env_var() {
        let cmd = CliArgs::command();
        let config = cmd
            .get_arguments()
            .find(|a| a.get_id() == "config")
            .unwrap();
        assert_eq!(
            config.get_env(),
            Some(std::ffi::OsStr::new("PETROMERGE_CONFIG"))
        );
    }

    #[test]
    fn test_explicit_config_flag_parses() {
        let argv = ["petromerge", "--config", "x.toml", "inspect", "a.las"];
        let args = CliArgs::try_parse_from(argv).unwrap();
        assert_eq!(args.config.as_deref(), Some(Path::new("x.toml")));
        assert!(matches!(args.command, Command::Inspect { .. }));
    }
}
