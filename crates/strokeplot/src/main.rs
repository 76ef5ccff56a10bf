//! strokeplot: turn a stroke file into plotter G-code.
//!
//! Reads strokes as JSON (a flat point list, nested stroke lists, or a
//! stroke document), runs toolpath synthesis for the chosen machine
//! profile, and writes G-code plus optional SVG preview and diagnostics.
//!
//! # Usage
//!
//! ```text
//! strokeplot [OPTIONS] <INPUT>
//! strokeplot drawing.json --preset paint --color red -o drawing.gcode --svg preview.svg
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `warn`). Logs and the
//! diagnostics report go to stderr so G-code can be piped from stdout.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use strokeplot_export::{GcodeMetadata, Macros};
use strokeplot_pipeline::{MachineConfig, ReloadStrategy, StrokeInput, SynthesisDiagnostics};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Turn 2D strokes into bounded G-code for a pen plotter or painting robot.
#[derive(Parser)]
#[command(name = "strokeplot", version)]
struct Cli {
    /// Path to the stroke JSON file.
    input: PathBuf,

    /// Machine profile to start from.
    #[arg(long, value_enum, default_value_t = Preset::Pen)]
    preset: Preset,

    /// Machine config JSON file. Profile flags are ignored when given.
    #[arg(long, conflicts_with = "config_json")]
    config: Option<PathBuf>,

    /// Machine config as a JSON string. Profile flags are ignored when given.
    #[arg(long)]
    config_json: Option<String>,

    /// Paint color to load (paint profile only).
    #[arg(long)]
    color: Option<String>,

    /// Drawn distance between reloads. Defaults to the preset's value.
    #[arg(long)]
    max_stroke_length: Option<f64>,

    /// Feed rate for every move.
    #[arg(long, default_value_t = MachineConfig::DEFAULT_FEED_RATE)]
    feed_rate: f64,

    /// Z height at which the tool touches the bed.
    #[arg(long, default_value_t = MachineConfig::DEFAULT_DRAW_HEIGHT)]
    draw_height: f64,

    /// Setup/teardown macro JSON file (`{"setup": [...], "teardown": [...]}`).
    #[arg(long)]
    macros: Option<PathBuf>,

    /// Write G-code here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write an SVG toolpath preview to this file.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Print diagnostics as JSON instead of a human-readable report.
    #[arg(long)]
    json: bool,

    /// Number of runs for averaging timings.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,
}

/// Machine profile selection.
#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    /// Pen plotter: operator pause on reload.
    Pen,
    /// Painting robot: pot dips, wash and dry.
    Paint,
}

/// Build a [`MachineConfig`] from CLI arguments.
///
/// A config file or `--config-json` is used as-is apart from `--color`.
/// Otherwise the preset is adjusted by the individual flags.
fn config_from_cli(cli: &Cli) -> Result<MachineConfig, String> {
    let mut config = if let Some(ref json) = cli.config_json {
        serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"))?
    } else if let Some(ref path) = cli.config {
        let text = read_text(path)?;
        serde_json::from_str(&text)
            .map_err(|e| format!("Error parsing {}: {e}", path.display()))?
    } else {
        let base = match cli.preset {
            Preset::Pen => MachineConfig::pen_plotter(),
            Preset::Paint => MachineConfig::paint_robot(),
        };
        MachineConfig {
            feed_rate: cli.feed_rate,
            draw_height: cli.draw_height,
            max_stroke_length: cli.max_stroke_length.unwrap_or(base.max_stroke_length),
            ..base
        }
    };

    if let Some(ref color) = cli.color {
        match config.reload {
            ReloadStrategy::Paint(ref mut paint) => paint.color.clone_from(color),
            ReloadStrategy::Pause => {
                return Err("--color needs a paint profile (try --preset paint)".to_owned());
            }
        }
    }
    Ok(config)
}

fn macros_from_cli(cli: &Cli) -> Result<Macros, String> {
    cli.macros.as_ref().map_or_else(
        || Ok(Macros::default()),
        |path| {
            let text = read_text(path)?;
            serde_json::from_str(&text).map_err(|e| format!("Error parsing {}: {e}", path.display()))
        },
    )
}

fn read_text(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("Error reading {}: {e}", path.display()))
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };
    let macros = match macros_from_cli(&cli) {
        Ok(m) => m,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let text = match read_text(&cli.input) {
        Ok(text) => text,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };
    let input = match StrokeInput::from_json(&text) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("Error in {}: {e}", cli.input.display());
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(input = %cli.input.display(), bytes = text.len(), runs = cli.runs, "starting");
    tracing::debug!(?config, "machine config");

    let mut all_diagnostics = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        let (synthesis, diagnostics) =
            match strokeplot_pipeline::synthesize_with_diagnostics(input.clone(), &config) {
                Ok(result) => result,
                Err(e) => {
                    eprintln!("Synthesis error: {e}");
                    return ExitCode::FAILURE;
                }
            };

        if cli.json {
            match serde_json::to_string_pretty(&diagnostics) {
                Ok(json) => eprintln!("{json}"),
                Err(e) => {
                    eprintln!("Error serializing diagnostics: {e}");
                    return ExitCode::FAILURE;
                }
            }
        } else {
            eprintln!("{}", diagnostics.report());
        }

        // Write outputs on the first run only.
        if run == 0 {
            let title = cli.input.file_name().and_then(|s| s.to_str());

            if let Some(ref svg_path) = cli.svg {
                let svg = strokeplot_export::to_svg(&synthesis.program, &config.envelope, title);
                match std::fs::write(svg_path, &svg) {
                    Ok(()) => eprintln!(
                        "SVG written to {} ({} bytes)",
                        svg_path.display(),
                        svg.len(),
                    ),
                    Err(e) => eprintln!("Error writing SVG to {}: {e}", svg_path.display()),
                }
            }

            let config_json = serde_json::to_string(&config).ok();
            let metadata = GcodeMetadata {
                title,
                config_json: config_json.as_deref(),
            };
            let gcode = strokeplot_export::to_gcode(synthesis.program, &macros, &metadata);
            match cli.output {
                Some(ref path) => {
                    if let Err(e) = std::fs::write(path, &gcode) {
                        eprintln!("Error writing G-code to {}: {e}", path.display());
                        return ExitCode::FAILURE;
                    }
                    eprintln!("G-code written to {} ({} bytes)", path.display(), gcode.len());
                }
                None => print!("{gcode}"),
            }
        }

        all_diagnostics.push(diagnostics);
    }

    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    ExitCode::SUCCESS
}

/// Function pointer type for extracting a stage duration from diagnostics.
type StageExtractor = fn(&SynthesisDiagnostics) -> std::time::Duration;

/// Print aggregated timings across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[SynthesisDiagnostics]) {
    eprintln!();
    eprintln!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    if all_diagnostics.is_empty() {
        eprintln!("Warning: no diagnostics to summarize");
        return;
    }

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    eprintln!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");
    eprintln!();
    eprintln!("{:<12} {:>12}", "Stage", "Mean (ms)");
    eprintln!("{}", "-".repeat(28));

    let stage_extractors: &[(&str, StageExtractor)] = &[
        ("Normalize", |d| d.normalize.duration),
        ("Optimize", |d| d.optimize.duration),
        ("Plan", |d| d.plan.duration),
        ("Fit", |d| d.fit.duration),
        ("Validate", |d| d.validate.duration),
    ];

    for (name, extractor) in stage_extractors {
        let stage_mean = all_diagnostics
            .iter()
            .map(|d| extractor(d).as_secs_f64() * 1000.0)
            .sum::<f64>()
            / all_diagnostics.len() as f64;
        eprintln!("{name:<12} {stage_mean:>10.3}ms");
    }
}
