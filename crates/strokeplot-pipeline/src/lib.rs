//! strokeplot-pipeline: Pure toolpath synthesis engine (sans-IO).
//!
//! Converts 2D polyline strokes into a bounded sequence of motion
//! commands for a pen plotter or painting robot:
//! normalize -> tour order -> lead-in / chop / reload -> bed fit ->
//! bounds validation.
//!
//! This crate has **no I/O dependencies**. It takes parsed input and a
//! [`MachineConfig`] and returns a [`Program`]. Rendering the program as
//! machine text lives in `strokeplot-export`.

pub mod chop;
pub mod command;
pub mod config;
pub mod diagnostics;
pub mod fit;
pub mod lead;
pub mod normalize;
pub mod optimize;
pub mod paint;
pub mod synth;
pub mod types;
pub mod validate;

pub use command::{Command, CommandSequence, FittedSequence, Move, Pause, Program};
pub use config::{MachineConfig, PaintConfig, ReloadStrategy, RetraceConfig};
pub use diagnostics::SynthesisDiagnostics;
pub use fit::BedFit;
pub use normalize::StrokeInput;
pub use synth::{Plan, PlanStats, Synthesis, Synthesizer};
pub use types::{Envelope, PipelineError, Point, Polyline, Stroke, StrokeMode};

use diagnostics::{StageDiagnostics, StageMetrics, SynthesisSummary, timed};

/// Run the full synthesis pipeline on raw input.
///
/// # Pipeline steps
///
/// 1. Normalize the input shape into strokes
/// 2. Greedy nearest-neighbor stroke ordering
/// 3. Lead-ins, reload scheduling, retraces and paint choreography
/// 4. Uniform scale and centering into the machine envelope
/// 5. Bounds validation
///
/// # Errors
///
/// Returns the first [`PipelineError`] raised by any stage. No partial
/// program is produced.
pub fn synthesize(input: StrokeInput, config: &MachineConfig) -> Result<Synthesis, PipelineError> {
    Synthesizer::new(config.clone())?.run(input)
}

/// Run the pipeline on strokes that are already normalized.
///
/// # Errors
///
/// See [`synthesize`].
pub fn synthesize_strokes(
    strokes: Vec<Stroke>,
    config: &MachineConfig,
) -> Result<Synthesis, PipelineError> {
    Synthesizer::new(config.clone())?.run_strokes(strokes)
}

/// Run the full pipeline and collect per-stage diagnostics.
///
/// # Errors
///
/// See [`synthesize`].
pub fn synthesize_with_diagnostics(
    input: StrokeInput,
    config: &MachineConfig,
) -> Result<(Synthesis, SynthesisDiagnostics), PipelineError> {
    let start = web_time::Instant::now();
    let synth = Synthesizer::new(config.clone())?;

    let (strokes, normalize_time) =
        timed(|| normalize::normalize(input, config.brush_width_threshold));
    let strokes = strokes?;
    if strokes.is_empty() {
        return Err(PipelineError::EmptyStrokeSet);
    }
    let normalize_diag = StageDiagnostics {
        duration: normalize_time,
        metrics: StageMetrics::Normalize {
            stroke_count: strokes.len(),
            point_count: strokes.iter().map(Stroke::len).sum(),
        },
    };

    let travel_before = optimize::travel_distance(&strokes);
    let (ordered, optimize_time) = timed(|| optimize::optimize_stroke_order(strokes));
    let optimize_diag = StageDiagnostics {
        duration: optimize_time,
        metrics: StageMetrics::Optimize {
            travel_before,
            travel_after: optimize::travel_distance(&ordered),
        },
    };

    let (plan, plan_time) = timed(|| synth.plan(&ordered));
    let plan = plan?;
    let stats = plan.stats;
    let plan_diag = StageDiagnostics {
        duration: plan_time,
        metrics: StageMetrics::Plan {
            command_count: plan.sequence.len(),
            reloads: stats.reloads,
            retraces: stats.retraces,
        },
    };

    let (fitted, fit_time) = timed(|| fit::fit_to_bed(plan.sequence, &config.envelope));
    let (fitted, fit) = fitted?;
    let fit_diag = StageDiagnostics {
        duration: fit_time,
        metrics: StageMetrics::Fit {
            scale: fit.scale,
            offset_x: fit.offset_x,
            offset_y: fit.offset_y,
        },
    };

    let (program, validate_time) =
        timed(|| validate::validate_bounds(fitted, &config.envelope));
    let program = program?;
    let validate_diag = StageDiagnostics {
        duration: validate_time,
        metrics: StageMetrics::Validate {
            command_count: program.len(),
        },
    };

    let diagnostics = SynthesisDiagnostics {
        normalize: normalize_diag,
        optimize: optimize_diag,
        plan: plan_diag,
        fit: fit_diag,
        validate: validate_diag,
        total_duration: start.elapsed(),
        summary: SynthesisSummary {
            stroke_count: stats.strokes,
            point_count: stats.points,
            command_count: program.len(),
            reloads: stats.reloads,
            retraces: stats.retraces,
            scale: fit.scale,
        },
    };

    Ok((
        Synthesis {
            program,
            fit,
            stats,
        },
        diagnostics,
    ))
}
