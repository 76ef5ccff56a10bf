//! Synthesis diagnostics: timing and counts for each stage.
//!
//! Every call to [`synthesize_with_diagnostics`](crate::synthesize_with_diagnostics)
//! collects these alongside the program. They are meant for tuning machine
//! profiles (reload thresholds, retrace settings) against real drawings.
//!
//! Timestamps come from the `web-time` crate, which uses
//! `performance.now()` on WASM and `std::time::Instant` on native.
//! Durations are serialized as fractional seconds (`f64`), since
//! `std::time::Duration` does not implement serde traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single synthesis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisDiagnostics {
    /// Input normalization.
    pub normalize: StageDiagnostics,
    /// Stroke tour ordering.
    pub optimize: StageDiagnostics,
    /// Lead-in, chopping and choreography.
    pub plan: StageDiagnostics,
    /// Bed-fit transform.
    pub fit: StageDiagnostics,
    /// Bounds validation.
    pub validate: StageDiagnostics,
    /// Wall-clock duration of the whole run (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: SynthesisSummary,
}

/// Diagnostics for a single stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Normalization metrics.
    Normalize {
        /// Strokes after normalization.
        stroke_count: usize,
        /// Points across all strokes.
        point_count: usize,
    },
    /// Tour ordering metrics.
    Optimize {
        /// Pen-up distance in input order.
        travel_before: f64,
        /// Pen-up distance after reordering.
        travel_after: f64,
    },
    /// Planning metrics.
    Plan {
        /// Commands emitted.
        command_count: usize,
        /// Reload events inserted.
        reloads: usize,
        /// Retraces inserted.
        retraces: usize,
    },
    /// Bed-fit metrics.
    Fit {
        /// Uniform scale factor.
        scale: f64,
        /// X offset.
        offset_x: f64,
        /// Y offset.
        offset_y: f64,
    },
    /// Validation metrics.
    Validate {
        /// Commands in the validated program.
        command_count: usize,
    },
}

/// High-level summary for the whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisSummary {
    /// Strokes drawn.
    pub stroke_count: usize,
    /// Source points drawn.
    pub point_count: usize,
    /// Commands in the final program.
    pub command_count: usize,
    /// Reload events.
    pub reloads: usize,
    /// Retraces.
    pub retraces: usize,
    /// Bed-fit scale.
    pub scale: f64,
}

impl SynthesisDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Synthesis Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<12} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(72));

        let total_ms = duration_ms(self.total_duration);
        let stages = [
            ("Normalize", &self.normalize),
            ("Optimize", &self.optimize),
            ("Plan", &self.plan),
            ("Fit", &self.fit),
            ("Validate", &self.validate),
        ];

        for (name, diag) in stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<12} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        let s = &self.summary;
        lines.push(String::new());
        lines.push(format!(
            "Strokes: {}  |  Points: {}  |  Commands: {}  |  Reloads: {}  |  Retraces: {}  |  Scale: {:.4}",
            s.stroke_count, s.point_count, s.command_count, s.reloads, s.retraces, s.scale,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Normalize {
            stroke_count,
            point_count,
        } => format!("{stroke_count} strokes, {point_count} pts"),
        StageMetrics::Optimize {
            travel_before,
            travel_after,
        } => {
            let saved = if *travel_before > 0.0 {
                (1.0 - travel_after / travel_before) * 100.0
            } else {
                0.0
            };
            format!("travel {travel_before:.1} -> {travel_after:.1} ({saved:.1}% saved)")
        }
        StageMetrics::Plan {
            command_count,
            reloads,
            retraces,
        } => format!("{command_count} cmds, {reloads} reloads, {retraces} retraces"),
        StageMetrics::Fit {
            scale,
            offset_x,
            offset_y,
        } => format!("scale={scale:.4} offset=({offset_x:.2}, {offset_y:.2})"),
        StageMetrics::Validate { command_count } => format!("{command_count} cmds ok"),
    }
}

/// Runs a closure and records how long it took.
pub(crate) fn timed<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let start = web_time::Instant::now();
    let value = f();
    (value, start.elapsed())
}
