//! The synthesis driver: strokes in, validated program out.
//!
//! A [`Synthesizer`] holds one validated [`MachineConfig`]. Each call to
//! [`Synthesizer::run`] owns all of its state (reload accumulator, pot
//! registry snapshot, command sequence), so one synthesizer can serve any
//! number of independent requests.

use serde::{Deserialize, Serialize};

use crate::chop::{ReloadScheduler, Reloader};
use crate::command::{CommandSequence, Pause, Program};
use crate::config::MachineConfig;
use crate::fit::{BedFit, fit_to_bed};
use crate::lead::{LeadPlanner, planning_region};
use crate::normalize::{StrokeInput, normalize};
use crate::optimize::optimize_stroke_order;
use crate::types::{PipelineError, Stroke};
use crate::validate::validate_bounds;

/// Offset of the initial operator pause from the envelope's minimum corner.
const INITIAL_PAUSE_OFFSET: (f64, f64) = (10.0, 30.0);

/// Counts gathered while planning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStats {
    /// Strokes drawn.
    pub strokes: usize,
    /// Source points drawn.
    pub points: usize,
    /// Reload events inserted.
    pub reloads: usize,
    /// Retraces inserted.
    pub retraces: usize,
}

/// The unfitted command sequence for a stroke set.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    /// Commands in source units.
    pub sequence: CommandSequence,
    /// What the planner did.
    pub stats: PlanStats,
}

/// A completed synthesis run.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    /// The validated program, ready for emission.
    pub program: Program,
    /// The bed-fit transform that was applied.
    pub fit: BedFit,
    /// What the planner did.
    pub stats: PlanStats,
}

/// Runs the synthesis stages for one machine profile.
#[derive(Debug, Clone)]
pub struct Synthesizer {
    config: MachineConfig,
}

impl Synthesizer {
    /// Wrap a configuration after validating it.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] or
    /// [`PipelineError::UnknownColor`] from [`MachineConfig::validate`].
    pub fn new(config: MachineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The machine profile.
    #[must_use]
    pub const fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Emit the command sequence for strokes already in drawing order.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyStrokeSet`] if there is nothing to
    /// draw, or [`PipelineError::UnknownColor`] from the paint reloader.
    pub fn plan(&self, strokes: &[Stroke]) -> Result<Plan, PipelineError> {
        let region = planning_region(strokes.iter().flat_map(Stroke::points))
            .ok_or(PipelineError::EmptyStrokeSet)?;

        let config = &self.config;
        let lead = LeadPlanner::new(config, region);
        let mut reloader = Reloader::from_config(config);
        let mut scheduler = ReloadScheduler::new(config);
        let mut seq = CommandSequence::new();

        if config.initial_pause {
            let (dx, dy) = INITIAL_PAUSE_OFFSET;
            seq.push(Pause::new(
                config.envelope.min_x + dx,
                config.envelope.min_y + dy,
                config.draw_height,
                config.feed_rate,
            ));
        }
        seq.extend(reloader.begin()?);

        let mut stats = PlanStats::default();
        for stroke in strokes.iter().filter(|s| !s.is_empty()) {
            scheduler.draw_stroke(stroke.points(), &lead, &mut reloader, &mut seq)?;
            stats.strokes += 1;
            stats.points += stroke.len();
        }
        seq.extend(reloader.finish());

        stats.reloads = scheduler.reloads();
        stats.retraces = scheduler.retraces();
        tracing::info!(
            strokes = stats.strokes,
            reloads = stats.reloads,
            retraces = stats.retraces,
            commands = seq.len(),
            "planned toolpath"
        );
        Ok(Plan {
            sequence: seq,
            stats,
        })
    }

    /// Optimize, plan, fit and validate normalized strokes.
    ///
    /// # Errors
    ///
    /// Any [`PipelineError`] raised by a stage. Nothing is returned on
    /// failure.
    pub fn run_strokes(&self, strokes: Vec<Stroke>) -> Result<Synthesis, PipelineError> {
        if strokes.is_empty() {
            return Err(PipelineError::EmptyStrokeSet);
        }
        let ordered = optimize_stroke_order(strokes);
        let plan = self.plan(&ordered)?;
        let (fitted, fit) = fit_to_bed(plan.sequence, &self.config.envelope)?;
        let program = validate_bounds(fitted, &self.config.envelope)?;
        Ok(Synthesis {
            program,
            fit,
            stats: plan.stats,
        })
    }

    /// Normalize raw input, then run every stage.
    ///
    /// # Errors
    ///
    /// Any [`PipelineError`] raised by a stage.
    pub fn run(&self, input: StrokeInput) -> Result<Synthesis, PipelineError> {
        let strokes = normalize(input, self.config.brush_width_threshold)?;
        self.run_strokes(strokes)
    }
}
