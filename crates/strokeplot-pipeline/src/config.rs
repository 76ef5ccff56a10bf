//! Machine configuration.
//!
//! A [`MachineConfig`] is an immutable value handed to the engine at
//! construction. It replaces bed sizes, heights, feed rates and
//! thresholds that would otherwise be process-wide constants, so several
//! machine profiles can coexist and tests stay deterministic.
//!
//! All structs deserialize with `#[serde(default)]`, so a partial JSON
//! file only needs to name the fields it changes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{Envelope, PipelineError, Point};

/// Tuning for the extra-material retrace heuristic.
///
/// The heuristic is empirical. Its extent is exposed as parameters rather
/// than fixed, and `points = 0` disables it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetraceConfig {
    /// How many preceding points to retrace over. Zero disables retracing.
    pub points: usize,
    /// Smallest in-stroke point index at which a retrace may start.
    pub min_index: usize,
    /// Number of boundaries per reload threshold (4 = quarter-length).
    pub divisions: u32,
}

impl RetraceConfig {
    /// Default number of retraced points (disabled).
    pub const DEFAULT_POINTS: usize = 0;
    /// Default minimum in-stroke index.
    pub const DEFAULT_MIN_INDEX: usize = 4;
    /// Default boundary count per threshold.
    pub const DEFAULT_DIVISIONS: u32 = 4;

    /// Returns `true` if retracing is switched on.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.points > 0
    }
}

impl Default for RetraceConfig {
    fn default() -> Self {
        Self {
            points: Self::DEFAULT_POINTS,
            min_index: Self::DEFAULT_MIN_INDEX,
            divisions: Self::DEFAULT_DIVISIONS,
        }
    }
}

/// Paint-pot layout and choreography parameters for the painting robot.
///
/// Pot, wash and dry positions are bed coordinates outside the drawing
/// envelope. They are never rescaled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaintConfig {
    /// The single active color for this run.
    pub color: String,
    /// Registered pots by color name.
    pub pots: BTreeMap<String, Point>,
    /// Center of the wash pot.
    pub wash: Point,
    /// Corner of the absorbent dry region.
    pub dry: Point,
    /// Height for travel above pots.
    pub clearance_height: f64,
    /// Height the tool dips to inside a paint pot.
    pub dip_height: f64,
    /// Lateral spacing of the stirring grid.
    pub stir_step: f64,
    /// Stirring grid size per side.
    pub stir_grid: usize,
    /// Height the tool dips to inside the wash pot.
    pub wash_height: f64,
    /// Number of rings in the expanding wash pattern.
    pub wash_rings: usize,
    /// Dabs per ring.
    pub wash_spokes: usize,
    /// Radius growth per ring.
    pub wash_ring_step: f64,
    /// Height of the tool when touching the dry region.
    pub dry_height: f64,
    /// How far the tool lifts between taps.
    pub dry_tap_lift: f64,
    /// Tapping grid size per side.
    pub dry_grid: usize,
    /// Spacing of the tapping grid.
    pub dry_step: f64,
    /// Wash and dry before every mid-program reload, not only at the end.
    pub wash_on_reload: bool,
}

impl PaintConfig {
    /// Default active color.
    pub const DEFAULT_COLOR: &'static str = "black";

    /// Look up a pot, failing with [`PipelineError::UnknownColor`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::UnknownColor`] if `color` has no pot.
    pub fn pot(&self, color: &str) -> Result<Point, PipelineError> {
        self.pots
            .get(color)
            .copied()
            .ok_or_else(|| PipelineError::UnknownColor(color.to_owned()))
    }
}

impl Default for PaintConfig {
    fn default() -> Self {
        let pots = [
            ("red", Point::new(30.0, 30.0)),
            ("blue", Point::new(60.0, 30.0)),
            ("yellow", Point::new(90.0, 30.0)),
            ("black", Point::new(120.0, 30.0)),
        ]
        .into_iter()
        .map(|(name, p)| (name.to_owned(), p))
        .collect();

        Self {
            color: Self::DEFAULT_COLOR.to_owned(),
            pots,
            wash: Point::new(160.0, 30.0),
            dry: Point::new(180.0, 20.0),
            clearance_height: 70.0,
            dip_height: 28.0,
            stir_step: 2.0,
            stir_grid: 3,
            wash_height: 25.0,
            wash_rings: 3,
            wash_spokes: 6,
            wash_ring_step: 3.0,
            dry_height: 38.0,
            dry_tap_lift: 5.0,
            dry_grid: 3,
            dry_step: 6.0,
            wash_on_reload: false,
        }
    }
}

/// What happens when the drawing material runs out mid-stroke.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReloadStrategy {
    /// Stop and wait for an operator (pen plotter).
    #[default]
    Pause,
    /// Dip the brush again (painting robot).
    Paint(PaintConfig),
}

/// Immutable description of one machine profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Reachable drawing region.
    pub envelope: Envelope,
    /// Z height at which the tool touches the bed.
    pub draw_height: f64,
    /// Extra Z above `draw_height` used when lifting off a stroke.
    pub backoff_height: f64,
    /// Fraction of `backoff_height` used for the lead-in approach.
    pub lead_in_height_ratio: f64,
    /// Feed rate for every move.
    pub feed_rate: f64,
    /// Distance of the lead-in entry point behind a stroke's first point.
    pub lead_in_standoff: f64,
    /// Inset applied when clamping lead-in entry points.
    pub lead_in_margin: f64,
    /// Drawn distance after which material is reloaded.
    pub max_stroke_length: f64,
    /// Weight above which non-draw document strokes are widened.
    pub brush_width_threshold: f64,
    /// Extra-material retrace tuning.
    pub retrace: RetraceConfig,
    /// Emit an operator pause before the first stroke.
    pub initial_pause: bool,
    /// Reload behaviour.
    pub reload: ReloadStrategy,
}

impl MachineConfig {
    /// Default drawing envelope.
    pub const DEFAULT_ENVELOPE: Envelope = Envelope::new(10.0, 200.0, 60.0, 200.0);
    /// Default draw height.
    pub const DEFAULT_DRAW_HEIGHT: f64 = 40.0;
    /// Default backoff height.
    pub const DEFAULT_BACKOFF_HEIGHT: f64 = 30.0;
    /// Default lead-in height ratio.
    pub const DEFAULT_LEAD_IN_HEIGHT_RATIO: f64 = 0.6;
    /// Default feed rate.
    pub const DEFAULT_FEED_RATE: f64 = 1800.0;
    /// Default lead-in standoff.
    pub const DEFAULT_LEAD_IN_STANDOFF: f64 = 20.0;
    /// Default lead-in clamp margin.
    pub const DEFAULT_LEAD_IN_MARGIN: f64 = 2.0;
    /// Default reload threshold.
    pub const DEFAULT_MAX_STROKE_LENGTH: f64 = 460.0;
    /// Default brush-width threshold.
    pub const DEFAULT_BRUSH_WIDTH_THRESHOLD: f64 = 5.0;

    /// Pen plotter profile: operator pauses, no retrace.
    #[must_use]
    pub fn pen_plotter() -> Self {
        Self::default()
    }

    /// Painting robot profile: pot reloads and quarter-length retraces.
    #[must_use]
    pub fn paint_robot() -> Self {
        Self {
            max_stroke_length: 150.0,
            retrace: RetraceConfig {
                points: 3,
                ..RetraceConfig::default()
            },
            initial_pause: false,
            reload: ReloadStrategy::Paint(PaintConfig::default()),
            ..Self::default()
        }
    }

    /// Z used for lifts and travel between strokes.
    #[must_use]
    pub fn travel_height(&self) -> f64 {
        self.draw_height + self.backoff_height
    }

    /// Z used for the rapid approach to a lead-in entry point.
    #[must_use]
    pub fn lead_in_height(&self) -> f64 {
        self.backoff_height
            .mul_add(self.lead_in_height_ratio, self.draw_height)
    }

    /// The paint settings, if this is a painting profile.
    #[must_use]
    pub const fn paint(&self) -> Option<&PaintConfig> {
        match &self.reload {
            ReloadStrategy::Paint(paint) => Some(paint),
            ReloadStrategy::Pause => None,
        }
    }

    /// Check the invariants the engine relies on.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] naming the first bad field,
    /// or [`PipelineError::UnknownColor`] if the active paint color has no
    /// registered pot.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let env = &self.envelope;
        let invalid = |msg: String| Err(PipelineError::InvalidConfig(msg));

        if !(env.min_x < env.max_x && env.min_y < env.max_y) {
            return invalid(format!("envelope has no area: {env:?}"));
        }
        if !(self.feed_rate > 0.0) {
            return invalid(format!("feed_rate must be positive, got {}", self.feed_rate));
        }
        if !(self.max_stroke_length > 0.0) {
            return invalid(format!(
                "max_stroke_length must be positive, got {}",
                self.max_stroke_length
            ));
        }
        if self.draw_height < 0.0 || self.backoff_height < 0.0 {
            return invalid("heights must not be negative".to_owned());
        }
        if self.lead_in_standoff < 0.0 || self.lead_in_margin < 0.0 {
            return invalid("lead-in standoff and margin must not be negative".to_owned());
        }
        if !(0.0..=1.0).contains(&self.lead_in_height_ratio) {
            return invalid(format!(
                "lead_in_height_ratio must be within 0..=1, got {}",
                self.lead_in_height_ratio
            ));
        }
        if self.retrace.divisions == 0 {
            return invalid("retrace.divisions must be at least 1".to_owned());
        }
        if let Some(paint) = self.paint() {
            if paint.stir_grid == 0 || paint.dry_grid == 0 {
                return invalid("paint grids must be at least 1x1".to_owned());
            }
            paint.pot(&paint.color)?;
        }
        Ok(())
    }
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            envelope: Self::DEFAULT_ENVELOPE,
            draw_height: Self::DEFAULT_DRAW_HEIGHT,
            backoff_height: Self::DEFAULT_BACKOFF_HEIGHT,
            lead_in_height_ratio: Self::DEFAULT_LEAD_IN_HEIGHT_RATIO,
            feed_rate: Self::DEFAULT_FEED_RATE,
            lead_in_standoff: Self::DEFAULT_LEAD_IN_STANDOFF,
            lead_in_margin: Self::DEFAULT_LEAD_IN_MARGIN,
            max_stroke_length: Self::DEFAULT_MAX_STROKE_LENGTH,
            brush_width_threshold: Self::DEFAULT_BRUSH_WIDTH_THRESHOLD,
            retrace: RetraceConfig::default(),
            initial_pause: true,
            reload: ReloadStrategy::Pause,
        }
    }
}
