//! Paint-pot, wash and dry choreography for the painting robot.
//!
//! Every move produced here is flagged immune to limits: pots, the wash
//! pot and the dry region sit outside the drawing envelope, so these moves
//! are left out of bed fitting and bounds validation.
//!
//! - **Load color**: travel above the pot at clearance height, dip, stir
//!   over a small square grid of lateral offsets, return to the pot center
//!   and retract.
//! - **Wash**: dip into the wash pot and agitate with an expanding radial
//!   pattern (each dab goes out from the center and back).
//! - **Dry**: tap the tool on an absorbent region over a grid, then
//!   return to travel height.

use std::collections::BTreeMap;
use std::f64::consts::TAU;

use crate::command::{Command, Move};
use crate::config::PaintConfig;
use crate::types::{PipelineError, Point};

/// Where each color lives on the bed, and which one is on the tool.
#[derive(Debug, Clone, PartialEq)]
pub struct PotRegistry {
    pots: BTreeMap<String, Point>,
    loaded: Option<String>,
}

impl PotRegistry {
    /// A registry with nothing loaded.
    #[must_use]
    pub const fn new(pots: BTreeMap<String, Point>) -> Self {
        Self { pots, loaded: None }
    }

    /// Position of the pot holding `color`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::UnknownColor`] if no pot is registered.
    pub fn position(&self, color: &str) -> Result<Point, PipelineError> {
        self.pots
            .get(color)
            .copied()
            .ok_or_else(|| PipelineError::UnknownColor(color.to_owned()))
    }

    /// The color currently on the tool.
    #[must_use]
    pub fn loaded(&self) -> Option<&str> {
        self.loaded.as_deref()
    }
}

/// Builds pot, wash and dry move sequences for one synthesis run.
#[derive(Debug, Clone)]
pub struct Choreographer {
    params: PaintConfig,
    registry: PotRegistry,
    travel_height: f64,
    feed: f64,
}

impl Choreographer {
    /// Snapshot the paint settings for one run.
    #[must_use]
    pub fn new(params: &PaintConfig, travel_height: f64, feed: f64) -> Self {
        Self {
            registry: PotRegistry::new(params.pots.clone()),
            params: params.clone(),
            travel_height,
            feed,
        }
    }

    /// The pot registry.
    #[must_use]
    pub const fn registry(&self) -> &PotRegistry {
        &self.registry
    }

    /// The active color of this run.
    #[must_use]
    pub fn active_color(&self) -> &str {
        &self.params.color
    }

    /// Dip the tool into `color` and stir.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::UnknownColor`] if `color` has no pot. No
    /// moves are produced in that case.
    pub fn load_color(&mut self, color: &str) -> Result<Vec<Command>, PipelineError> {
        let pot = self.registry.position(color)?;
        let p = &self.params;
        let mut moves = Vec::with_capacity(p.stir_grid * p.stir_grid + 4);

        moves.push(self.rapid(pot.x, pot.y, p.clearance_height));
        moves.push(self.linear(pot.x, pot.y, p.dip_height));
        for (dx, dy) in grid_offsets(p.stir_grid, p.stir_step, true) {
            moves.push(self.linear(pot.x + dx, pot.y + dy, p.dip_height));
        }
        moves.push(self.linear(pot.x, pot.y, p.dip_height));
        moves.push(self.linear(pot.x, pot.y, p.clearance_height));

        tracing::debug!(color, moves = moves.len(), "load color");
        self.registry.loaded = Some(color.to_owned());
        Ok(moves)
    }

    /// Agitate the tool in the wash pot.
    #[must_use]
    pub fn wash(&self) -> Vec<Command> {
        let p = &self.params;
        let center = p.wash;
        let mut moves = Vec::with_capacity(p.wash_rings * p.wash_spokes * 2 + 3);

        moves.push(self.rapid(center.x, center.y, p.clearance_height));
        moves.push(self.linear(center.x, center.y, p.wash_height));
        for ring in 1..=p.wash_rings {
            #[allow(clippy::cast_precision_loss)]
            let radius = ring as f64 * p.wash_ring_step;
            for spoke in 0..p.wash_spokes {
                #[allow(clippy::cast_precision_loss)]
                let angle = TAU * spoke as f64 / p.wash_spokes as f64;
                moves.push(self.linear(
                    radius.mul_add(angle.cos(), center.x),
                    radius.mul_add(angle.sin(), center.y),
                    p.wash_height,
                ));
                moves.push(self.linear(center.x, center.y, p.wash_height));
            }
        }
        moves.push(self.linear(center.x, center.y, p.clearance_height));
        moves
    }

    /// Tap the tool dry and return to travel height.
    ///
    /// Clears the loaded color.
    #[must_use]
    pub fn dry(&mut self) -> Vec<Command> {
        let p = &self.params;
        let origin = p.dry;
        let up = p.dry_height + p.dry_tap_lift;
        let mut moves = Vec::with_capacity(p.dry_grid * p.dry_grid * 2 + 2);

        moves.push(self.rapid(origin.x, origin.y, p.clearance_height));
        let mut last = origin;
        for (dx, dy) in grid_offsets(p.dry_grid, p.dry_step, false) {
            last = Point::new(origin.x + dx, origin.y + dy);
            moves.push(self.linear(last.x, last.y, up));
            moves.push(self.linear(last.x, last.y, p.dry_height));
        }
        moves.push(self.linear(last.x, last.y, self.travel_height));

        self.registry.loaded = None;
        moves
    }

    /// Replenish paint in the middle of the program.
    ///
    /// Re-dips the active color, preceded by a wash and dry when
    /// `wash_on_reload` is set.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::UnknownColor`] if the active color has no pot.
    pub fn reload(&mut self) -> Result<Vec<Command>, PipelineError> {
        let mut moves = Vec::new();
        if self.params.wash_on_reload {
            moves.extend(self.wash());
            moves.extend(self.dry());
        }
        let color = self.params.color.clone();
        moves.extend(self.load_color(&color)?);
        Ok(moves)
    }

    /// Clean the tool after the last stroke.
    #[must_use]
    pub fn finish(&mut self) -> Vec<Command> {
        let mut moves = self.wash();
        moves.extend(self.dry());
        moves
    }

    fn rapid(&self, x: f64, y: f64, z: f64) -> Command {
        Move::rapid(x, y, z, self.feed).immune().into()
    }

    fn linear(&self, x: f64, y: f64, z: f64) -> Command {
        Move::linear(x, y, z, self.feed).immune().into()
    }
}

/// Row-major offsets of an `n` x `n` grid with spacing `step`.
///
/// Centered grids straddle the origin; otherwise the grid starts at it.
#[allow(clippy::cast_precision_loss)]
fn grid_offsets(n: usize, step: f64, centered: bool) -> impl Iterator<Item = (f64, f64)> {
    let shift = if centered {
        n.saturating_sub(1) as f64 * step / 2.0
    } else {
        0.0
    };
    (0..n).flat_map(move |row| {
        (0..n).map(move |col| {
            (
                (col as f64).mul_add(step, -shift),
                (row as f64).mul_add(step, -shift),
            )
        })
    })
}
