//! Lead-in and lead-out geometry.
//!
//! Before a stroke starts, the tool travels rapidly at a reduced height to
//! an entry point placed a fixed standoff behind the stroke's first point,
//! along the stroke's initial tangent. From there it plunges onto the
//! first point, so the approach flows into the stroke direction.
//!
//! Entry points are clamped into the planning region (the bounds of the
//! whole stroke set, in source units) so a lead-in never widens the area
//! the bed fit has to cover.
//!
//! Before leaving a stroke, the tool lifts straight up to travel height.

use crate::command::{CommandSequence, Move};
use crate::config::MachineConfig;
use crate::types::{Envelope, Point};

/// Unit direction from the first point toward the first distinct point.
///
/// Returns `None` when the slice is empty or all points coincide.
///
/// A vertical tangent has no slope; it is resolved directly to `(0, ±1)`
/// instead of going through the slope computation.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn tangent(points: &[Point]) -> Option<(f64, f64)> {
    let origin = *points.first()?;
    let next = points.iter().skip(1).find(|p| **p != origin)?;
    let dx = next.x - origin.x;
    let dy = next.y - origin.y;

    if dx == 0.0 {
        return Some((0.0, dy.signum()));
    }

    // atan folds the direction into (-pi/2, pi/2); dx's sign restores it.
    let angle = (dy / dx).atan();
    let sign = dx.signum();
    Some((sign * angle.cos(), sign * angle.sin()))
}

/// Entry point `standoff` behind `points[0]`, clamped into `region`.
///
/// Returns `None` when there is no usable tangent.
#[must_use]
pub fn entry_point(points: &[Point], standoff: f64, region: &Envelope, margin: f64) -> Option<Point> {
    let start = *points.first()?;
    let (ux, uy) = tangent(points)?;
    let x = (-standoff).mul_add(ux, start.x);
    let y = (-standoff).mul_add(uy, start.y);
    Some(Point::new(
        clamp_axis(x, region.min_x, region.max_x, margin),
        clamp_axis(y, region.min_y, region.max_y, margin),
    ))
}

/// Pull `value` back inside `[lo, hi]`, landing `margin` inside the edge.
///
/// If the range is too narrow for the margin, out-of-range values land
/// on its midpoint.
fn clamp_axis(value: f64, lo: f64, hi: f64, margin: f64) -> f64 {
    if value >= lo && value <= hi {
        value
    } else if hi - lo <= 2.0 * margin {
        f64::midpoint(lo, hi)
    } else if value < lo {
        lo + margin
    } else {
        hi - margin
    }
}

/// Emits approach and lift moves for one synthesis run.
#[derive(Debug, Clone)]
pub struct LeadPlanner {
    region: Envelope,
    standoff: f64,
    margin: f64,
    draw_z: f64,
    lead_z: f64,
    travel_z: f64,
    feed: f64,
}

impl LeadPlanner {
    /// Planner for strokes whose combined bounds are `region`.
    #[must_use]
    pub fn new(config: &MachineConfig, region: Envelope) -> Self {
        Self {
            region,
            standoff: config.lead_in_standoff,
            margin: config.lead_in_margin,
            draw_z: config.draw_height,
            lead_z: config.lead_in_height(),
            travel_z: config.travel_height(),
            feed: config.feed_rate,
        }
    }

    /// Bring the tool down onto `points[0]`.
    ///
    /// With a usable tangent: rapid to the entry point at lead-in height,
    /// then plunge to the first point. Otherwise (a single point, or all
    /// points coincide): rapid above the first point at travel height,
    /// then plunge.
    pub fn approach(&self, seq: &mut CommandSequence, points: &[Point]) {
        let Some(&start) = points.first() else {
            return;
        };

        match entry_point(points, self.standoff, &self.region, self.margin) {
            Some(entry) => seq.push(Move::rapid(entry.x, entry.y, self.lead_z, self.feed)),
            None => seq.push(Move::rapid(start.x, start.y, self.travel_z, self.feed)),
        }
        seq.push(Move::linear(start.x, start.y, self.draw_z, self.feed));
    }

    /// Pen-down move to `point`.
    pub fn draw(&self, seq: &mut CommandSequence, point: Point) {
        seq.push(Move::linear(point.x, point.y, self.draw_z, self.feed));
    }

    /// Lift straight up at `at` to travel height.
    pub fn lift(&self, seq: &mut CommandSequence, at: Point) {
        seq.push(Move::linear(at.x, at.y, self.travel_z, self.feed));
    }
}

/// Combined bounds of all points, or `None` if there are none.
#[must_use]
pub fn planning_region<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Envelope> {
    points.into_iter().fold(None, |acc, p| {
        Some(acc.map_or_else(
            || Envelope::new(p.x, p.x, p.y, p.y),
            |env: Envelope| {
                Envelope::new(
                    env.min_x.min(p.x),
                    env.max_x.max(p.x),
                    env.min_y.min(p.y),
                    env.max_y.max(p.y),
                )
            },
        ))
    })
}
