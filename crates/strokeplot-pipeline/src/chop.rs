//! Segment chopper and reload scheduler.
//!
//! Drawn distance is accumulated point by point. Once it reaches the
//! machine's `max_stroke_length`, the tool lifts at the current point, a
//! reload event runs, and (if the stroke continues) the lead-in planner
//! brings the tool back onto the current point, heading for the next one.
//! The accumulator is reset to zero right after every reload.
//!
//! Reloads are only ever inserted between two points of one stroke (or
//! after its last point); points are never split and never reordered. If
//! every segment of a stroke of length `L` divides the threshold `T`,
//! exactly `⌊L/T⌋` reloads are inserted. Coarser strokes get at most that
//! many, since each reload consumes at least `T` of drawn distance.
//!
//! The accumulator carries over from one stroke to the next: it measures
//! material used since the last reload, not stroke length.
//!
//! ## Retrace
//!
//! With [`RetraceConfig::points`] above zero, every time the accumulator
//! crosses another `1 / divisions` fraction of the threshold at an
//! in-stroke index of at least `min_index`, the tool runs back over up to
//! `points` preceding points and forward again without lifting, to deposit
//! extra material. The heuristic is empirical. Retraced distance does not
//! count toward the accumulator.

use crate::command::{Command, CommandSequence, Pause};
use crate::config::{MachineConfig, ReloadStrategy, RetraceConfig};
use crate::lead::LeadPlanner;
use crate::paint::Choreographer;
use crate::types::{PipelineError, Point};

/// The reload event for the configured machine variant.
#[derive(Debug, Clone)]
pub enum Reloader {
    /// Stop for an operator at travel height.
    Pause {
        /// Z of the pause.
        z: f64,
        /// Feed rate recorded on the pause.
        feed: f64,
    },
    /// Re-dip the brush.
    Paint(Choreographer),
}

impl Reloader {
    /// Pick the reload event for `config`.
    #[must_use]
    pub fn from_config(config: &MachineConfig) -> Self {
        match &config.reload {
            ReloadStrategy::Pause => Self::Pause {
                z: config.travel_height(),
                feed: config.feed_rate,
            },
            ReloadStrategy::Paint(paint) => Self::Paint(Choreographer::new(
                paint,
                config.travel_height(),
                config.feed_rate,
            )),
        }
    }

    /// Commands that prepare the tool before the first stroke.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::UnknownColor`] if the active paint color
    /// has no pot.
    pub fn begin(&mut self) -> Result<Vec<Command>, PipelineError> {
        match self {
            Self::Pause { .. } => Ok(Vec::new()),
            Self::Paint(choreographer) => {
                let color = choreographer.active_color().to_owned();
                choreographer.load_color(&color)
            }
        }
    }

    /// Commands that replenish material with the tool lifted at `at`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::UnknownColor`] if the active paint color
    /// has no pot.
    pub fn reload(&mut self, at: Point) -> Result<Vec<Command>, PipelineError> {
        match self {
            Self::Pause { z, feed } => Ok(vec![Pause::new(at.x, at.y, *z, *feed).into()]),
            Self::Paint(choreographer) => choreographer.reload(),
        }
    }

    /// Commands that run after the last stroke.
    #[must_use]
    pub fn finish(&mut self) -> Vec<Command> {
        match self {
            Self::Pause { .. } => Vec::new(),
            Self::Paint(choreographer) => choreographer.finish(),
        }
    }
}

/// Walks strokes, emitting draw moves with reloads and retraces in between.
#[derive(Debug, Clone)]
pub struct ReloadScheduler {
    threshold: f64,
    retrace: RetraceConfig,
    travelled: f64,
    boundaries_passed: u32,
    reloads: usize,
    retraces: usize,
}

impl ReloadScheduler {
    /// A scheduler with an empty accumulator.
    #[must_use]
    pub fn new(config: &MachineConfig) -> Self {
        Self {
            threshold: config.max_stroke_length,
            retrace: config.retrace.clone(),
            travelled: 0.0,
            boundaries_passed: 0,
            reloads: 0,
            retraces: 0,
        }
    }

    /// Drawn distance since the last reload.
    #[must_use]
    pub const fn travelled(&self) -> f64 {
        self.travelled
    }

    /// Reloads inserted so far.
    #[must_use]
    pub const fn reloads(&self) -> usize {
        self.reloads
    }

    /// Retraces inserted so far.
    #[must_use]
    pub const fn retraces(&self) -> usize {
        self.retraces
    }

    /// Emit one complete stroke: approach, points, reloads, lead-out.
    ///
    /// # Errors
    ///
    /// Propagates reload failures ([`PipelineError::UnknownColor`]).
    pub fn draw_stroke(
        &mut self,
        points: &[Point],
        lead: &LeadPlanner,
        reloader: &mut Reloader,
        seq: &mut CommandSequence,
    ) -> Result<(), PipelineError> {
        let Some(&first) = points.first() else {
            return Ok(());
        };

        lead.approach(seq, points);
        let mut tool_down = true;
        let mut current = first;
        // Index of the point the tool last came down on.
        let mut segment_start = 0;

        for (i, &point) in points.iter().enumerate().skip(1) {
            lead.draw(seq, point);
            self.travelled += current.distance(point);
            current = point;

            if self.travelled >= self.threshold {
                lead.lift(seq, point);
                seq.extend(reloader.reload(point)?);
                self.travelled = 0.0;
                self.boundaries_passed = 0;
                self.reloads += 1;
                segment_start = i;

                if i + 1 < points.len() {
                    lead.approach(seq, &points[i..]);
                } else {
                    tool_down = false;
                }
                continue;
            }

            if self.retrace.is_enabled() && self.crossed_boundary() && i >= self.retrace.min_index {
                self.emit_retrace(&points[segment_start..=i], lead, seq);
            }
        }

        if tool_down {
            lead.lift(seq, current);
        }
        Ok(())
    }

    /// Whether the accumulator entered a new retrace division since the
    /// last check. Records the new division.
    fn crossed_boundary(&mut self) -> bool {
        let division = self.threshold / f64::from(self.retrace.divisions);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let passed = (self.travelled / division).floor() as u32;
        if passed > self.boundaries_passed {
            self.boundaries_passed = passed;
            true
        } else {
            false
        }
    }

    /// Run back over the tail of `drawn` and forward again.
    ///
    /// `drawn` ends with the current point and starts where the tool last
    /// came down, so a retrace never reaches across a reload.
    fn emit_retrace(&mut self, drawn: &[Point], lead: &LeadPlanner, seq: &mut CommandSequence) {
        let Some(last) = drawn.len().checked_sub(1) else {
            return;
        };
        let depth = self.retrace.points.min(last);
        if depth == 0 {
            return;
        }

        for &p in drawn[last - depth..last].iter().rev() {
            lead.draw(seq, p);
        }
        for &p in &drawn[last - depth + 1..=last] {
            lead.draw(seq, p);
        }
        self.retraces += 1;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::PaintConfig;
    use crate::lead::planning_region;

    fn line(length: usize) -> Vec<Point> {
        #[allow(clippy::cast_precision_loss)]
        (0..=length).map(|i| Point::new(i as f64, 0.0)).collect()
    }

    fn config(threshold: f64) -> MachineConfig {
        MachineConfig {
            max_stroke_length: threshold,
            ..MachineConfig::default()
        }
    }

    fn run(config: &MachineConfig, strokes: &[Vec<Point>]) -> (ReloadScheduler, CommandSequence) {
        let region = planning_region(strokes.iter().flatten()).unwrap();
        let lead = LeadPlanner::new(config, region);
        let mut reloader = Reloader::from_config(config);
        let mut scheduler = ReloadScheduler::new(config);
        let mut seq = CommandSequence::new();
        for stroke in strokes {
            scheduler
                .draw_stroke(stroke, &lead, &mut reloader, &mut seq)
                .unwrap();
        }
        (scheduler, seq)
    }

    fn pauses(seq: &CommandSequence) -> Vec<Pause> {
        seq.commands()
            .iter()
            .filter_map(|c| match c {
                Command::Pause(p) => Some(*p),
                Command::Move(_) => None,
            })
            .collect()
    }

    fn drawn_points(seq: &CommandSequence, draw_z: f64) -> Vec<(f64, f64)> {
        seq.commands()
            .iter()
            .filter_map(|c| match c {
                Command::Move(m) if (m.z() - draw_z).abs() < 1e-12 => Some((m.x(), m.y())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn reload_count_is_floor_of_length_over_threshold() {
        let config = config(25.0);
        let (scheduler, seq) = run(&config, &[line(110)]);
        assert_eq!(scheduler.reloads(), 4);
        assert_eq!(pauses(&seq).len(), 4);
        assert!((scheduler.travelled() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn accumulator_resets_after_reload_at_stroke_end() {
        let config = config(25.0);
        let (scheduler, seq) = run(&config, &[line(50)]);
        assert_eq!(scheduler.reloads(), 2);
        assert!(scheduler.travelled().abs() < f64::EPSILON);
        // Tool is already up after the final reload: no second lift.
        assert!(matches!(seq.last(), Some(Command::Pause(_))));
    }

    #[test]
    fn short_stroke_has_no_reload() {
        let (scheduler, seq) = run(&config(460.0), &[line(100)]);
        assert_eq!(scheduler.reloads(), 0);
        assert!(pauses(&seq).is_empty());
        let Some(Command::Move(last)) = seq.last() else {
            unreachable!("stroke ends with a lift");
        };
        assert!((last.z() - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn reload_is_lift_pause_then_lead_in() {
        let config = config(5.0);
        let (_, seq) = run(&config, &[line(8)]);
        let commands = seq.commands();
        let pause_at = commands
            .iter()
            .position(|c| matches!(c, Command::Pause(_)))
            .unwrap();

        let Command::Move(lift) = commands[pause_at - 1] else {
            unreachable!("lift precedes pause");
        };
        assert_eq!((lift.x(), lift.y()), (5.0, 0.0));
        assert!((lift.z() - config.travel_height()).abs() < 1e-12);

        let Command::Move(entry) = commands[pause_at + 1] else {
            unreachable!("lead-in follows pause");
        };
        assert!(entry.is_rapid());
        let Command::Move(plunge) = commands[pause_at + 2] else {
            unreachable!("plunge follows lead-in");
        };
        assert_eq!((plunge.x(), plunge.y()), (5.0, 0.0));
        assert!((plunge.z() - config.draw_height).abs() < 1e-12);
    }

    #[test]
    fn point_order_is_preserved() {
        let config = config(7.0);
        let (_, seq) = run(&config, &[line(30)]);
        let drawn = drawn_points(&seq, config.draw_height);
        let mut dedup = drawn.clone();
        dedup.dedup();
        let expected: Vec<(f64, f64)> = line(30).iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(dedup, expected);
    }

    #[test]
    fn accumulator_carries_across_strokes() {
        let config = config(25.0);
        let second: Vec<Point> = (0..=15)
            .map(|i| Point::new(f64::from(i), 10.0))
            .collect();
        let (scheduler, _) = run(&config, &[line(15), second]);
        assert_eq!(scheduler.reloads(), 1);
        assert!((scheduler.travelled() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn retrace_runs_back_and_forth_at_quarter_boundaries() {
        let config = MachineConfig {
            max_stroke_length: 40.0,
            retrace: RetraceConfig {
                points: 3,
                min_index: 4,
                divisions: 4,
            },
            ..MachineConfig::default()
        };
        let (scheduler, seq) = run(&config, &[line(30)]);
        // Boundaries at 10, 20, 30.
        assert_eq!(scheduler.retraces(), 3);

        let drawn = drawn_points(&seq, config.draw_height);
        let at_ten = drawn.iter().position(|&p| p == (10.0, 0.0)).unwrap();
        let expected = [(9.0, 0.0), (8.0, 0.0), (7.0, 0.0), (8.0, 0.0), (9.0, 0.0), (10.0, 0.0)];
        assert_eq!(&drawn[at_ten + 1..at_ten + 7], &expected);
    }

    #[test]
    fn retrace_respects_min_index() {
        let config = MachineConfig {
            max_stroke_length: 8.0,
            retrace: RetraceConfig {
                points: 2,
                min_index: 6,
                divisions: 4,
            },
            ..MachineConfig::default()
        };
        // Boundaries at 2, 4, 6: only index 6 qualifies.
        let (scheduler, _) = run(&config, &[line(7)]);
        assert_eq!(scheduler.retraces(), 1);
    }

    #[test]
    fn retrace_never_crosses_a_reload() {
        let config = MachineConfig {
            max_stroke_length: 10.0,
            retrace: RetraceConfig {
                points: 5,
                min_index: 0,
                divisions: 2,
            },
            ..MachineConfig::default()
        };
        let (_, seq) = run(&config, &[line(16)]);
        let commands = seq.commands();
        let pause_at = commands
            .iter()
            .position(|c| matches!(c, Command::Pause(_)))
            .unwrap();
        // After the reload at x=10 the next boundary is at x=15; the retrace
        // there may go back at most to x=10.
        let min_x_after = commands[pause_at..]
            .iter()
            .filter_map(|c| match c {
                Command::Move(m) if !m.is_rapid() => Some(m.x()),
                _ => None,
            })
            .fold(f64::INFINITY, f64::min);
        assert!((min_x_after - 10.0).abs() < 1e-12, "min x {min_x_after}");
    }

    #[test]
    fn paint_reload_uses_immune_choreography() {
        let config = MachineConfig {
            max_stroke_length: 20.0,
            ..MachineConfig::paint_robot()
        };
        let (scheduler, seq) = run(&config, &[line(45)]);
        assert_eq!(scheduler.reloads(), 2);
        assert!(pauses(&seq).is_empty());
        let immune = seq
            .commands()
            .iter()
            .filter(|c| matches!(c, Command::Move(m) if m.is_immune()))
            .count();
        assert_eq!(immune, 2 * 13);
    }

    #[test]
    fn paint_reload_with_unknown_color_fails() {
        let config = MachineConfig {
            max_stroke_length: 5.0,
            reload: ReloadStrategy::Paint(PaintConfig {
                color: "mauve".to_owned(),
                ..PaintConfig::default()
            }),
            ..MachineConfig::default()
        };
        let lead = LeadPlanner::new(&config, planning_region(&line(10)).unwrap());
        let mut reloader = Reloader::from_config(&config);
        let mut scheduler = ReloadScheduler::new(&config);
        let mut seq = CommandSequence::new();
        let result = scheduler.draw_stroke(&line(10), &lead, &mut reloader, &mut seq);
        assert_eq!(result, Err(PipelineError::UnknownColor("mauve".to_owned())));
    }

    #[test]
    fn empty_stroke_emits_nothing() {
        let (_, seq) = run(&config(10.0), &[line(3), Vec::new()]);
        let (_, alone) = run(&config(10.0), &[line(3)]);
        assert_eq!(seq.len(), alone.len());
    }
}
