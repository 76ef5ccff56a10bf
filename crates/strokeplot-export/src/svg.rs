//! SVG toolpath preview.
//!
//! Draws the machine envelope as a rectangle, pen-down segments as solid
//! black paths and travel segments as thin dashed grey paths. Immune
//! moves (pot, wash and dry choreography) and pauses are left out.
//!
//! A segment counts as pen-down when both of its ends sit at the lowest
//! Z of the program, which is the draw height. Y is flipped so the
//! preview reads the same way up as the machine bed.
//!
//! This is a pure function with no I/O: it returns a `String`.

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Path, Rectangle, Title};

use strokeplot_pipeline::{Command, Envelope, Move, Program};

/// Blank space around the envelope, in machine units.
const PADDING: f64 = 5.0;

/// Z comparisons tolerate float noise.
const Z_TOLERANCE: f64 = 1e-9;

/// Render a preview of `program` inside `envelope`.
#[must_use]
pub fn to_svg(program: &Program, envelope: &Envelope, title: Option<&str>) -> String {
    let moves: Vec<&Move> = program
        .commands()
        .iter()
        .filter_map(Command::as_fitted_move)
        .collect();
    let draw_z = moves.iter().map(|m| m.z()).fold(f64::INFINITY, f64::min);
    let flip = |x: f64, y: f64| (x, envelope.max_y + envelope.min_y - y);

    let mut drawn = Data::new();
    let mut travel = Data::new();
    let mut pen_at: Option<(f64, f64)> = None;

    for pair in moves.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        let a = flip(from.x(), from.y());
        let b = flip(to.x(), to.y());
        let down = (from.z() - draw_z).abs() < Z_TOLERANCE && (to.z() - draw_z).abs() < Z_TOLERANCE;

        if down {
            if pen_at != Some(a) {
                drawn = drawn.move_to(a);
            }
            drawn = drawn.line_to(b);
            pen_at = Some(b);
        } else {
            travel = travel.move_to(a).line_to(b);
            pen_at = None;
        }
    }

    let bed = Rectangle::new()
        .set("x", envelope.min_x)
        .set("y", envelope.min_y)
        .set("width", envelope.width())
        .set("height", envelope.height())
        .set("fill", "none")
        .set("stroke", "#4a90d9")
        .set("stroke-width", 0.5);

    let mut doc = Document::new()
        .set(
            "viewBox",
            (
                envelope.min_x - PADDING,
                envelope.min_y - PADDING,
                2.0f64.mul_add(PADDING, envelope.width()),
                2.0f64.mul_add(PADDING, envelope.height()),
            ),
        )
        .set("preserveAspectRatio", "xMidYMid meet");

    if let Some(title) = title {
        doc = doc.add(Title::new(title));
    }
    doc = doc.add(bed);
    doc = doc.add(
        Path::new()
            .set("d", travel)
            .set("fill", "none")
            .set("stroke", "#999999")
            .set("stroke-width", 0.3)
            .set("stroke-dasharray", "2,2"),
    );
    doc = doc.add(
        Path::new()
            .set("d", drawn)
            .set("fill", "none")
            .set("stroke", "black")
            .set("stroke-width", 1)
            .set("stroke-linecap", "round"),
    );

    doc.to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use strokeplot_pipeline::{MachineConfig, Stroke, synthesize_strokes};

    use super::*;

    fn program(config: &MachineConfig) -> Program {
        let strokes = vec![
            Stroke::from_xy(&[(0.0, 0.0), (10.0, 0.0)]),
            Stroke::from_xy(&[(10.0, 10.0), (0.0, 10.0)]),
        ];
        synthesize_strokes(strokes, config).unwrap().program
    }

    #[test]
    fn preview_has_bed_and_paths() {
        let config = MachineConfig::default();
        let svg = to_svg(&program(&config), &config.envelope, Some("square"));
        assert!(svg.contains("<svg"));
        assert!(svg.contains("<rect"));
        assert!(svg.contains("<title>square</title>"));
        assert_eq!(svg.matches("<path").count(), 2);
        assert!(svg.contains("stroke-dasharray"));
        assert!(svg.contains("</svg>"));
    }

    #[test]
    fn paint_choreography_is_not_drawn() {
        let config = MachineConfig::paint_robot();
        let svg = to_svg(&program(&config), &config.envelope, None);
        // Pots sit at y=30, below the envelope; flipped that would be y=230.
        assert!(!svg.contains(",230"));
        assert!(!svg.contains(" 230"));
    }
}
