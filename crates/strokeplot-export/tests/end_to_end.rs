//! Integration test: stroke JSON through synthesis into G-code and SVG.

#![allow(clippy::unwrap_used, clippy::float_cmp)]

use strokeplot_export::{GcodeMetadata, Macros, to_gcode, to_svg};
use strokeplot_pipeline::{
    MachineConfig, PaintConfig, PipelineError, ReloadStrategy, StrokeInput, synthesize,
};

const SQUARE: &str = "[[[0, 0], [10, 0]], [[10, 10], [0, 10]]]";

fn gcode(text: &str, config: &MachineConfig) -> Result<String, PipelineError> {
    let input = StrokeInput::from_json(text)?;
    let result = synthesize(input, config)?;
    Ok(to_gcode(result.program, &Macros::default(), &GcodeMetadata::default()))
}

/// Parse the value after `axis` in a G-code move line.
fn word(line: &str, axis: char) -> Option<f64> {
    line.split_whitespace()
        .find_map(|w| w.strip_prefix(axis))
        .and_then(|v| v.parse().ok())
}

#[test]
fn pen_plotter_square() {
    let config = MachineConfig::pen_plotter();
    let text = gcode(SQUARE, &config).unwrap();

    let body: Vec<&str> = text
        .lines()
        .skip(1 + Macros::DEFAULT_SETUP.len())
        .take_while(|l| !Macros::DEFAULT_TEARDOWN.contains(l))
        .collect();

    assert_eq!(body[0], "M0 ; stop and wait for user input");
    assert!(body[1].starts_with("G0 "), "lead-in is rapid: {}", body[1]);

    let env = config.envelope;
    for line in body.iter().filter(|l| l.starts_with('G')) {
        let x = word(line, 'X').unwrap();
        let y = word(line, 'Y').unwrap();
        assert!(
            x >= env.min_x - 1e-3 && x <= env.max_x + 1e-3,
            "x out of range in {line}"
        );
        assert!(
            y >= env.min_y - 1e-3 && y <= env.max_y + 1e-3,
            "y out of range in {line}"
        );
        assert_eq!(word(line, 'F'), Some(MachineConfig::DEFAULT_FEED_RATE));
    }
}

#[test]
fn output_is_deterministic() {
    let config = MachineConfig::paint_robot();
    assert_eq!(gcode(SQUARE, &config).unwrap(), gcode(SQUARE, &config).unwrap());
}

#[test]
fn paint_robot_visits_pot_wash_and_dry() {
    let config = MachineConfig::paint_robot();
    let text = gcode(SQUARE, &config).unwrap();
    let paint = PaintConfig::default();
    let black = paint.pots["black"];

    let at = |x: f64, y: f64| {
        text.lines()
            .any(|l| word(l, 'X') == Some(x) && word(l, 'Y') == Some(y))
    };
    assert!(at(black.x, black.y));
    assert!(at(paint.wash.x, paint.wash.y));
    assert!(at(paint.dry.x, paint.dry.y));
    assert!(!text.contains("M0"));
}

#[test]
fn bounds_violation_produces_no_text() {
    let lopsided = "[[[0, 0], [0.02, 0], [0.04, 0], [0.06, 0], [0.08, 0], [0.1, 0], \
                     [0.12, 0], [0.14, 0], [0.16, 0], [0.18, 0], [0.2, 0], [0.22, 0], \
                     [0.24, 0], [0.26, 0], [0.28, 0], [0.3, 0], [0.32, 0], [0.34, 0]], \
                    [[100, 100], [100, 99]]]";
    let result = gcode(lopsided, &MachineConfig::default());
    assert!(
        matches!(result, Err(PipelineError::BoundsViolation { .. })),
        "{result:?}"
    );
}

#[test]
fn unknown_color_produces_no_text() {
    let config = MachineConfig {
        reload: ReloadStrategy::Paint(PaintConfig {
            color: "mauve".to_owned(),
            ..PaintConfig::default()
        }),
        ..MachineConfig::default()
    };
    assert_eq!(
        gcode(SQUARE, &config),
        Err(PipelineError::UnknownColor("mauve".to_owned()))
    );
}

#[test]
fn svg_preview_of_square() {
    let config = MachineConfig::default();
    let result = synthesize(StrokeInput::from_json(SQUARE).unwrap(), &config).unwrap();
    let svg = to_svg(&result.program, &config.envelope, None);
    assert!(svg.contains("<svg"));
    assert!(svg.contains("<path"));
    assert!(svg.contains("</svg>"));
}
