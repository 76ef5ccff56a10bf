//! Integration tests: raw input through every synthesis stage.

#![allow(clippy::unwrap_used, clippy::panic, clippy::float_cmp)]

use strokeplot_pipeline::{
    Command, MachineConfig, PaintConfig, PipelineError, ReloadStrategy, Stroke, StrokeInput,
    synthesize, synthesize_strokes, synthesize_with_diagnostics,
};

fn input(text: &str) -> StrokeInput {
    StrokeInput::from_json(text).unwrap()
}

fn pause_count(commands: &[Command]) -> usize {
    commands
        .iter()
        .filter(|c| matches!(c, Command::Pause(_)))
        .count()
}

/// A straight stroke of `length` unit steps along y = `y`.
fn line(length: u32, y: f64) -> Stroke {
    let points: Vec<(f64, f64)> = (0..=length).map(|i| (f64::from(i), y)).collect();
    Stroke::from_xy(&points)
}

/// The same stroke drawn right to left.
fn reversed(length: u32, y: f64) -> Stroke {
    let points: Vec<(f64, f64)> = (0..=length).rev().map(|i| (f64::from(i), y)).collect();
    Stroke::from_xy(&points)
}

#[test]
fn two_stroke_square_is_drawn_in_input_order() {
    let result = synthesize(
        input("[[[0, 0], [10, 0]], [[10, 10], [0, 10]]]"),
        &MachineConfig::default(),
    )
    .unwrap();

    let drawn_y: Vec<f64> = result
        .program
        .commands()
        .iter()
        .filter_map(Command::as_fitted_move)
        .filter(|m| (m.z() - MachineConfig::DEFAULT_DRAW_HEIGHT).abs() < 1e-9)
        .map(|m| m.y())
        .collect();
    // First stroke (bottom edge) before second (top edge).
    assert!(drawn_y.first().unwrap() < drawn_y.last().unwrap());
    assert_eq!(result.stats.strokes, 2);
    assert_eq!(result.stats.reloads, 0);
}

#[test]
fn reloads_equal_floor_of_length_over_threshold() {
    let config = MachineConfig {
        max_stroke_length: 25.0,
        ..MachineConfig::pen_plotter()
    };
    // Mirror-image strokes keep the centroid on the bounding box center.
    let strokes = vec![line(100, 0.0), reversed(100, 20.0)];
    let result = synthesize_strokes(strokes, &config).unwrap();

    // 100 / 25 per stroke; each ends exactly on a reload, so the second
    // starts from an empty accumulator.
    assert_eq!(result.stats.reloads, 8);
    // Plus the initial operator pause.
    assert_eq!(pause_count(result.program.commands()), 9);
}

#[test]
fn unknown_color_aborts_before_any_output() {
    let config = MachineConfig {
        reload: ReloadStrategy::Paint(PaintConfig {
            color: "mauve".to_owned(),
            ..PaintConfig::default()
        }),
        ..MachineConfig::default()
    };
    let result = synthesize(input("[[0, 0], [10, 10]]"), &config);
    assert_eq!(
        result.unwrap_err(),
        PipelineError::UnknownColor("mauve".to_owned())
    );
}

#[test]
fn lopsided_drawing_overflows_the_envelope() {
    // Dense cluster near the origin drags the centroid away from the
    // bounding box center, so the far corner is pushed off the bed.
    let dense: Vec<(f64, f64)> = (0..=50).map(|i| (f64::from(i) * 0.02, 0.0)).collect();
    let strokes = vec![
        Stroke::from_xy(&dense),
        Stroke::from_xy(&[(100.0, 100.0), (100.0, 99.0)]),
    ];
    let result = synthesize_strokes(strokes, &MachineConfig::default());
    let Err(PipelineError::BoundsViolation { x, .. }) = result else {
        panic!("expected a bounds violation, got {result:?}");
    };
    assert!(x > 200.0);
}

#[test]
fn collinear_drawing_is_degenerate() {
    let result = synthesize(input("[[0, 5], [10, 5], [20, 5]]"), &MachineConfig::default());
    assert!(matches!(result, Err(PipelineError::DegenerateStroke(_))));
}

#[test]
fn empty_input_is_rejected() {
    for text in ["[]", "[[], []]", r#"{"strokes": []}"#] {
        let result = synthesize(input(text), &MachineConfig::default());
        assert_eq!(result.unwrap_err(), PipelineError::EmptyStrokeSet, "{text}");
    }
}

#[test]
fn invalid_config_is_rejected() {
    let config = MachineConfig {
        max_stroke_length: 0.0,
        ..MachineConfig::default()
    };
    let result = synthesize(input("[[0, 0], [10, 10]]"), &config);
    assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
}

#[test]
fn paint_program_keeps_pots_in_place() {
    let config = MachineConfig {
        max_stroke_length: 25.0,
        ..MachineConfig::paint_robot()
    };
    let result = synthesize_strokes(vec![line(100, 0.0), reversed(100, 40.0)], &config).unwrap();
    let pot = PaintConfig::default().pots["black"];

    let at_pot = result
        .program
        .commands()
        .iter()
        .filter(|c| {
            matches!(c, Command::Move(m)
                if m.is_immune() && m.x() == pot.x && m.y() == pot.y)
        })
        .count();
    // Each load is over the pot center five times (above, dip, the middle
    // stir offset, return, retract): the initial load plus one per reload.
    assert_eq!(result.stats.reloads, 8);
    assert_eq!(at_pot, 5 * (1 + result.stats.reloads));
    assert!(result.stats.retraces > 0);
    assert_eq!(pause_count(result.program.commands()), 0);
}

#[test]
fn diagnostics_match_the_result() {
    let (result, diagnostics) = synthesize_with_diagnostics(
        input("[[[0, 0], [10, 0]], [[10, 10], [0, 10]]]"),
        &MachineConfig::default(),
    )
    .unwrap();

    assert_eq!(diagnostics.summary.stroke_count, 2);
    assert_eq!(diagnostics.summary.point_count, 4);
    assert_eq!(diagnostics.summary.command_count, result.program.len());
    assert!((diagnostics.summary.scale - result.fit.scale).abs() < f64::EPSILON);
    assert!(diagnostics.report().contains("Validate"));
}

#[test]
fn document_input_widens_heavy_non_draw_strokes() {
    // Horizontal strokes stacked symmetrically about y = 20.
    let doc = r#"{"strokes": [
        {"weight": 1, "mode": "draw",
         "points": [{"point": {"x": 0, "y": 0}}, {"point": {"x": 10, "y": 0}}]},
        {"weight": 10, "mode": "fill",
         "points": [{"point": {"x": 0, "y": 20}}, {"point": {"x": 10, "y": 20}}]},
        {"weight": 2, "mode": "fill",
         "points": [{"point": {"x": 0, "y": 30}}, {"point": {"x": 10, "y": 30}}]},
        {"weight": 1, "mode": "draw",
         "points": [{"point": {"x": 0, "y": 40}}, {"point": {"x": 10, "y": 40}}]}
    ]}"#;
    let result = synthesize(input(doc), &MachineConfig::default()).unwrap();
    // Two draw strokes plus two offset copies of the heavy fill.
    assert_eq!(result.stats.strokes, 4);
}
