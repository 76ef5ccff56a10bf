//! Stroke normalizer: accept the raw input shapes and produce canonical strokes.
//!
//! Three shapes are accepted:
//!
//! 1. A flat list of points, `[[x, y], [x, y], ...]`, read as one stroke.
//! 2. Nested lists of strokes of points, `[[[x, y], ...], [[x, y], ...]]`.
//!    This is what the raster contour collaborator produces (integer pixel
//!    coordinates are fine).
//! 3. A stroke document:
//!
//! ```json
//! {"strokes": [{"weight": 2, "mode": "draw",
//!               "points": [{"point": {"x": 0, "y": 0}}, ...]}]}
//! ```
//!
//! Array points must have at least two components; any further components
//! are ignored.
//!
//! Document strokes whose mode is not `draw` are not drawn. If their
//! weight exceeds the brush-width threshold they still contribute two
//! parallel strokes offset by ±weight/2, a naive widening of the line.

use serde::{Deserialize, Serialize};

use crate::types::{PipelineError, Point, Polyline, Stroke, StrokeMode};

/// A point as it appears in a stroke document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentPoint {
    /// The wrapped coordinates.
    pub point: Point,
}

/// One stroke in a stroke document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentStroke {
    /// Brush weight.
    #[serde(default)]
    pub weight: f64,
    /// Rendering mode; `"draw"` when omitted.
    #[serde(default)]
    pub mode: StrokeMode,
    /// Ordered points.
    pub points: Vec<DocumentPoint>,
}

/// A structured stroke document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeDocument {
    /// All strokes, in authoring order.
    pub strokes: Vec<DocumentStroke>,
}

/// Any of the accepted raw input shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StrokeInput {
    /// Structured document with weights and modes.
    Document(StrokeDocument),
    /// Lists of strokes of points.
    Nested(Vec<Vec<Vec<f64>>>),
    /// A single stroke given as a list of points.
    Flat(Vec<Vec<f64>>),
}

impl StrokeInput {
    /// Parse JSON text into one of the accepted shapes.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidInputShape`] if the text is not JSON
    /// or matches none of the shapes.
    pub fn from_json(text: &str) -> Result<Self, PipelineError> {
        serde_json::from_str(text).map_err(|e| PipelineError::InvalidInputShape(e.to_string()))
    }

    /// Convert an already-parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidInputShape`] if the value matches
    /// none of the shapes.
    pub fn from_value(value: serde_json::Value) -> Result<Self, PipelineError> {
        serde_json::from_value(value).map_err(|e| PipelineError::InvalidInputShape(e.to_string()))
    }
}

/// Turn raw input into canonical strokes.
///
/// Strokes without points are dropped. The result may be empty; the
/// synthesizer rejects an empty set.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidInputShape`] for an array point with
/// fewer than two components or a non-finite coordinate.
pub fn normalize(
    input: StrokeInput,
    brush_width_threshold: f64,
) -> Result<Vec<Stroke>, PipelineError> {
    let strokes = match input {
        StrokeInput::Flat(points) => vec![Stroke::new(polyline_from_arrays(&points)?)],
        StrokeInput::Nested(strokes) => strokes
            .iter()
            .map(|points| polyline_from_arrays(points).map(Stroke::new))
            .collect::<Result<Vec<_>, _>>()?,
        StrokeInput::Document(document) => from_document(document, brush_width_threshold)?,
    };

    let before = strokes.len();
    let strokes: Vec<Stroke> = strokes.into_iter().filter(|s| !s.is_empty()).collect();
    tracing::debug!(
        strokes = strokes.len(),
        dropped_empty = before - strokes.len(),
        "normalized input"
    );
    Ok(strokes)
}

fn from_document(
    document: StrokeDocument,
    brush_width_threshold: f64,
) -> Result<Vec<Stroke>, PipelineError> {
    let mut out = Vec::with_capacity(document.strokes.len());

    for stroke in document.strokes {
        let points = stroke
            .points
            .into_iter()
            .map(|p| checked_point(p.point.x, p.point.y))
            .collect::<Result<Vec<_>, _>>()?;

        if stroke.mode.is_draw() {
            out.push(Stroke {
                path: Polyline::new(points),
                weight: Some(stroke.weight),
                mode: StrokeMode::Draw,
            });
        } else if stroke.weight > brush_width_threshold {
            let (left, right) = widen(&points, stroke.weight);
            for path in [left, right] {
                out.push(Stroke {
                    path,
                    weight: Some(stroke.weight),
                    mode: StrokeMode::Draw,
                });
            }
        } else {
            tracing::trace!(mode = ?stroke.mode, weight = stroke.weight, "skipping non-draw stroke");
        }
    }

    Ok(out)
}

/// Two copies of `points` shifted by ±weight/2 perpendicular to the chord.
///
/// The chord runs from the first to the last point. A zero-length chord
/// shifts along y.
fn widen(points: &[Point], weight: f64) -> (Polyline, Polyline) {
    let (nx, ny) = match (points.first(), points.last()) {
        (Some(first), Some(last)) if first.distance_squared(*last) > 0.0 => {
            let len = first.distance(*last);
            (-(last.y - first.y) / len, (last.x - first.x) / len)
        }
        _ => (0.0, 1.0),
    };
    let half = weight / 2.0;

    let shifted = |sign: f64| {
        Polyline::new(
            points
                .iter()
                .map(|p| Point::new((sign * half).mul_add(nx, p.x), (sign * half).mul_add(ny, p.y)))
                .collect(),
        )
    };
    (shifted(1.0), shifted(-1.0))
}

fn polyline_from_arrays(points: &[Vec<f64>]) -> Result<Polyline, PipelineError> {
    points
        .iter()
        .map(|components| match components.as_slice() {
            [x, y, ..] => checked_point(*x, *y),
            _ => Err(PipelineError::InvalidInputShape(format!(
                "point needs at least 2 components, got {}",
                components.len()
            ))),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Polyline::new)
}

fn checked_point(x: f64, y: f64) -> Result<Point, PipelineError> {
    if x.is_finite() && y.is_finite() {
        Ok(Point::new(x, y))
    } else {
        Err(PipelineError::InvalidInputShape(format!(
            "non-finite coordinate ({x}, {y})"
        )))
    }
}
