//! Shared geometry and error types for the strokeplot synthesis engine.

use serde::{Deserialize, Serialize};

/// A 2D point in source units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// A sequence of connected points forming one path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline(Vec<Point>);

impl Polyline {
    /// Create a new polyline from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the polyline has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the polyline.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the first point, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Point> {
        self.0.first()
    }

    /// Returns the last point, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Point> {
        self.0.last()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Consumes the polyline and returns the underlying vector of points.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.0
    }

    /// Sum of the segment lengths.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.0.windows(2).map(|pair| pair[0].distance(pair[1])).sum()
    }
}

/// How a stroke is meant to be rendered.
///
/// Only [`StrokeMode::Draw`] strokes are drawn directly. Any other mode
/// keeps its name so callers can tell them apart.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StrokeMode {
    /// A regular pen-down stroke.
    #[default]
    Draw,
    /// Any non-drawing mode, by name.
    Other(String),
}

impl StrokeMode {
    /// Returns `true` for [`StrokeMode::Draw`].
    #[must_use]
    pub const fn is_draw(&self) -> bool {
        matches!(self, Self::Draw)
    }
}

impl From<String> for StrokeMode {
    fn from(value: String) -> Self {
        if value == "draw" {
            Self::Draw
        } else {
            Self::Other(value)
        }
    }
}

impl From<StrokeMode> for String {
    fn from(value: StrokeMode) -> Self {
        match value {
            StrokeMode::Draw => "draw".to_owned(),
            StrokeMode::Other(name) => name,
        }
    }
}

/// One continuous drawing pass.
///
/// Point order is significant and preserved by every synthesis stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    /// The stroke geometry.
    pub path: Polyline,
    /// Brush weight, when the source supplied one.
    pub weight: Option<f64>,
    /// Rendering mode.
    pub mode: StrokeMode,
}

impl Stroke {
    /// A draw-mode stroke with no weight.
    #[must_use]
    pub const fn new(path: Polyline) -> Self {
        Self {
            path,
            weight: None,
            mode: StrokeMode::Draw,
        }
    }

    /// Convenience constructor from `(x, y)` pairs.
    #[must_use]
    pub fn from_xy(points: &[(f64, f64)]) -> Self {
        Self::new(Polyline::new(
            points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
        ))
    }

    /// Returns the stroke's points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        self.path.points()
    }

    /// Returns the number of points.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.path.len()
    }

    /// Returns `true` if the stroke has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.path.is_empty()
    }
}

/// The rectangular region of reachable, safe drawing coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Smallest reachable x.
    pub min_x: f64,
    /// Largest reachable x.
    pub max_x: f64,
    /// Smallest reachable y.
    pub min_y: f64,
    /// Largest reachable y.
    pub max_y: f64,
}

impl Envelope {
    /// Absolute slack allowed by [`Envelope::contains`] for float rounding.
    pub const TOLERANCE: f64 = 1e-9;

    /// Create an envelope from its four edges.
    #[must_use]
    pub const fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Horizontal span.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Vertical span.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Geometric center.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(
            f64::midpoint(self.min_x, self.max_x),
            f64::midpoint(self.min_y, self.max_y),
        )
    }

    /// Whether `(x, y)` lies inside the envelope, edges included.
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x - Self::TOLERANCE
            && x <= self.max_x + Self::TOLERANCE
            && y >= self.min_y - Self::TOLERANCE
            && y <= self.max_y + Self::TOLERANCE
    }
}

/// Errors that abort a synthesis run.
///
/// Every variant is fatal: no partial command text is ever produced.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
pub enum PipelineError {
    /// The input matched none of the accepted stroke shapes.
    #[error("input does not match any accepted stroke shape: {0}")]
    InvalidInputShape(String),

    /// Normalization left no drawable strokes.
    #[error("no drawable strokes in input")]
    EmptyStrokeSet,

    /// Geometry has no extent to scale, or no usable direction.
    #[error("degenerate stroke geometry: {0}")]
    DegenerateStroke(String),

    /// A transformed coordinate fell outside the machine envelope.
    #[error("coordinate ({x:.3}, {y:.3}) lies outside the machine envelope")]
    BoundsViolation {
        /// Offending x.
        x: f64,
        /// Offending y.
        y: f64,
    },

    /// A reload asked for a color with no registered pot.
    #[error("no paint pot registered for color {0:?}")]
    UnknownColor(String),

    /// Machine configuration is invalid.
    #[error("invalid machine configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance(b) - 5.0).abs() < f64::EPSILON);
        assert!((a.distance_squared(b) - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn polyline_length_sums_segments() {
        let pl = Polyline::new(vec![
            Point::new(0.0, 0.0),
            Point::new(3.0, 4.0),
            Point::new(3.0, 10.0),
        ]);
        assert!((pl.length() - 11.0).abs() < 1e-12);
    }

    #[test]
    fn polyline_empty() {
        let pl = Polyline::new(vec![]);
        assert!(pl.is_empty());
        assert!(pl.first().is_none());
        assert!(pl.length().abs() < f64::EPSILON);
    }

    #[test]
    fn stroke_mode_from_name() {
        assert_eq!(StrokeMode::from("draw".to_owned()), StrokeMode::Draw);
        assert_eq!(
            StrokeMode::from("erase".to_owned()),
            StrokeMode::Other("erase".to_owned()),
        );
        assert_eq!(String::from(StrokeMode::Draw), "draw");
    }

    #[test]
    fn envelope_geometry() {
        let env = Envelope::new(10.0, 200.0, 60.0, 200.0);
        assert!((env.width() - 190.0).abs() < f64::EPSILON);
        assert!((env.height() - 140.0).abs() < f64::EPSILON);
        assert_eq!(env.center(), Point::new(105.0, 130.0));
    }

    #[test]
    fn envelope_contains_edges_but_not_beyond() {
        let env = Envelope::new(0.0, 200.0, 0.0, 200.0);
        assert!(env.contains(200.0, 0.0));
        assert!(!env.contains(205.0, 100.0));
        assert!(!env.contains(100.0, -0.5));
    }

    #[test]
    fn error_display() {
        let err = PipelineError::UnknownColor("mauve".to_owned());
        assert_eq!(err.to_string(), "no paint pot registered for color \"mauve\"");
        let err = PipelineError::BoundsViolation { x: 205.0, y: 10.0 };
        assert_eq!(
            err.to_string(),
            "coordinate (205.000, 10.000) lies outside the machine envelope",
        );
    }
}
