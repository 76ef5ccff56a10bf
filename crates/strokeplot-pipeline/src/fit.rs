//! Bed-fit transform: scale and center the drawing inside the envelope.
//!
//! The bounding box and centroid are taken over every non-immune move.
//! Pauses and immune moves (pot, wash and dry choreography) are neither
//! measured nor moved.
//!
//! Scaling is uniform, `min(env_w / bbox_w, env_h / bbox_h)`, so the
//! drawing keeps its aspect ratio. The offset then maps the scaled
//! centroid onto the envelope center. The centroid is not the bounding
//! box center: a drawing with most of its points on one side can end up
//! pushed past the envelope edge, which the bounds validator reports.

use geo::{BoundingRect, Centroid, MultiPoint};
use serde::{Deserialize, Serialize};

use crate::command::{Command, CommandSequence, FittedSequence};
use crate::types::{Envelope, PipelineError};

/// The transform applied by [`fit_to_bed`]: `p' = p * scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BedFit {
    /// Uniform scale factor.
    pub scale: f64,
    /// X offset added after scaling.
    pub offset_x: f64,
    /// Y offset added after scaling.
    pub offset_y: f64,
}

impl BedFit {
    /// Map a source coordinate into machine coordinates.
    #[must_use]
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x.mul_add(self.scale, self.offset_x),
            y.mul_add(self.scale, self.offset_y),
        )
    }
}

/// Compute the transform for the non-immune moves in `commands`.
///
/// # Errors
///
/// Returns [`PipelineError::DegenerateStroke`] if there are no non-immune
/// moves or their bounding box has zero width or height.
pub fn compute_fit(commands: &[Command], envelope: &Envelope) -> Result<BedFit, PipelineError> {
    let points: MultiPoint<f64> = commands
        .iter()
        .filter_map(Command::as_fitted_move)
        .map(|m| (m.x(), m.y()))
        .collect::<Vec<_>>()
        .into();

    let (Some(bbox), Some(centroid)) = (points.bounding_rect(), points.centroid()) else {
        return Err(PipelineError::DegenerateStroke(
            "no drawing moves to fit".to_owned(),
        ));
    };

    if !(bbox.width() > 0.0 && bbox.height() > 0.0) {
        return Err(PipelineError::DegenerateStroke(format!(
            "drawing bounding box is {} x {}",
            bbox.width(),
            bbox.height()
        )));
    }

    let scale = (envelope.width() / bbox.width()).min(envelope.height() / bbox.height());
    let center = envelope.center();
    Ok(BedFit {
        scale,
        offset_x: (-centroid.x()).mul_add(scale, center.x),
        offset_y: (-centroid.y()).mul_add(scale, center.y),
    })
}

/// Scale and center `seq` into `envelope`.
///
/// Consumes the sequence: coordinates are rewritten exactly once.
///
/// # Errors
///
/// See [`compute_fit`].
pub fn fit_to_bed(
    seq: CommandSequence,
    envelope: &Envelope,
) -> Result<(FittedSequence, BedFit), PipelineError> {
    let fit = compute_fit(seq.commands(), envelope)?;
    tracing::debug!(
        scale = fit.scale,
        offset_x = fit.offset_x,
        offset_y = fit.offset_y,
        "bed fit"
    );

    let commands = seq
        .into_inner()
        .into_iter()
        .map(|command| match command {
            Command::Move(m) if !m.is_immune() => {
                let (x, y) = fit.apply(m.x(), m.y());
                Command::Move(m.with_xy(x, y))
            }
            other => other,
        })
        .collect();

    Ok((FittedSequence(commands), fit))
}
