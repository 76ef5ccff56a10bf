//! Bounds validation, run once on the fitted sequence.

use crate::command::{Command, FittedSequence, Program};
use crate::types::{Envelope, PipelineError};

/// Promote `fitted` to a [`Program`] if every non-immune move lies inside
/// `envelope`.
///
/// # Errors
///
/// Returns [`PipelineError::BoundsViolation`] with the first offending
/// coordinate. The sequence is dropped.
pub fn validate_bounds(
    fitted: FittedSequence,
    envelope: &Envelope,
) -> Result<Program, PipelineError> {
    if let Some(m) = fitted
        .commands()
        .iter()
        .filter_map(Command::as_fitted_move)
        .find(|m| !envelope.contains(m.x(), m.y()))
    {
        tracing::warn!(x = m.x(), y = m.y(), "move outside envelope");
        return Err(PipelineError::BoundsViolation { x: m.x(), y: m.y() });
    }
    Ok(Program(fitted.0))
}
