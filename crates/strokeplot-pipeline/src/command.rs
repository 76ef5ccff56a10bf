//! Motion commands and the sequences that carry them through synthesis.
//!
//! A command is a closed tagged union: [`Command::Move`] or
//! [`Command::Pause`]. Fields are private; the only code that rewrites
//! coordinates is the bed-fit transform, and it can only do so once
//! because each stage consumes the previous stage's sequence type:
//!
//! ```text
//! CommandSequence --fit--> FittedSequence --validate--> Program --emit--> text
//! ```

use serde::{Deserialize, Serialize};

/// A tool movement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Move {
    x: f64,
    y: f64,
    z: f64,
    feed: f64,
    extrusion: f64,
    rapid: bool,
    immune_to_limits: bool,
}

impl Move {
    /// A linear (`G1`) move with no extrusion.
    #[must_use]
    pub const fn linear(x: f64, y: f64, z: f64, feed: f64) -> Self {
        Self {
            x,
            y,
            z,
            feed,
            extrusion: 0.0,
            rapid: false,
            immune_to_limits: false,
        }
    }

    /// A rapid positioning (`G0`) move with no extrusion.
    #[must_use]
    pub const fn rapid(x: f64, y: f64, z: f64, feed: f64) -> Self {
        Self {
            rapid: true,
            ..Self::linear(x, y, z, feed)
        }
    }

    /// Mark this move as exempt from bed fitting and bounds checks.
    ///
    /// Used for moves to fixed fixtures outside the drawing envelope.
    #[must_use]
    pub const fn immune(self) -> Self {
        Self {
            immune_to_limits: true,
            ..self
        }
    }

    /// Set the extrusion amount.
    #[must_use]
    pub const fn with_extrusion(self, extrusion: f64) -> Self {
        Self { extrusion, ..self }
    }

    /// X coordinate.
    #[must_use]
    pub const fn x(&self) -> f64 {
        self.x
    }

    /// Y coordinate.
    #[must_use]
    pub const fn y(&self) -> f64 {
        self.y
    }

    /// Z coordinate.
    #[must_use]
    pub const fn z(&self) -> f64 {
        self.z
    }

    /// Feed rate.
    #[must_use]
    pub const fn feed(&self) -> f64 {
        self.feed
    }

    /// Extrusion amount.
    #[must_use]
    pub const fn extrusion(&self) -> f64 {
        self.extrusion
    }

    /// Whether this is a rapid positioning move.
    #[must_use]
    pub const fn is_rapid(&self) -> bool {
        self.rapid
    }

    /// Whether this move is exempt from bed fitting and bounds checks.
    #[must_use]
    pub const fn is_immune(&self) -> bool {
        self.immune_to_limits
    }

    pub(crate) const fn with_xy(self, x: f64, y: f64) -> Self {
        Self { x, y, ..self }
    }
}

/// An operator wait at a given position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pause {
    x: f64,
    y: f64,
    z: f64,
    feed: f64,
}

impl Pause {
    /// Create a pause.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64, feed: f64) -> Self {
        Self { x, y, z, feed }
    }

    /// X coordinate.
    #[must_use]
    pub const fn x(&self) -> f64 {
        self.x
    }

    /// Y coordinate.
    #[must_use]
    pub const fn y(&self) -> f64 {
        self.y
    }

    /// Z coordinate.
    #[must_use]
    pub const fn z(&self) -> f64 {
        self.z
    }

    /// Feed rate.
    #[must_use]
    pub const fn feed(&self) -> f64 {
        self.feed
    }
}

/// One motion command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Tool movement.
    Move(Move),
    /// Operator wait.
    Pause(Pause),
}

impl Command {
    /// The move, if this command is a non-immune move.
    ///
    /// These are the commands that take part in bed fitting and bounds
    /// validation.
    #[must_use]
    pub const fn as_fitted_move(&self) -> Option<&Move> {
        match self {
            Self::Move(m) if !m.is_immune() => Some(m),
            _ => None,
        }
    }
}

impl From<Move> for Command {
    fn from(value: Move) -> Self {
        Self::Move(value)
    }
}

impl From<Pause> for Command {
    fn from(value: Pause) -> Self {
        Self::Pause(value)
    }
}

/// Append-only command list built during synthesis, in source units.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandSequence(Vec<Command>);

impl CommandSequence {
    /// An empty sequence.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Append one command.
    pub fn push(&mut self, command: impl Into<Command>) {
        self.0.push(command.into());
    }

    /// Append several commands in order.
    pub fn extend(&mut self, commands: impl IntoIterator<Item = Command>) {
        self.0.extend(commands);
    }

    /// The most recently appended command.
    #[must_use]
    pub fn last(&self) -> Option<&Command> {
        self.0.last()
    }

    /// All commands so far.
    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.0
    }

    /// Number of commands.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if nothing has been appended.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn into_inner(self) -> Vec<Command> {
        self.0
    }
}

/// A sequence whose non-immune moves are in machine coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedSequence(pub(crate) Vec<Command>);

impl FittedSequence {
    /// All commands.
    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.0
    }
}

/// A fitted sequence that passed bounds validation.
///
/// This is the only input the command emitter accepts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Program(pub(crate) Vec<Command>);

impl Program {
    /// All commands.
    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.0
    }

    /// Number of commands.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the program has no commands.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume the program, yielding its commands.
    #[must_use]
    pub fn into_commands(self) -> Vec<Command> {
        self.0
    }
}
