//! G-code command emitter.
//!
//! Renders a validated [`Program`] as plain G-code text:
//!
//! 1. optional `;` metadata comment lines
//! 2. the setup macro
//! 3. one line per command
//! 4. the teardown macro
//!
//! Each command renders as a pure function of its fields. Numbers use
//! fixed precision so output is deterministic and diffs cleanly:
//! `X`, `Y`, `Z` and `E` with 3 decimals, `F` with none.
//!
//! | Command | Line |
//! |---|---|
//! | rapid move | `G0 X.. Y.. Z.. E.. F..` |
//! | linear move | `G1 X.. Y.. Z.. E.. F..` |
//! | pause | `M0 ; stop and wait for user input` |
//!
//! This is a pure function with no I/O: it returns a `String`.

use std::fmt::Write;

use serde::{Deserialize, Serialize};
use strokeplot_pipeline::{Command, Program};

/// Fixed preamble and postamble lines, opaque to synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Macros {
    /// Lines emitted before the first command.
    pub setup: Vec<String>,
    /// Lines emitted after the last command.
    pub teardown: Vec<String>,
}

impl Macros {
    /// Default setup for a generic Marlin-style gantry.
    pub const DEFAULT_SETUP: &[&str] = &[
        "G21 ;Millimetre units",
        "G90 ;Absolute positioning",
        "M220 S100 ;Reset feedrate",
        "G28 ;Home",
        "G92 E0 ;Reset extruder",
    ];

    /// Default teardown: raise the tool, present the bed, release motors.
    pub const DEFAULT_TEARDOWN: &[&str] = &[
        "G91 ;Relative positioning",
        "G1 Z10 F3000 ;Raise Z",
        "G90 ;Absolute positioning",
        "G1 X0 Y150 F3000 ;Present bed",
        "M84 ;Disable steppers",
    ];

    /// No setup or teardown lines at all.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            setup: Vec::new(),
            teardown: Vec::new(),
        }
    }
}

impl Default for Macros {
    fn default() -> Self {
        let owned = |lines: &[&str]| lines.iter().map(|&l| l.to_owned()).collect();
        Self {
            setup: owned(Self::DEFAULT_SETUP),
            teardown: owned(Self::DEFAULT_TEARDOWN),
        }
    }
}

/// Metadata emitted as `;` comment lines at the top of the file.
///
/// All fields are optional; controllers ignore comment lines.
#[derive(Debug, Clone, Default)]
pub struct GcodeMetadata<'a> {
    /// Source file name, emitted as `; Source: <title>`.
    pub title: Option<&'a str>,

    /// Full `MachineConfig` JSON, emitted as `; Config: <json>`.
    ///
    /// Lets a run be reproduced from its own output.
    pub config_json: Option<&'a str>,
}

/// Render one command as a single G-code line.
#[must_use]
pub fn render_command(command: &Command) -> String {
    match command {
        Command::Move(m) => format!(
            "{} X{:.3} Y{:.3} Z{:.3} E{:.3} F{:.0}",
            if m.is_rapid() { "G0" } else { "G1" },
            m.x(),
            m.y(),
            m.z(),
            m.extrusion(),
            m.feed(),
        ),
        Command::Pause(_) => "M0 ; stop and wait for user input".to_owned(),
    }
}

/// Serialize a program into G-code text.
///
/// The program is consumed: it is emitted exactly once. The result ends
/// with a newline.
///
/// # Examples
///
/// ```
/// use strokeplot_export::gcode::{GcodeMetadata, Macros, to_gcode};
/// use strokeplot_pipeline::{MachineConfig, Stroke, synthesize_strokes};
///
/// let strokes = vec![
///     Stroke::from_xy(&[(0.0, 0.0), (10.0, 0.0)]),
///     Stroke::from_xy(&[(10.0, 10.0), (0.0, 10.0)]),
/// ];
/// let result = synthesize_strokes(strokes, &MachineConfig::default()).unwrap();
/// let text = to_gcode(result.program, &Macros::empty(), &GcodeMetadata::default());
/// assert!(text.starts_with("; strokeplot\nM0"));
/// ```
#[must_use]
pub fn to_gcode(program: Program, macros: &Macros, metadata: &GcodeMetadata<'_>) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "; strokeplot");
    if let Some(title) = metadata.title {
        for line in title.lines() {
            let _ = writeln!(out, "; Source: {line}");
        }
    }
    if let Some(config_json) = metadata.config_json {
        for line in config_json.lines() {
            let _ = writeln!(out, "; Config: {line}");
        }
    }

    for line in &macros.setup {
        let _ = writeln!(out, "{line}");
    }
    for command in program.into_commands() {
        let _ = writeln!(out, "{}", render_command(&command));
    }
    for line in &macros.teardown {
        let _ = writeln!(out, "{line}");
    }

    out
}
