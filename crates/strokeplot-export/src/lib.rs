//! strokeplot-export: Pure format serializers (sans-IO)
//!
//! Turns a validated [`Program`](strokeplot_pipeline::Program) into text:
//! G-code for the machine and an SVG preview for people.

pub mod gcode;
pub mod svg;

pub use gcode::{GcodeMetadata, Macros, render_command, to_gcode};
pub use svg::to_svg;
