//! Compile SVG vector drawings into a G-code instruction stream for pen
//! plotters and paper cutters.
//!
//! The pipeline is one linear pass: the document tree is traversed with
//! composed affine transforms, shape nodes are normalized to paths and
//! adaptively flattened into tolerance-bounded polylines, and the resulting
//! entity list drives a toolpath state machine that tracks pen position and
//! state while emitting travel, draw, and pen-toggle commands. The final
//! assembly wraps the body in device-specific setup, registration, and
//! multi-copy framing.
//!
//! ```
//! use svg2plot::{svg2program, Device, PlotConfig};
//!
//! let svg = r#"<svg width="10" height="10"><path d="M0 0 L10 0 L10 10"/></svg>"#;
//! let doc = roxmltree::Document::parse(svg).unwrap();
//! let gcode = svg2program(&doc, &PlotConfig::default(), Device::Plotter);
//! assert!(gcode.contains("(preamble)"));
//! ```

mod config;
mod entity;
mod flatten;
mod gcode;
mod machine;
mod parser;

pub use config::{FeedDistance, PlotConfig};
pub use entity::{ArcStep, DrawStep, Entity, Segment};
pub use flatten::{flatten_cubic, DEFAULT_TOLERANCE};
pub use gcode::GCodeBuilder;
pub use machine::Device;
pub use parser::{parse_document, PX_TO_MM};

use roxmltree::Document;

/// Top-level function for converting an SVG [`Document`] into an
/// instruction stream.
///
/// Never fails: unsupported content degrades to warnings and ignored
/// entities, and degenerate geometry is dropped during traversal.
pub fn svg2program(doc: &Document, config: &PlotConfig, device: Device) -> String {
    let entities = parse_document(doc, config);

    let mut builder = GCodeBuilder::new(config, device);
    for entity in &entities {
        builder.emit(entity);
    }
    builder.build()
}
