#![forbid(unsafe_code)]

//! SVG output for decoded drawings.
//!
//! [`svg::SvgEmitter`] is the only writer; it enforces element order through a state
//! machine. The converters in [`type1`] and [`type2`] feed it decoded commands, and
//! [`assemble`] builds composite documents out of already-converted layers.

pub mod assemble;
pub mod paint;
pub mod svg;
pub mod type1;
pub mod type2;

use std::path::PathBuf;
use svg::{EmitOp, EmitState};
use ubvff_core::assembly::SkipReason;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Decode(#[from] ubvff_core::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid state in {op}: {state}")]
    IllegalTransition { op: EmitOp, state: EmitState },

    #[error("viewBox {text} does not fit the placeholder")]
    ViewBoxOverflow { text: String },

    #[error("document was not started with a viewBox placeholder")]
    ViewBoxNotDeferred,

    #[error("document incomplete (state {state})")]
    Incomplete { state: EmitState },

    #[error("{}: {reason}", path.display())]
    Rejected { path: PathBuf, reason: SkipReason },

    #[error("dumpList overload ({max} layers)")]
    TooManyLayers { max: usize },

    #[error("{}: {message}", path.display())]
    FragmentHeader {
        path: PathBuf,
        message: &'static str,
    },

    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Whether a converter wants more commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

pub use assemble::{AssemblyPlan, assemble_file, collect_layers, write_composite};
pub use paint::{PaintContext, PathPaint};
pub use svg::{StateProfile, SvgEmitter};
pub use type1::Type1Converter;
pub use type2::Type2Converter;
