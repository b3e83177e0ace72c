#![forbid(unsafe_code)]

//! Decoders for the Unusual Binary Vector File Format.
//!
//! Two variants exist:
//! - Type 1: one big-endian stream of opcodes, layers and inline points ([`type1`]).
//! - Type 2: a command file of fixed records plus a separate points file ([`type2`]).
//!
//! Assembly files ([`assembly`]) stitch already-converted Type 2 layers into one drawing.
//!
//! Decoders produce typed commands; turning them into SVG lives in `ubvff-render`.

pub mod assembly;
pub mod commands;
pub mod error;
pub mod fixed;
pub mod geom;
pub mod names;
pub mod reader;
pub mod type1;
pub mod type2;

pub use error::{Error, Result};
pub use fixed::Scale;
pub use geom::{Color, Cubic, Point, ViewBounds};
pub use type1::{Type1Command, Type1Decoder};
pub use type2::{DecodeOptions, Type2Command, Type2Decoder};
