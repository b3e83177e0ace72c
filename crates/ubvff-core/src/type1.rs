//! Type 1: a single file of interleaved opcodes and payloads.
//!
//! Every word is a big-endian 32-bit value. A file normally reads:
//!
//! ```text
//! START_FILE header
//! START_LAYER "name"
//!   START_PATH p (LINE n p.. | CUBIC 3n p..)* CLOSE_PATH? END_PATH_*
//!   ...
//! END_LAYER LAYER_SEP
//! ...
//! END_FILE
//! ```

use crate::commands::{self, Payload, type1 as op};
use crate::error::{Error, Result};
use crate::fixed::Scale;
use crate::geom::{Color, Cubic, Point};
use crate::reader::{RecordReader, RecordSize, WordLayout};
use serde::Serialize;
use std::borrow::Cow;
use std::io::Read;

pub const SCALE: Scale = Scale::TYPE1;

/// Layer names are stored one character per 32-bit word; longer names are rejected.
pub const MAX_LAYER_NAME: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Type1Header {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
    pub unknown: i32,
}

/// Which paint channels an end-path opcode enables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaintMode {
    Stroke,
    Fill,
    StrokeAndFill,
}

impl PaintMode {
    pub fn has_fill(self) -> bool {
        matches!(self, PaintMode::Fill | PaintMode::StrokeAndFill)
    }

    pub fn has_stroke(self) -> bool {
        matches!(self, PaintMode::Stroke | PaintMode::StrokeAndFill)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Type1Command {
    LayerSeparator,
    StartLayer { name: String },
    EndLayer,
    StartFile(Type1Header),
    StrokeColor(Color),
    FillColor(Color),
    StartPath(Point),
    Line { points: Vec<Point> },
    Cubic { cubics: Vec<Cubic> },
    EndPath(PaintMode),
    Nop,
    ClosePath,
    Flag1(i32),
    Flag2(i32),
    StrokeWidth(i32),
    EndFile,
    Unknown { code: u32 },
}

impl Type1Command {
    pub fn opcode(&self) -> u32 {
        match self {
            Type1Command::LayerSeparator => op::LAYER_SEP,
            Type1Command::StartLayer { .. } => op::START_LAYER,
            Type1Command::EndLayer => op::END_LAYER,
            Type1Command::StartFile(_) => op::START_FILE,
            Type1Command::StrokeColor(_) => op::STROKE_COLOR,
            Type1Command::FillColor(_) => op::FILL_COLOR,
            Type1Command::StartPath(_) => op::START_PATH,
            Type1Command::Line { .. } => op::LINE,
            Type1Command::Cubic { .. } => op::CUBIC,
            Type1Command::EndPath(PaintMode::Stroke) => op::END_PATH_STROKE,
            Type1Command::EndPath(PaintMode::Fill) => op::END_PATH_FILL,
            Type1Command::EndPath(PaintMode::StrokeAndFill) => op::END_PATH_STROKE_FILL,
            Type1Command::Nop => op::NOP,
            Type1Command::ClosePath => op::CLOSE_PATH,
            Type1Command::Flag1(_) => op::FLAG1,
            Type1Command::Flag2(_) => op::FLAG2,
            Type1Command::StrokeWidth(_) => op::STROKE_WIDTH,
            Type1Command::EndFile => op::END_FILE,
            Type1Command::Unknown { code } => *code,
        }
    }

    pub fn name(&self) -> Cow<'static, str> {
        commands::type1_name(self.opcode())
    }
}

/// Pulls [`Type1Command`]s off a byte stream.
///
/// The payload following each opcode is read as its entry in
/// [`TYPE1_OPCODES`](commands::TYPE1_OPCODES) describes. Nothing is decoded after END_FILE.
#[derive(Debug)]
pub struct Type1Decoder<R> {
    reader: RecordReader<R>,
    finished: bool,
}

impl<R: Read> Type1Decoder<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: RecordReader::new(inner, WordLayout::BigEndian),
            finished: false,
        }
    }

    /// `true` once END_FILE has been decoded.
    pub fn reached_end_file(&self) -> bool {
        self.finished
    }

    /// Decodes the next command. `Ok(None)` when the stream ends on an opcode boundary
    /// or after END_FILE.
    pub fn next_command(&mut self) -> Result<Option<Type1Command>> {
        if self.finished {
            return Ok(None);
        }
        let mut code = [0u32; 1];
        if self.reader.read_records(RecordSize::Four, &mut code)? == 0 {
            return Ok(None);
        }
        let code = code[0];

        let Some(info) = commands::type1_opcode(code) else {
            tracing::debug!(code, "unknown type 1 opcode");
            return Ok(Some(Type1Command::Unknown { code }));
        };
        let command = match info.payload {
            Payload::Words(n) => {
                let words = self.reader.read_words(u32::from(n), info.name)?;
                from_words(code, &words)
            }
            Payload::PaddedString => Type1Command::StartLayer {
                name: self.read_layer_name()?,
            },
            Payload::CountedPoints => {
                let count = self.reader.read_u32(info.name)?;
                if code == op::CUBIC && count % 3 != 0 {
                    return Err(Error::CubicPointCount { count });
                }
                let points = self.reader.read_points(count, info.name)?;
                if code == op::CUBIC {
                    Type1Command::Cubic {
                        cubics: points.chunks_exact(3).filter_map(Cubic::from_points).collect(),
                    }
                } else {
                    Type1Command::Line { points }
                }
            }
            Payload::None | Payload::Params | Payload::StreamPoints => bare(code),
        };
        if command == Type1Command::EndFile {
            self.finished = true;
        }
        Ok(Some(command))
    }

    fn read_layer_name(&mut self) -> Result<String> {
        let len = self.reader.read_u32("title size")?;
        if len as usize > MAX_LAYER_NAME {
            return Err(Error::LayerNameTooLong {
                len,
                max: MAX_LAYER_NAME,
            });
        }
        let mut name = String::with_capacity(len as usize);
        for _ in 0..len {
            let word = self.reader.read_u32("layer name")?;
            name.push(char::from(word as u8));
        }
        Ok(name)
    }

    /// `true` when nothing follows the last decoded command.
    pub fn at_end(&mut self) -> Result<bool> {
        self.reader.at_end()
    }

    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }
}

fn from_words(code: u32, words: &[i32]) -> Type1Command {
    match (code, words) {
        (op::START_FILE, &[x1, y1, x2, y2, unknown]) => Type1Command::StartFile(Type1Header {
            x1,
            y1,
            x2,
            y2,
            unknown,
        }),
        (op::STROKE_COLOR, &[w]) => Type1Command::StrokeColor(Color::from_type1_word(w as u32)),
        (op::FILL_COLOR, &[w]) => Type1Command::FillColor(Color::from_type1_word(w as u32)),
        (op::START_PATH, &[x, y]) => Type1Command::StartPath(Point::new(x, y)),
        (op::FLAG1, &[v]) => Type1Command::Flag1(v),
        (op::FLAG2, &[v]) => Type1Command::Flag2(v),
        (op::STROKE_WIDTH, &[w]) => Type1Command::StrokeWidth(w),
        _ => Type1Command::Unknown { code },
    }
}

fn bare(code: u32) -> Type1Command {
    match code {
        op::LAYER_SEP => Type1Command::LayerSeparator,
        op::END_LAYER => Type1Command::EndLayer,
        op::END_PATH_STROKE => Type1Command::EndPath(PaintMode::Stroke),
        op::END_PATH_FILL => Type1Command::EndPath(PaintMode::Fill),
        op::END_PATH_STROKE_FILL => Type1Command::EndPath(PaintMode::StrokeAndFill),
        op::NOP => Type1Command::Nop,
        op::CLOSE_PATH => Type1Command::ClosePath,
        op::END_FILE => Type1Command::EndFile,
        code => Type1Command::Unknown { code },
    }
}

impl<R: Read> Iterator for Type1Decoder<R> {
    type Item = Result<Type1Command>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_command().transpose()
    }
}
