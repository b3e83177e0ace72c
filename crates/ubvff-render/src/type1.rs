//! Type 1 to SVG.

use crate::paint::{PaintContext, PathPaint};
use crate::svg::{EmitState, StateProfile, SvgEmitter};
use crate::{Flow, Result};
use std::io::{Read, Write};
use ubvff_core::type1::{self, Type1Command, Type1Decoder, Type1Header};
use ubvff_core::ViewBounds;

/// Feeds decoded Type 1 commands to a layered [`SvgEmitter`].
#[derive(Debug)]
pub struct Type1Converter<W> {
    emitter: SvgEmitter<W>,
    paint: PaintContext,
    header: Type1Header,
}

impl<W: Write> Type1Converter<W> {
    pub fn new(out: W) -> Self {
        Self {
            emitter: SvgEmitter::new(out, StateProfile::TYPE1, type1::SCALE),
            paint: PaintContext::new(type1::SCALE.factor()),
            header: Type1Header::default(),
        }
    }

    pub fn state(&self) -> EmitState {
        self.emitter.state()
    }

    pub fn paint(&self) -> &PaintContext {
        &self.paint
    }

    /// The viewBox written when the first layer opens.
    pub fn view_box(&self) -> ViewBounds {
        let scale = type1::SCALE;
        ViewBounds::new(
            0,
            0,
            scale.round_units(self.header.x2),
            scale.round_units(self.header.y2),
        )
    }

    pub fn apply(&mut self, command: &Type1Command) -> Result<Flow> {
        match command {
            Type1Command::StartFile(header) => self.header = *header,
            Type1Command::StartLayer { .. } => {
                if self.emitter.state() == EmitState::Begin {
                    self.emitter.header(&self.view_box())?;
                }
                self.emitter.start_layer()?;
            }
            Type1Command::EndLayer => {
                if self.emitter.state() == EmitState::AfterClosePath {
                    tracing::warn!("missing END_PATH before END_LAYER");
                    self.emitter.end_path(&PathPaint::NONE)?;
                }
                self.emitter.end_layer()?;
            }
            Type1Command::StrokeColor(color) => self.paint.stroke = *color,
            Type1Command::FillColor(color) => self.paint.fill = *color,
            Type1Command::StrokeWidth(width) => self.paint.stroke_width = *width,
            Type1Command::StartPath(p) => self.emitter.start_path(*p)?,
            Type1Command::Line { points } => {
                for p in points {
                    self.emitter.line(*p)?;
                }
            }
            Type1Command::Cubic { cubics } => {
                for c in cubics {
                    self.emitter.cubic(c)?;
                }
            }
            Type1Command::ClosePath => self.emitter.close_path()?,
            Type1Command::EndPath(mode) => {
                let paint = self.paint.paint(mode.has_fill(), mode.has_stroke());
                self.emitter.end_path(&paint)?;
            }
            Type1Command::EndFile => {
                self.emitter.footer()?;
                return Ok(Flow::Stop);
            }
            Type1Command::LayerSeparator
            | Type1Command::Nop
            | Type1Command::Flag1(_)
            | Type1Command::Flag2(_)
            | Type1Command::Unknown { .. } => {}
        }
        Ok(Flow::Continue)
    }

    /// Flushes the output; fails unless END_FILE was converted.
    pub fn finish(self) -> Result<W> {
        self.emitter.finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Type1Report {
    pub commands: usize,
    pub reached_end_file: bool,
    pub trailing_data: bool,
}

/// Decodes every command, handing each to `observe` and then to `converter` when given.
///
/// Stops when the decoder passes END_FILE or the converter asks to, then probes for
/// trailing bytes.
pub fn run_type1<R, W>(
    decoder: &mut Type1Decoder<R>,
    mut converter: Option<&mut Type1Converter<W>>,
    mut observe: impl FnMut(&Type1Command),
) -> Result<Type1Report>
where
    R: Read,
    W: Write,
{
    let mut report = Type1Report::default();
    while let Some(command) = decoder.next_command()? {
        report.commands += 1;
        tracing::debug!(command = %command.name(), "type 1 command");
        observe(&command);
        if let Some(converter) = converter.as_deref_mut() {
            if converter.apply(&command)? == Flow::Stop {
                break;
            }
        }
    }
    report.reached_end_file = decoder.reached_end_file();

    if report.reached_end_file && !decoder.at_end()? {
        tracing::warn!("additional data past END_FILE marker");
        report.trailing_data = true;
    }
    Ok(report)
}

/// Converts a whole Type 1 stream to SVG.
pub fn convert_type1<R: Read, W: Write>(input: R, out: W) -> Result<(W, Type1Report)> {
    let mut decoder = Type1Decoder::new(input);
    let mut converter = Type1Converter::new(out);
    let report = run_type1(&mut decoder, Some(&mut converter), |_| {})?;
    Ok((converter.finish()?, report))
}
