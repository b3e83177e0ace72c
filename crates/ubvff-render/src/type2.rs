//! Type 2 to SVG.
//!
//! The document extent is only known after the last point has been read, so the header is
//! written with a placeholder viewBox that END_FILE patches in place.

use crate::paint::PaintContext;
use crate::svg::{EmitState, StateProfile, SvgEmitter};
use crate::{Flow, Result};
use std::io::{Read, Seek, Write};
use ubvff_core::type2::{self, EndPathKind, Type2Command, Type2Decoder};
use ubvff_core::ViewBounds;

#[derive(Debug)]
pub struct Type2Converter<W> {
    emitter: SvgEmitter<W>,
    paint: PaintContext,
}

impl<W: Write + Seek> Type2Converter<W> {
    /// Starts the document; the header goes out immediately.
    pub fn new(out: W) -> Result<Self> {
        let mut emitter = SvgEmitter::new(out, StateProfile::TYPE2, type2::SCALE);
        emitter.header_deferred()?;
        Ok(Self {
            emitter,
            paint: PaintContext::new(type2::SCALE.factor()),
        })
    }

    pub fn state(&self) -> EmitState {
        self.emitter.state()
    }

    pub fn paint(&self) -> &PaintContext {
        &self.paint
    }

    /// `bounds` are the raw point bounds seen so far; END_FILE writes them as the viewBox.
    pub fn apply(&mut self, command: &Type2Command, bounds: &ViewBounds) -> Result<Flow> {
        match command {
            Type2Command::EndFile { .. } => {
                self.emitter.footer()?;
                let scale = type2::SCALE;
                self.emitter
                    .patch_viewbox(&bounds.map(|v| scale.round_units(v)))?;
                return Ok(Flow::Stop);
            }
            Type2Command::MoveTo(p) => self.emitter.start_path(*p)?,
            Type2Command::Lines { points } => {
                for p in points {
                    self.emitter.line(*p)?;
                }
            }
            Type2Command::Cubics { cubics } => {
                for c in cubics {
                    self.emitter.cubic(c)?;
                }
            }
            Type2Command::StrokeColor(color) => self.paint.stroke = *color,
            Type2Command::FillColor(color) => self.paint.fill = *color,
            Type2Command::EndPath(kind) => self.end_path(*kind)?,
            Type2Command::StrokeFlagA(v) => self.paint.flag_a = *v,
            Type2Command::StrokeFlagB(v) => self.paint.flag_b = *v,
            Type2Command::StrokeWidth(width) => self.paint.stroke_width = *width,
            Type2Command::Unknown { .. } => {}
        }
        Ok(Flow::Continue)
    }

    fn end_path(&mut self, kind: EndPathKind) -> Result<()> {
        match kind {
            EndPathKind::CloseFill => {
                self.emitter.close_path()?;
                self.paint.has_stroke = false;
                self.paint.has_fill = true;
            }
            EndPathKind::Stroke => self.paint.has_stroke = true,
            EndPathKind::Finish => self.emitter.end_path(&self.paint.current())?,
            EndPathKind::NoFill => self.paint.has_fill = false,
            EndPathKind::UnpaintedStart | EndPathKind::UnpaintedEnd => {}
        }
        Ok(())
    }

    pub fn finish(self) -> Result<W> {
        self.emitter.finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Type2Report {
    pub declared: u16,
    pub consumed: u16,
    pub reached_end_file: bool,
    pub trailing_commands: bool,
    pub trailing_points: bool,
    /// Raw point bounds.
    pub bounds: ViewBounds,
}

impl Type2Report {
    pub fn counts_match(&self) -> bool {
        self.declared == self.consumed
    }
}

/// Decodes records until END_FILE or the declared count, handing each command to
/// `observe` and then to `converter` when given.
pub fn run_type2<C, P, W>(
    decoder: &mut Type2Decoder<C, P>,
    mut converter: Option<&mut Type2Converter<W>>,
    mut observe: impl FnMut(&Type2Command),
) -> Result<Type2Report>
where
    C: Read,
    P: Read,
    W: Write + Seek,
{
    while let Some(command) = decoder.next_command()? {
        tracing::debug!(command = %command.name(), "type 2 command");
        observe(&command);
        if let Some(converter) = converter.as_deref_mut() {
            if converter.apply(&command, &decoder.bounds())? == Flow::Stop {
                break;
            }
        }
    }

    let mut report = Type2Report {
        declared: decoder.header().command_count,
        consumed: decoder.consumed(),
        reached_end_file: decoder.reached_end_file(),
        trailing_commands: false,
        trailing_points: false,
        bounds: decoder.bounds(),
    };
    if report.reached_end_file {
        report.trailing_commands = decoder.trailing_commands()?;
        if report.trailing_commands {
            tracing::warn!("additional data past END_FILE marker");
        }
        report.trailing_points = decoder.trailing_points()?;
        if report.trailing_points {
            tracing::warn!("didn't reach end of points file");
        }
    }
    if !report.counts_match() {
        tracing::warn!(
            "command counter got to {} of {}",
            report.consumed,
            report.declared
        );
    }
    Ok(report)
}
