//! SVG emission state machine.
//!
//! Every write goes through [`SvgEmitter`], which only allows an operation from the states
//! listed for it in the active [`StateProfile`]. An illegal operation writes nothing.

pub mod viewbox;

use crate::paint::PathPaint;
use crate::{Error, Result};
use std::fmt;
use std::io::{Seek, Write};
use ubvff_core::{Cubic, Point, Scale, ViewBounds};

pub const SVG_ATTRS: &str =
    r#" version="1.1" baseProfile="full" xmlns="http://www.w3.org/2000/svg">"#;
pub const SVG_FOOTER: &str = "</svg>\n";
pub const LAYER_OPEN: &str = "<g>\n";
pub const LAYER_CLOSE: &str = "</g>\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitState {
    Begin,
    AfterHeader,
    AfterStartLayer,
    AfterStartPath,
    AfterLine,
    AfterClosePath,
    AfterEndPath,
    AfterEndLayer,
    AfterFooter,
}

impl EmitState {
    pub fn as_str(self) -> &'static str {
        match self {
            EmitState::Begin => "BEGIN",
            EmitState::AfterHeader => "AFTER_HEADER",
            EmitState::AfterStartLayer => "AFTER_START_LAYER",
            EmitState::AfterStartPath => "AFTER_START_PATH",
            EmitState::AfterLine => "AFTER_LINE",
            EmitState::AfterClosePath => "AFTER_CLOSE_PATH",
            EmitState::AfterEndPath => "AFTER_END_PATH",
            EmitState::AfterEndLayer => "AFTER_END_LAYER",
            EmitState::AfterFooter => "AFTER_FOOTER",
        }
    }
}

impl fmt::Display for EmitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitOp {
    Header,
    StartLayer,
    StartPath,
    Line,
    Cubic,
    ClosePath,
    EndPath,
    Embed,
    EndLayer,
    Footer,
}

impl EmitOp {
    pub fn as_str(self) -> &'static str {
        match self {
            EmitOp::Header => "header",
            EmitOp::StartLayer => "start_layer",
            EmitOp::StartPath => "start_path",
            EmitOp::Line => "line",
            EmitOp::Cubic => "cubic",
            EmitOp::ClosePath => "close_path",
            EmitOp::EndPath => "end_path",
            EmitOp::Embed => "embed",
            EmitOp::EndLayer => "end_layer",
            EmitOp::Footer => "footer",
        }
    }

    fn target(self) -> EmitState {
        match self {
            EmitOp::Header => EmitState::AfterHeader,
            EmitOp::StartLayer => EmitState::AfterStartLayer,
            EmitOp::StartPath => EmitState::AfterStartPath,
            EmitOp::Line | EmitOp::Cubic => EmitState::AfterLine,
            EmitOp::ClosePath => EmitState::AfterClosePath,
            EmitOp::EndPath | EmitOp::Embed => EmitState::AfterEndPath,
            EmitOp::EndLayer => EmitState::AfterEndLayer,
            EmitOp::Footer => EmitState::AfterFooter,
        }
    }
}

impl fmt::Display for EmitOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which transitions a document kind allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateProfile {
    /// Paths live inside `<g>` layers.
    pub layered: bool,
    /// A footer may directly follow the header.
    pub allow_empty_document: bool,
    /// Layers may hold pre-rendered content instead of paths.
    pub allow_embed: bool,
}

impl StateProfile {
    pub const TYPE1: StateProfile = StateProfile {
        layered: true,
        allow_empty_document: false,
        allow_embed: false,
    };

    pub const TYPE2: StateProfile = StateProfile {
        layered: false,
        allow_empty_document: false,
        allow_embed: false,
    };

    pub const COMPOSITE: StateProfile = StateProfile {
        layered: true,
        allow_empty_document: true,
        allow_embed: true,
    };

    /// State after `op`, or `None` when `op` is illegal in `from`.
    pub fn next_state(&self, op: EmitOp, from: EmitState) -> Option<EmitState> {
        use EmitState::*;

        let legal = match op {
            EmitOp::Header => from == Begin,
            EmitOp::StartLayer => self.layered && matches!(from, AfterHeader | AfterEndLayer),
            EmitOp::StartPath => {
                matches!(from, AfterClosePath | AfterLine | AfterEndPath)
                    || from == self.path_container_state()
            }
            EmitOp::Line | EmitOp::Cubic => matches!(from, AfterStartPath | AfterLine),
            EmitOp::ClosePath => {
                from == AfterLine || (!self.layered && from == AfterStartPath)
            }
            EmitOp::EndPath => matches!(from, AfterLine | AfterClosePath),
            EmitOp::Embed => self.allow_embed && from == AfterStartLayer,
            EmitOp::EndLayer => self.layered && matches!(from, AfterEndPath | AfterStartLayer),
            EmitOp::Footer => {
                let last = if self.layered {
                    AfterEndLayer
                } else {
                    AfterEndPath
                };
                from == last || (self.allow_empty_document && from == AfterHeader)
            }
        };
        legal.then(|| op.target())
    }

    /// State in which the first path of a container opens.
    fn path_container_state(&self) -> EmitState {
        if self.layered {
            EmitState::AfterStartLayer
        } else {
            EmitState::AfterHeader
        }
    }
}

/// Writes one SVG document.
#[derive(Debug)]
pub struct SvgEmitter<W> {
    out: W,
    profile: StateProfile,
    scale: Scale,
    state: EmitState,
    deferred_viewbox: bool,
}

impl<W: Write> SvgEmitter<W> {
    pub fn new(out: W, profile: StateProfile, scale: Scale) -> Self {
        Self {
            out,
            profile,
            scale,
            state: EmitState::Begin,
            deferred_viewbox: false,
        }
    }

    pub fn state(&self) -> EmitState {
        self.state
    }

    pub fn profile(&self) -> StateProfile {
        self.profile
    }

    pub fn is_complete(&self) -> bool {
        self.state == EmitState::AfterFooter
    }

    fn check(&self, op: EmitOp) -> Result<EmitState> {
        self.profile
            .next_state(op, self.state)
            .ok_or(Error::IllegalTransition {
                op,
                state: self.state,
            })
    }

    fn emit(&mut self, op: EmitOp, text: &str) -> Result<()> {
        let next = self.check(op)?;
        self.out.write_all(text.as_bytes())?;
        self.state = next;
        Ok(())
    }

    /// Opens the document with a known viewBox.
    pub fn header(&mut self, view_box: &ViewBounds) -> Result<()> {
        let [min_x, min_y, max_x, max_y] = view_box.to_array();
        let text = format!(
            "{}\"{min_x} {min_y} {max_x} {max_y}\"{SVG_ATTRS}\n",
            viewbox::SVG_OPEN_PREFIX
        );
        self.emit(EmitOp::Header, &text)
    }

    /// Opens the document with a fixed-width placeholder to be patched by
    /// [`SvgEmitter::patch_viewbox`].
    pub fn header_deferred(&mut self) -> Result<()> {
        let text = format!(
            "{}{}{SVG_ATTRS}\n",
            viewbox::SVG_OPEN_PREFIX,
            viewbox::PLACEHOLDER
        );
        self.emit(EmitOp::Header, &text)?;
        self.deferred_viewbox = true;
        Ok(())
    }

    pub fn start_layer(&mut self) -> Result<()> {
        self.emit(EmitOp::StartLayer, LAYER_OPEN)
    }

    pub fn start_path(&mut self, p: Point) -> Result<()> {
        self.check(EmitOp::StartPath)?;
        let lead = match self.state {
            EmitState::AfterClosePath | EmitState::AfterLine => "M ",
            _ => "<path d=\"M ",
        };
        let text = format!("{lead}{} {} ", self.scale.format(p.x), self.scale.format(p.y));
        self.emit(EmitOp::StartPath, &text)
    }

    pub fn line(&mut self, p: Point) -> Result<()> {
        let text = format!("L {} {} ", self.scale.format(p.x), self.scale.format(p.y));
        self.emit(EmitOp::Line, &text)
    }

    pub fn cubic(&mut self, c: &Cubic) -> Result<()> {
        let s = self.scale;
        let [a, b, e] = c.points;
        let text = format!(
            "C {} {}, {} {}, {} {} ",
            s.format(a.x),
            s.format(a.y),
            s.format(b.x),
            s.format(b.y),
            s.format(e.x),
            s.format(e.y)
        );
        self.emit(EmitOp::Cubic, &text)
    }

    pub fn close_path(&mut self) -> Result<()> {
        self.emit(EmitOp::ClosePath, "Z ")
    }

    pub fn end_path(&mut self, paint: &PathPaint) -> Result<()> {
        let fill = match paint.fill {
            Some(color) => format!("fill=\"{}\" ", color.css()),
            None => "fill=\"none\" ".to_string(),
        };
        let stroke = match paint.stroke {
            Some(stroke) => format!(
                "stroke=\"{}\" stroke-width=\"{}\" stroke-linecap=\"butt\" stroke-linejoin=\"miter\" stroke-miterlimit=\"10\" ",
                stroke.color.css(),
                self.scale.format(stroke.width)
            ),
            None => "stroke=\"none\" ".to_string(),
        };
        self.emit(EmitOp::EndPath, &format!("\" {fill}{stroke}/>\n"))
    }

    /// Copies pre-rendered SVG content into the open layer.
    pub fn embed(&mut self, body: &[u8]) -> Result<()> {
        let next = self.check(EmitOp::Embed)?;
        self.out.write_all(body)?;
        self.state = next;
        Ok(())
    }

    pub fn end_layer(&mut self) -> Result<()> {
        self.emit(EmitOp::EndLayer, LAYER_CLOSE)
    }

    pub fn footer(&mut self) -> Result<()> {
        self.emit(EmitOp::Footer, SVG_FOOTER)
    }

    /// Flushes and fails unless the footer was written.
    pub fn finish(mut self) -> Result<W> {
        self.out.flush()?;
        if !self.is_complete() {
            return Err(Error::Incomplete { state: self.state });
        }
        Ok(self.out)
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Seek> SvgEmitter<W> {
    /// Overwrites the placeholder written by [`SvgEmitter::header_deferred`].
    pub fn patch_viewbox(&mut self, bounds: &ViewBounds) -> Result<()> {
        if !self.deferred_viewbox {
            return Err(Error::ViewBoxNotDeferred);
        }
        viewbox::patch(&mut self.out, bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::Stroke;
    use ubvff_core::Color;

    fn emitter(profile: StateProfile) -> SvgEmitter<Vec<u8>> {
        SvgEmitter::new(Vec::new(), profile, Scale::TYPE1)
    }

    fn text(e: SvgEmitter<Vec<u8>>) -> String {
        String::from_utf8(e.into_inner()).unwrap()
    }

    #[test]
    fn layered_document() {
        let mut e = emitter(StateProfile::TYPE1);
        e.header(&ViewBounds::new(0, 0, 10, 20)).unwrap();
        e.start_layer().unwrap();
        e.start_path(Point::new(0, 0)).unwrap();
        e.line(Point::new(0x8000, 0)).unwrap();
        e.close_path().unwrap();
        e.end_path(&PathPaint {
            fill: Some(Color::rgb(255, 0, 0)),
            stroke: None,
        })
        .unwrap();
        e.end_layer().unwrap();
        e.footer().unwrap();
        assert!(e.is_complete());
        assert_eq!(
            text(e),
            concat!(
                "<svg viewBox=\"0 0 10 20\" version=\"1.1\" baseProfile=\"full\" xmlns=\"http://www.w3.org/2000/svg\">\n",
                "<g>\n",
                "<path d=\"M 0.000000 0.000000 L 1.000000 0.000000 Z \" fill=\"rgb(255,0,0)\" stroke=\"none\" />\n",
                "</g>\n",
                "</svg>\n",
            )
        );
    }

    #[test]
    fn subpaths_continue_the_same_element() {
        let mut e = emitter(StateProfile::TYPE2);
        e.header_deferred().unwrap();
        e.start_path(Point::new(0, 0)).unwrap();
        e.close_path().unwrap();
        e.start_path(Point::new(0x8000, 0x8000)).unwrap();
        e.cubic(&Cubic {
            points: [Point::new(0, 0), Point::new(0x4000, 0), Point::new(0x8000, -0x8000)],
        })
        .unwrap();
        e.end_path(&PathPaint {
            fill: None,
            stroke: Some(Stroke {
                color: Color::rgb(0, 0, 255),
                width: 0x8000,
            }),
        })
        .unwrap();
        let out = text(e);
        assert!(out.ends_with(
            "<path d=\"M 0.000000 0.000000 Z M 1.000000 1.000000 C 0.000000 0.000000, 0.500000 0.000000, 1.000000 -1.000000 \" fill=\"none\" stroke=\"rgb(0,0,255)\" stroke-width=\"1.000000\" stroke-linecap=\"butt\" stroke-linejoin=\"miter\" stroke-miterlimit=\"10\" />\n"
        ));
    }

    #[test]
    fn illegal_operation_writes_nothing() {
        let mut e = emitter(StateProfile::TYPE1);
        e.header(&ViewBounds::unit(1)).unwrap();
        let before = e.out.len();
        let err = e.line(Point::new(0, 0)).unwrap_err();
        assert!(matches!(
            err,
            Error::IllegalTransition {
                op: EmitOp::Line,
                state: EmitState::AfterHeader
            }
        ));
        assert_eq!(err.to_string(), "invalid state in line: AFTER_HEADER");
        assert_eq!(e.out.len(), before);
        assert_eq!(e.state(), EmitState::AfterHeader);
    }

    #[test]
    fn profiles_differ_where_expected() {
        use EmitState::*;
        let t1 = StateProfile::TYPE1;
        let t2 = StateProfile::TYPE2;
        let comp = StateProfile::COMPOSITE;

        assert_eq!(t1.next_state(EmitOp::StartPath, AfterHeader), None);
        assert_eq!(t2.next_state(EmitOp::StartPath, AfterHeader), Some(AfterStartPath));
        assert_eq!(t1.next_state(EmitOp::ClosePath, AfterStartPath), None);
        assert_eq!(t2.next_state(EmitOp::ClosePath, AfterStartPath), Some(AfterClosePath));
        assert_eq!(t2.next_state(EmitOp::StartLayer, AfterHeader), None);
        assert_eq!(t1.next_state(EmitOp::Footer, AfterEndPath), None);
        assert_eq!(t2.next_state(EmitOp::Footer, AfterEndPath), Some(AfterFooter));
        assert_eq!(t1.next_state(EmitOp::Footer, AfterHeader), None);
        assert_eq!(comp.next_state(EmitOp::Footer, AfterHeader), Some(AfterFooter));
        assert_eq!(t1.next_state(EmitOp::Embed, AfterStartLayer), None);
        assert_eq!(comp.next_state(EmitOp::Embed, AfterStartLayer), Some(AfterEndPath));
        assert_eq!(t1.next_state(EmitOp::EndLayer, AfterStartLayer), Some(AfterEndLayer));
        assert_eq!(t1.next_state(EmitOp::EndLayer, AfterClosePath), None);
    }

    #[test]
    fn nothing_follows_the_footer() {
        let all = [
            EmitOp::Header,
            EmitOp::StartLayer,
            EmitOp::StartPath,
            EmitOp::Line,
            EmitOp::Cubic,
            EmitOp::ClosePath,
            EmitOp::EndPath,
            EmitOp::Embed,
            EmitOp::EndLayer,
            EmitOp::Footer,
        ];
        for profile in [StateProfile::TYPE1, StateProfile::TYPE2, StateProfile::COMPOSITE] {
            for op in all {
                assert_eq!(profile.next_state(op, EmitState::AfterFooter), None, "{op}");
            }
        }
    }

    #[test]
    fn finish_requires_footer() {
        let mut e = emitter(StateProfile::TYPE2);
        e.header_deferred().unwrap();
        assert!(matches!(
            e.finish().unwrap_err(),
            Error::Incomplete {
                state: EmitState::AfterHeader
            }
        ));
    }

    #[test]
    fn patch_requires_deferred_header() {
        let mut e = SvgEmitter::new(std::io::Cursor::new(Vec::new()), StateProfile::TYPE1, Scale::TYPE1);
        e.header(&ViewBounds::unit(1)).unwrap();
        assert!(matches!(
            e.patch_viewbox(&ViewBounds::unit(1)).unwrap_err(),
            Error::ViewBoxNotDeferred
        ));
    }
}
