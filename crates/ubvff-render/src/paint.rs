use ubvff_core::Color;

/// Paint attributes for one `<path>` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PathPaint {
    pub fill: Option<Color>,
    pub stroke: Option<Stroke>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stroke {
    pub color: Color,
    /// Raw fixed-point width.
    pub width: i32,
}

impl PathPaint {
    pub const NONE: PathPaint = PathPaint {
        fill: None,
        stroke: None,
    };
}

/// Paint state accumulated while decoding.
///
/// Colors and widths apply to the next path that ends, never to one already written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaintContext {
    pub fill: Color,
    pub stroke: Color,
    pub stroke_width: i32,
    pub has_fill: bool,
    pub has_stroke: bool,
    pub flag_a: u16,
    pub flag_b: u16,
}

impl PaintContext {
    pub fn new(initial_stroke_width: i32) -> Self {
        Self {
            fill: Color::default(),
            stroke: Color::default(),
            stroke_width: initial_stroke_width,
            has_fill: false,
            has_stroke: false,
            flag_a: 0,
            flag_b: 0,
        }
    }

    pub fn paint(&self, has_fill: bool, has_stroke: bool) -> PathPaint {
        PathPaint {
            fill: has_fill.then_some(self.fill),
            stroke: has_stroke.then_some(Stroke {
                color: self.stroke,
                width: self.stroke_width,
            }),
        }
    }

    /// Paint from the accumulated `has_fill` / `has_stroke` flags.
    pub fn current(&self) -> PathPaint {
        self.paint(self.has_fill, self.has_stroke)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paint_snapshots_current_colors() {
        let mut ctx = PaintContext::new(0x8000);
        ctx.fill = Color::rgb(1, 2, 3);
        let paint = ctx.paint(true, false);
        ctx.fill = Color::rgb(9, 9, 9);
        assert_eq!(paint.fill, Some(Color::rgb(1, 2, 3)));
        assert_eq!(paint.stroke, None);
    }

    #[test]
    fn current_uses_flags() {
        let mut ctx = PaintContext::new(0x10000);
        assert_eq!(ctx.current(), PathPaint::NONE);
        ctx.has_stroke = true;
        assert_eq!(
            ctx.current().stroke,
            Some(Stroke {
                color: Color::default(),
                width: 0x10000
            })
        );
    }
}
