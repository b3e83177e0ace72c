use serde::Serialize;

/// A point in raw fixed-point units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Two control points followed by the end point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cubic {
    pub points: [Point; 3],
}

impl Cubic {
    pub fn from_points(points: &[Point]) -> Option<Self> {
        match points {
            [a, b, c] => Some(Self {
                points: [*a, *b, *c],
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Color {
    pub r: u16,
    pub g: u16,
    pub b: u16,
}

impl Color {
    pub const fn rgb(r: u16, g: u16, b: u16) -> Self {
        Self { r, g, b }
    }

    /// Type 1 colors are big-endian words laid out as `0x00BBGGRR`.
    pub fn from_type1_word(word: u32) -> Self {
        Self {
            r: (word & 0xFF) as u16,
            g: ((word >> 8) & 0xFF) as u16,
            b: ((word >> 16) & 0xFF) as u16,
        }
    }

    pub fn css(&self) -> String {
        format!("rgb({},{},{})", self.r, self.g, self.b)
    }
}

/// Running `(min_x, min_y, max_x, max_y)` box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ViewBounds {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl ViewBounds {
    pub const fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// A unit box `(0, 0, unit, unit)`.
    pub const fn unit(unit: i32) -> Self {
        Self::new(0, 0, unit, unit)
    }

    pub fn observe_x(&mut self, x: i32) {
        if x > self.max_x {
            self.max_x = x;
        } else if x < self.min_x {
            self.min_x = x;
        }
    }

    pub fn observe_y(&mut self, y: i32) {
        if y > self.max_y {
            self.max_y = y;
        } else if y < self.min_y {
            self.min_y = y;
        }
    }

    /// Grows this box so it also covers `other`.
    pub fn fold(&mut self, other: &ViewBounds) {
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    pub fn to_array(&self) -> [i32; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }

    pub fn map(&self, f: impl Fn(i32) -> i32) -> Self {
        Self::new(f(self.min_x), f(self.min_y), f(self.max_x), f(self.max_y))
    }
}
