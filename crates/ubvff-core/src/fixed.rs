//! Fixed-point coordinates.
//!
//! Both variants store coordinates as signed 32-bit integers. Type 1 uses a scale of
//! `0x8000` per user unit, Type 2 uses `0x10000`.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scale(i32);

impl Scale {
    pub const TYPE1: Scale = Scale(0x8000);
    pub const TYPE2: Scale = Scale(0x10000);

    /// Non-positive factors are clamped to 1.
    pub fn new(factor: i32) -> Self {
        Self(factor.max(1))
    }

    pub fn factor(self) -> i32 {
        self.0
    }

    pub fn to_f64(self, raw: i32) -> f64 {
        f64::from(raw) / f64::from(self.0)
    }

    /// Converts a raw value to whole user units.
    ///
    /// With `q = floor(raw / S)` and `r = raw - q * S`, a remainder below a quarter of the
    /// scale keeps `q`; anything else moves one unit away from zero (`q + 1`, or `q - 1`
    /// for negative `q`).
    pub fn round_units(self, raw: i32) -> i32 {
        let d = self.0;
        let q = raw.div_euclid(d);
        let r = raw.rem_euclid(d);
        if r < d / 4 {
            q
        } else if q < 0 {
            q - 1
        } else {
            q + 1
        }
    }

    /// `raw` as a decimal string with exactly six fraction digits.
    pub fn format(self, raw: i32) -> String {
        format!("{:.6}", self.to_f64(raw))
    }

    /// Diagnostic form: right-aligned in an 11-character column followed by a space.
    pub fn format_column(self, raw: i32) -> String {
        format!("{:>11.6} ", self.to_f64(raw))
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self::TYPE1
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}", self.0)
    }
}
