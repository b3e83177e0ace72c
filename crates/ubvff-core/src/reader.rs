//! Byte-order-normalizing record reader.
//!
//! Words are read in native order and then corrected for the host. All on-disk words are
//! big-endian, so little-endian hosts apply [`swap2`] or [`swap4`] and big-endian hosts
//! keep them as read.
//!
//! Type 2 stores each 32-bit point coordinate as two big-endian 16-bit halves, low half
//! first. Little-endian hosts swap the bytes inside each half ([`swap_within_halves`]);
//! big-endian hosts rotate the two halves ([`rotate_halves`]). Both produce
//! `(hi << 16) | lo` for bytes `[lo_hi, lo_lo, hi_hi, hi_lo]`.

use crate::error::{Error, Result};
use crate::geom::{Point, ViewBounds};
use byteorder::{ByteOrder, NativeEndian};
use std::io::{self, Read, Seek, SeekFrom};

pub fn swap2(word: u16) -> u16 {
    word.rotate_left(8)
}

pub fn swap4(word: u32) -> u32 {
    ((word & 0x0000_00FF) << 24)
        | ((word & 0x0000_FF00) << 8)
        | ((word & 0x00FF_0000) >> 8)
        | ((word & 0xFF00_0000) >> 24)
}

pub fn swap_within_halves(word: u32) -> u32 {
    ((word & 0x00FF_00FF) << 8) | ((word & 0xFF00_FF00) >> 8)
}

pub fn rotate_halves(word: u32) -> u32 {
    word.rotate_left(16)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSize {
    One = 1,
    Two = 2,
    Four = 4,
}

impl RecordSize {
    pub fn bytes(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordLayout {
    /// Plain big-endian 16- and 32-bit words.
    BigEndian,
    /// Big-endian 16-bit words; 32-bit words are two 16-bit halves, low half first.
    SplitHalves,
}

impl WordLayout {
    fn decode_u16(self, raw: &[u8]) -> u16 {
        let native = NativeEndian::read_u16(raw);
        if cfg!(target_endian = "little") {
            swap2(native)
        } else {
            native
        }
    }

    fn decode_u32(self, raw: &[u8]) -> u32 {
        let native = NativeEndian::read_u32(raw);
        match self {
            WordLayout::BigEndian if cfg!(target_endian = "little") => swap4(native),
            WordLayout::BigEndian => native,
            WordLayout::SplitHalves => {
                if cfg!(target_endian = "little") {
                    swap_within_halves(native)
                } else {
                    rotate_halves(native)
                }
            }
        }
    }
}

/// Reads fixed-size records and returns them in host order.
///
/// When bounds tracking is enabled, every complete 4-byte read also updates the running
/// view bounds, treating successive words of one read as X, Y, X, Y, ...
#[derive(Debug)]
pub struct RecordReader<R> {
    inner: R,
    layout: WordLayout,
    bounds: Option<ViewBounds>,
}

impl<R> RecordReader<R> {
    pub fn new(inner: R, layout: WordLayout) -> Self {
        Self {
            inner,
            layout,
            bounds: None,
        }
    }

    pub fn with_bounds(mut self, initial: ViewBounds) -> Self {
        self.bounds = Some(initial);
        self
    }

    pub fn bounds(&self) -> Option<ViewBounds> {
        self.bounds
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> RecordReader<R> {
    /// Reads up to `out.len()` records of `size` bytes.
    ///
    /// Returns the number of complete records read; fewer than requested means the stream
    /// ended. Only I/O failures other than end-of-file are errors.
    pub fn read_records(&mut self, size: RecordSize, out: &mut [u32]) -> io::Result<usize> {
        let mut raw = [0u8; 4];
        let width = size.bytes();
        for (n, slot) in out.iter_mut().enumerate() {
            match self.inner.read_exact(&mut raw[..width]) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => return Ok(n),
                Err(err) => return Err(err),
            }
            *slot = match size {
                RecordSize::One => u32::from(raw[0]),
                RecordSize::Two => u32::from(self.layout.decode_u16(&raw[..2])),
                RecordSize::Four => self.layout.decode_u32(&raw),
            };
        }

        if size == RecordSize::Four {
            if let Some(bounds) = self.bounds.as_mut() {
                for (i, word) in out.iter().enumerate() {
                    let value = *word as i32;
                    if i % 2 == 0 {
                        bounds.observe_x(value);
                    } else {
                        bounds.observe_y(value);
                    }
                }
            }
        }
        Ok(out.len())
    }

    fn read_exact_records(
        &mut self,
        size: RecordSize,
        out: &mut [u32],
        what: &'static str,
    ) -> Result<()> {
        if self.read_records(size, out)? != out.len() {
            return Err(Error::Truncated { what });
        }
        Ok(())
    }

    pub fn read_u16(&mut self, what: &'static str) -> Result<u16> {
        Ok(self.read_u16s::<1>(what)?[0])
    }

    pub fn read_u16s<const N: usize>(&mut self, what: &'static str) -> Result<[u16; N]> {
        let mut words = [0u32; N];
        self.read_exact_records(RecordSize::Two, &mut words, what)?;
        Ok(words.map(|w| w as u16))
    }

    pub fn read_u32(&mut self, what: &'static str) -> Result<u32> {
        Ok(self.read_u32s::<1>(what)?[0])
    }

    pub fn read_u32s<const N: usize>(&mut self, what: &'static str) -> Result<[u32; N]> {
        let mut words = [0u32; N];
        self.read_exact_records(RecordSize::Four, &mut words, what)?;
        Ok(words)
    }

    pub fn read_i32s<const N: usize>(&mut self, what: &'static str) -> Result<[i32; N]> {
        Ok(self.read_u32s::<N>(what)?.map(|w| w as i32))
    }

    pub fn read_words(&mut self, count: u32, what: &'static str) -> Result<Vec<i32>> {
        let mut words = vec![0u32; count as usize];
        self.read_exact_records(RecordSize::Four, &mut words, what)?;
        Ok(words.into_iter().map(|w| w as i32).collect())
    }

    pub fn read_point(&mut self, what: &'static str) -> Result<Point> {
        let [x, y] = self.read_i32s::<2>(what)?;
        Ok(Point::new(x, y))
    }

    pub fn read_points(&mut self, count: u32, what: &'static str) -> Result<Vec<Point>> {
        let mut points = Vec::with_capacity((count as usize).min(1024));
        for _ in 0..count {
            points.push(self.read_point(what)?);
        }
        Ok(points)
    }

    /// Probes one more byte. `true` when the stream is exhausted.
    pub fn at_end(&mut self) -> Result<bool> {
        let mut probe = [0u32; 1];
        Ok(self.read_records(RecordSize::One, &mut probe)? == 0)
    }
}

impl<R: Seek> RecordReader<R> {
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        Ok(self.inner.seek(pos)?)
    }
}
