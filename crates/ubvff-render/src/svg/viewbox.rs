//! Deferred viewBox handling.
//!
//! Documents whose extent is only known at the end start with a fixed-width placeholder
//! right after [`SVG_OPEN_PREFIX`]. The placeholder is later overwritten in place with the
//! quoted bounds, right-padded with spaces, so the document length never changes.
//! Fragment readers find the first number one byte further, past the opening quote.

use crate::{Error, Result};
use std::io::{Seek, SeekFrom, Write};
use ubvff_core::ViewBounds;

pub const SVG_OPEN_PREFIX: &str = "<svg viewBox=";
pub const PLACEHOLDER: &str = "\"VIEWBOX_PLACEHOLDER_1234\"";
pub const PLACEHOLDER_WIDTH: usize = PLACEHOLDER.len();
pub const PLACEHOLDER_OFFSET: u64 = SVG_OPEN_PREFIX.len() as u64;
/// Offset of the first viewBox number in a converted document.
pub const VALUES_OFFSET: usize = SVG_OPEN_PREFIX.len() + 1;

/// `"minX minY maxX maxY"` padded to [`PLACEHOLDER_WIDTH`].
pub fn format_patch(bounds: &ViewBounds) -> Result<String> {
    let [min_x, min_y, max_x, max_y] = bounds.to_array();
    let text = format!("\"{min_x} {min_y} {max_x} {max_y}\"");
    if text.len() > PLACEHOLDER_WIDTH {
        return Err(Error::ViewBoxOverflow { text });
    }
    Ok(format!("{text:<PLACEHOLDER_WIDTH$}"))
}

/// Writes `bounds` over the placeholder and restores the write position.
pub fn patch<W: Write + Seek>(out: &mut W, bounds: &ViewBounds) -> Result<()> {
    let text = format_patch(bounds)?;
    out.flush()?;
    let pos = out.stream_position()?;
    out.seek(SeekFrom::Start(PLACEHOLDER_OFFSET))?;
    out.write_all(text.as_bytes())?;
    out.seek(SeekFrom::Start(pos))?;
    Ok(())
}

/// Reads four integers starting at [`VALUES_OFFSET`] of a document head.
///
/// Leading whitespace before each number is skipped and each number ends at its first
/// non-digit, so both a patched viewBox and an immediate one parse.
pub fn parse_header_viewbox(head: &[u8]) -> Option<ViewBounds> {
    let mut rest = head.get(VALUES_OFFSET..)?;
    let mut values = [0i32; 4];
    for value in &mut values {
        let (parsed, tail) = scan_int(rest)?;
        *value = parsed;
        rest = tail;
    }
    let [min_x, min_y, max_x, max_y] = values;
    Some(ViewBounds::new(min_x, min_y, max_x, max_y))
}

fn scan_int(input: &[u8]) -> Option<(i32, &[u8])> {
    let start = input.iter().position(|b| !b.is_ascii_whitespace())?;
    let input = &input[start..];
    let (negative, digits) = match input.first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };
    let len = digits.iter().take_while(|b| b.is_ascii_digit()).count();
    if len == 0 {
        return None;
    }
    let mut value: i64 = 0;
    for b in &digits[..len] {
        value = value.checked_mul(10)?.checked_add(i64::from(b - b'0'))?;
    }
    if negative {
        value = -value;
    }
    Some((i32::try_from(value).ok()?, &digits[len..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn offsets_line_up_with_the_header() {
        assert_eq!(PLACEHOLDER_WIDTH, 26);
        assert_eq!(PLACEHOLDER_OFFSET, 13);
        assert_eq!(VALUES_OFFSET, 14);
    }

    #[test]
    fn patch_keeps_length_and_pads() {
        let doc = format!("{SVG_OPEN_PREFIX}{PLACEHOLDER} version=\"1.1\">\n<g>\n");
        let mut cur = Cursor::new(doc.clone().into_bytes());
        cur.seek(SeekFrom::End(0)).unwrap();
        patch(&mut cur, &ViewBounds::new(-1, 0, 12, 34)).unwrap();
        assert_eq!(cur.position(), doc.len() as u64);
        let out = String::from_utf8(cur.into_inner()).unwrap();
        assert_eq!(out.len(), doc.len());
        let expected = format!("<svg viewBox=\"-1 0 12 34\"{} version=", " ".repeat(14));
        assert!(out.starts_with(&expected), "{out}");
    }

    #[test]
    fn oversized_bounds_are_rejected() {
        let huge = ViewBounds::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX);
        assert!(matches!(
            format_patch(&huge).unwrap_err(),
            Error::ViewBoxOverflow { .. }
        ));
        assert_eq!(format_patch(&ViewBounds::unit(1)).unwrap().len(), 26);
    }

    #[test]
    fn reads_back_patched_and_immediate_headers() {
        let patched = b"<svg viewBox=\"-3 0 120 45\"           version";
        assert_eq!(
            parse_header_viewbox(patched),
            Some(ViewBounds::new(-3, 0, 120, 45))
        );
        let plain = b"<svg viewBox=\"0 0 7 9\" version";
        assert_eq!(parse_header_viewbox(plain), Some(ViewBounds::new(0, 0, 7, 9)));
        let placeholder = format!("{SVG_OPEN_PREFIX}{PLACEHOLDER}");
        assert_eq!(parse_header_viewbox(placeholder.as_bytes()), None);
        assert_eq!(parse_header_viewbox(b"<svg"), None);
    }
}
