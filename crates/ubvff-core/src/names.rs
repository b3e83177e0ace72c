//! File naming helpers and string escaping.
//!
//! These are pure string transforms; nothing here touches the filesystem.

use crate::error::{Error, Result};

/// Longest accepted input path for the converters.
pub const MAX_INPUT_NAME: usize = 290;
/// Longest accepted path for the assembler (input and output).
pub const MAX_ASSEMBLY_NAME: usize = 255;

pub fn check_len(what: &'static str, name: &str, max: usize) -> Result<()> {
    if name.len() > max {
        return Err(Error::NameTooLong {
            what,
            len: name.len(),
            max,
        });
    }
    Ok(())
}

pub fn is_auto(name: &str) -> bool {
    name == "auto"
}

/// Derives `foo.svg` from `foo.bin`.
///
/// A trailing extension is removed when a `.` occurs within the last five characters of a
/// name longer than five characters and no path separator follows it.
pub fn auto_svg_name(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut stem_end = bytes.len();
    if bytes.len() > 5 {
        let mut dot = None;
        for (i, b) in bytes.iter().enumerate().skip(bytes.len() - 5) {
            match b {
                b'/' | b'\\' => dot = None,
                b'.' => dot = Some(i),
                _ => {}
            }
        }
        if let Some(i) = dot {
            stem_end = i;
        }
    }
    format!("{}.svg", &input[..stem_end])
}

/// The part of `path` before a trailing `NNNNN.bin`, if the name ends that way.
pub fn numbered_prefix(path: &str) -> Option<&str> {
    let bytes = path.as_bytes();
    let len = bytes.len();
    if len <= 9 {
        return None;
    }
    let digits = &bytes[len - 9..len - 4];
    if digits.iter().all(u8::is_ascii_digit) && &bytes[len - 4..] == b".bin" {
        Some(&path[..len - 9])
    } else {
        None
    }
}

/// `<prefix>NNNNN.<ext>`
pub fn numbered_name(prefix: &str, number: u16, ext: &str) -> String {
    format!("{prefix}{number:05}.{ext}")
}

/// Points file for a Type 2 command file: same numbered prefix, number from the footer.
pub fn auto_points_name(command_file: &str, points_file: u16) -> String {
    numbered_name(numbered_prefix(command_file).unwrap_or(""), points_file, "bin")
}

/// Assembler output name: the assembly file name with `.bin` replaced by `.svg`.
pub fn auto_assembly_output(assembly_file: &str) -> Result<String> {
    match assembly_file.strip_suffix(".bin") {
        Some(stem) if assembly_file.len() > 5 => Ok(format!("{stem}.svg")),
        _ => Err(Error::NoAutoName {
            path: assembly_file.to_string(),
        }),
    }
}

/// Escapes control characters, non-ASCII characters and `\ ' "` as `\xHH`.
pub fn escape_display(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if !(' '..='~').contains(&ch) || matches!(ch, '\\' | '\'' | '"') {
            out.push_str(&format!("\\x{:02X}", u32::from(ch)));
        } else {
            out.push(ch);
        }
    }
    out
}
