//! Assembly files: trees of include records that name which converted layers make up a
//! composite drawing.
//!
//! Each file opens with three big-endian `i32` words. A leaf names one layer; a group is
//! followed by three more header words and a stream of big-endian 16-bit commands, where
//! commands 3 and 4 carry the number of another assembly file to include.

use crate::error::{Error, Result};
use crate::reader::{RecordReader, RecordSize, WordLayout};
use serde::Serialize;
use std::fmt;
use std::io::Read;

/// Includes nested this deep are not opened.
pub const MAX_DEPTH: usize = 10;
/// The dump list overflows once it holds this many layers.
pub const MAX_LAYERS: usize = 100;
/// First header words at or above this value are not assembly files.
pub const TYPE_LIMIT: i32 = 100;

const LEAF: i32 = 1;
const MARKER_0X48: i32 = 0x48;

pub const INCLUDE_A: i16 = 3;
pub const INCLUDE_B: i16 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AssemblyHeader {
    pub kind: i32,
    pub param: i32,
    pub data: i32,
}

/// One layer to pull from `NNNNN.svg`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LayerRef {
    pub file: u16,
    pub layer: u16,
}

impl LayerRef {
    pub fn from_data(data: i32) -> Self {
        let data = data as u32;
        Self {
            file: (data >> 16) as u16,
            layer: (data & 0xFFFF) as u16,
        }
    }
}

/// Why an assembly file was not processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// A leaf given as the top-level file.
    Shallow,
    /// Not an assembly type at all.
    Type,
    /// Type 3 at top level.
    Three,
    Marker0x48,
    /// Header parameters do not describe a group.
    NotGroup,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::Shallow => "skip.shallow",
            SkipReason::Type => "skip.type",
            SkipReason::Three => "skip.three",
            SkipReason::Marker0x48 => "skip.0x48",
            SkipReason::NotGroup => "skip.not_group",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderClass {
    Leaf(LayerRef),
    Group,
    Skip(SkipReason),
}

pub fn classify(header: &AssemblyHeader, depth: usize) -> Result<HeaderClass> {
    let AssemblyHeader { kind, param, data } = *header;
    if kind == LEAF {
        if param != 0 {
            return Err(Error::WeirdHeader { value: param });
        }
        if depth == 0 {
            return Ok(HeaderClass::Skip(SkipReason::Shallow));
        }
        return Ok(HeaderClass::Leaf(LayerRef::from_data(data)));
    }
    let reason = if kind < 3 || kind >= TYPE_LIMIT {
        SkipReason::Type
    } else if kind == 3 && depth == 0 {
        SkipReason::Three
    } else if param == MARKER_0X48 {
        SkipReason::Marker0x48
    } else if param != 0 || data != 0 {
        SkipReason::NotGroup
    } else {
        return Ok(HeaderClass::Group);
    };
    Ok(HeaderClass::Skip(reason))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub extra: [i32; 3],
    /// Include numbers in file order.
    pub includes: Vec<u16>,
    /// The stream ended between an include command and its number.
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssemblyFile {
    Leaf(LayerRef),
    Group(Group),
    Skip(SkipReason),
}

/// Reads one assembly file; `depth` is 0 for the file named on the command line.
pub fn read_assembly<R: Read>(inner: R, depth: usize) -> Result<(AssemblyHeader, AssemblyFile)> {
    let mut reader = RecordReader::new(inner, WordLayout::BigEndian);
    let [kind, param, data] = reader.read_i32s::<3>("header")?;
    let header = AssemblyHeader { kind, param, data };

    let file = match classify(&header, depth)? {
        HeaderClass::Leaf(layer) => AssemblyFile::Leaf(layer),
        HeaderClass::Skip(reason) => AssemblyFile::Skip(reason),
        HeaderClass::Group => AssemblyFile::Group(read_group(&mut reader)?),
    };
    Ok((header, file))
}

fn read_group<R: Read>(reader: &mut RecordReader<R>) -> Result<Group> {
    let extra = reader.read_i32s::<3>("header part 2")?;
    let mut includes = Vec::new();
    let mut truncated = false;
    let mut word = [0u32; 1];
    while reader.read_records(RecordSize::Two, &mut word)? == 1 {
        let cmd = word[0] as u16 as i16;
        if cmd != INCLUDE_A && cmd != INCLUDE_B {
            continue;
        }
        if reader.read_records(RecordSize::Two, &mut word)? != 1 {
            truncated = true;
            break;
        }
        includes.push(word[0] as u16);
    }
    Ok(Group {
        extra,
        includes,
        truncated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header(kind: i32, param: i32, data: i32) -> AssemblyHeader {
        AssemblyHeader { kind, param, data }
    }

    #[test]
    fn leaf_at_top_level_is_shallow() {
        assert_eq!(
            classify(&header(1, 0, 0x0059_0002), 0).unwrap(),
            HeaderClass::Skip(SkipReason::Shallow)
        );
        assert_eq!(
            classify(&header(1, 0, 0x0059_0002), 1).unwrap(),
            HeaderClass::Leaf(LayerRef { file: 89, layer: 2 })
        );
    }

    #[test]
    fn leaf_with_parameter_is_rejected() {
        assert!(matches!(
            classify(&header(1, 5, 0), 1).unwrap_err(),
            Error::WeirdHeader { value: 5 }
        ));
    }

    #[test]
    fn rejection_order() {
        let cases = [
            (header(2, 0, 0), 1, SkipReason::Type),
            (header(100, 0, 0), 1, SkipReason::Type),
            (header(-4, 0, 0), 1, SkipReason::Type),
            (header(3, 0, 0), 0, SkipReason::Three),
            (header(3, 0x48, 0), 1, SkipReason::Marker0x48),
            (header(7, 0, 9), 1, SkipReason::NotGroup),
        ];
        for (h, depth, reason) in cases {
            assert_eq!(classify(&h, depth).unwrap(), HeaderClass::Skip(reason), "{h:?}");
        }
        assert_eq!(classify(&header(3, 0, 0), 1).unwrap(), HeaderClass::Group);
        assert_eq!(classify(&header(12, 0, 0), 0).unwrap(), HeaderClass::Group);
    }

    #[test]
    fn skip_reasons_print_as_diagnostics() {
        assert_eq!(SkipReason::Marker0x48.to_string(), "skip.0x48");
        assert_eq!(SkipReason::NotGroup.to_string(), "skip.not_group");
    }

    #[test]
    fn group_collects_includes_and_ignores_other_words() {
        let mut bytes = Vec::new();
        for w in [12i32, 0, 0, 1, 0, 0] {
            bytes.extend(w.to_be_bytes());
        }
        for w in [0u16, 3, 89, 7, 4, 93, 0, 0] {
            bytes.extend(w.to_be_bytes());
        }
        let (_, file) = read_assembly(Cursor::new(bytes), 0).unwrap();
        assert_eq!(
            file,
            AssemblyFile::Group(Group {
                extra: [1, 0, 0],
                includes: vec![89, 93],
                truncated: false,
            })
        );
    }

    #[test]
    fn truncated_include_stops_reading() {
        let mut bytes = Vec::new();
        for w in [12i32, 0, 0, 1, 0, 0] {
            bytes.extend(w.to_be_bytes());
        }
        for w in [3u16, 89, 4] {
            bytes.extend(w.to_be_bytes());
        }
        let (_, file) = read_assembly(Cursor::new(bytes), 0).unwrap();
        let AssemblyFile::Group(group) = file else {
            panic!("expected group");
        };
        assert_eq!(group.includes, vec![89]);
        assert!(group.truncated);
    }

    #[test]
    fn short_header_is_truncated() {
        let err = read_assembly(Cursor::new(vec![0u8; 8]), 0).unwrap_err();
        assert!(matches!(err, Error::Truncated { what: "header" }));
    }
}
