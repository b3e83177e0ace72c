//! Opcode tables for both variants.
//!
//! The tables name every opcode for diagnostics and tell the decoders how much payload
//! follows it. Decoding never fails on an opcode missing from a table; callers fall back
//! to [`unknown_name`].

use std::borrow::Cow;

/// Shape of the data following an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    None,
    /// A fixed number of 32-bit words.
    Words(u8),
    /// A 32-bit length, then one character per 32-bit word.
    PaddedString,
    /// A 32-bit point count, then that many points.
    CountedPoints,
    /// Four 16-bit parameters in the command record; no point data.
    Params,
    /// Four 16-bit parameters; points are pulled from the point stream.
    StreamPoints,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeInfo {
    pub code: u32,
    pub name: &'static str,
    pub payload: Payload,
}

const fn op(code: u32, name: &'static str, payload: Payload) -> OpcodeInfo {
    OpcodeInfo {
        code,
        name,
        payload,
    }
}

pub mod type1 {
    pub const LAYER_SEP: u32 = 0x00;
    pub const START_LAYER: u32 = 0x01;
    pub const END_LAYER: u32 = 0x02;
    pub const START_FILE: u32 = 0x03;
    pub const STROKE_COLOR: u32 = 0x04;
    pub const FILL_COLOR: u32 = 0x05;
    pub const START_PATH: u32 = 0x06;
    pub const LINE: u32 = 0x07;
    pub const CUBIC: u32 = 0x08;
    pub const END_PATH_STROKE: u32 = 0x09;
    pub const END_PATH_FILL: u32 = 0x0A;
    pub const END_PATH_STROKE_FILL: u32 = 0x0B;
    pub const NOP: u32 = 0x0C;
    pub const CLOSE_PATH: u32 = 0x0D;
    pub const FLAG1: u32 = 0x0E;
    pub const FLAG2: u32 = 0x0F;
    pub const STROKE_WIDTH: u32 = 0x10;
    pub const END_FILE: u32 = 0x15;
}

pub mod type2 {
    pub const END_FILE: u16 = 0x01;
    pub const MOVE_TO: u16 = 0x02;
    pub const POINTS_LINES: u16 = 0x03;
    pub const POINTS_CUBICS: u16 = 0x04;
    pub const STROKE_COLOR: u16 = 0x05;
    pub const FILL_COLOR: u16 = 0x06;
    pub const END_PATH: u16 = 0x07;
    pub const STROKE_FLAG_A: u16 = 0x08;
    pub const STROKE_FLAG_B: u16 = 0x09;
    pub const STROKE_WIDTH: u16 = 0x0A;
}

pub static TYPE1_OPCODES: &[OpcodeInfo] = &[
    op(type1::LAYER_SEP, "CMD_00_LAYER_SEP", Payload::None),
    op(type1::START_LAYER, "CMD_01_START_LAYER", Payload::PaddedString),
    op(type1::END_LAYER, "CMD_02_END_LAYER", Payload::None),
    op(type1::START_FILE, "CMD_03_START_FILE", Payload::Words(5)),
    op(type1::STROKE_COLOR, "CMD_04_STROKE_COLOR", Payload::Words(1)),
    op(type1::FILL_COLOR, "CMD_05_FILL_COLOR", Payload::Words(1)),
    op(type1::START_PATH, "CMD_06_START_PATH", Payload::Words(2)),
    op(type1::LINE, "CMD_07_LINE", Payload::CountedPoints),
    op(type1::CUBIC, "CMD_08_CUBIC", Payload::CountedPoints),
    op(type1::END_PATH_STROKE, "CMD_09_END_PATH_SO", Payload::None),
    op(type1::END_PATH_FILL, "CMD_0A_END_PATH_FO", Payload::None),
    op(type1::END_PATH_STROKE_FILL, "CMD_0B_END_PATH_SF", Payload::None),
    op(type1::NOP, "CMD_0C_NOP", Payload::None),
    op(type1::CLOSE_PATH, "CMD_0D_CLOSE_PATH", Payload::None),
    op(type1::FLAG1, "CMD_0E_UNKNOWN_FLAG1", Payload::Words(1)),
    op(type1::FLAG2, "CMD_0F_UNKNOWN_FLAG2", Payload::Words(1)),
    op(type1::STROKE_WIDTH, "CMD_10_STROKE_WIDTH", Payload::Words(1)),
    op(type1::END_FILE, "CMD_15_END_FILE", Payload::None),
];

pub static TYPE2_OPCODES: &[OpcodeInfo] = &[
    op(type2::END_FILE as u32, "END_FILE", Payload::Params),
    op(type2::MOVE_TO as u32, "MOVE_TO", Payload::StreamPoints),
    op(type2::POINTS_LINES as u32, "POINTS_LINES", Payload::StreamPoints),
    op(type2::POINTS_CUBICS as u32, "POINTS_CUBICS", Payload::StreamPoints),
    op(type2::STROKE_COLOR as u32, "STROKE_COLOR", Payload::Params),
    op(type2::FILL_COLOR as u32, "FILL_COLOR", Payload::Params),
    op(type2::END_PATH as u32, "END_PATH", Payload::Params),
    op(type2::STROKE_FLAG_A as u32, "STROKE_FLAG_A", Payload::Params),
    op(type2::STROKE_FLAG_B as u32, "STROKE_FLAG_B", Payload::Params),
    op(type2::STROKE_WIDTH as u32, "STROKE_WIDTH", Payload::Params),
];

fn lookup(table: &'static [OpcodeInfo], code: u32) -> Option<&'static OpcodeInfo> {
    table.iter().find(|info| info.code == code)
}

pub fn type1_opcode(code: u32) -> Option<&'static OpcodeInfo> {
    lookup(TYPE1_OPCODES, code)
}

pub fn type2_opcode(code: u16) -> Option<&'static OpcodeInfo> {
    lookup(TYPE2_OPCODES, u32::from(code))
}

/// `UNKNOWN 0x…`, zero-padded to the opcode width in hex digits.
pub fn unknown_name(code: u32, hex_digits: usize) -> String {
    format!("UNKNOWN 0x{code:0hex_digits$X}")
}

pub fn type1_name(code: u32) -> Cow<'static, str> {
    match type1_opcode(code) {
        Some(info) => Cow::Borrowed(info.name),
        None => Cow::Owned(unknown_name(code, 8)),
    }
}

pub fn type2_name(code: u16) -> Cow<'static, str> {
    match type2_opcode(code) {
        Some(info) => Cow::Borrowed(info.name),
        None => Cow::Owned(unknown_name(u32::from(code), 4)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_have_unique_codes() {
        for table in [TYPE1_OPCODES, TYPE2_OPCODES] {
            for (i, a) in table.iter().enumerate() {
                assert!(table[i + 1..].iter().all(|b| b.code != a.code), "{}", a.name);
            }
        }
    }

    #[test]
    fn unknown_opcodes_fall_back() {
        assert_eq!(type1_name(0x07), "CMD_07_LINE");
        assert_eq!(type1_name(0x15), "CMD_15_END_FILE");
        assert_eq!(type1_name(0x11), "UNKNOWN 0x00000011");
        assert_eq!(type2_name(0x0A), "STROKE_WIDTH");
        assert_eq!(type2_name(0x0B), "UNKNOWN 0x000B");
    }

    #[test]
    fn payload_shapes() {
        assert_eq!(
            type1_opcode(type1::START_LAYER).map(|i| i.payload),
            Some(Payload::PaddedString)
        );
        assert_eq!(
            type2_opcode(type2::POINTS_CUBICS).map(|i| i.payload),
            Some(Payload::StreamPoints)
        );
    }
}
