//! Type 2: a command file of fixed 5-word records plus a separate points file.
//!
//! Command file layout:
//!
//! ```text
//! offset 0   7 x u16 header   z1, command_count, z2, x1, y1, x2, y2
//! offset 14  5 x u16 records  opcode, p1, p2, p3, p4
//! end - 10   footer record    END_FILE, points_file, 0, 0, 0
//! ```
//!
//! The points file starts with two 16-bit words (the second is the point count) followed by
//! 32-bit X/Y pairs stored as two big-endian halves, low half first.

use crate::commands::{self, OpcodeInfo, Payload, type2 as op};
use crate::error::{Error, Result};
use crate::fixed::Scale;
use crate::geom::{Color, Cubic, Point, ViewBounds};
use crate::reader::{RecordReader, WordLayout};
use serde::Serialize;
use std::borrow::Cow;
use std::io::{Read, Seek, SeekFrom};

pub const SCALE: Scale = Scale::TYPE2;

pub const HEADER_LEN: u64 = 14;
pub const FOOTER_LEN: i64 = 10;

/// Headers announcing this many commands or fewer are rejected.
pub const MIN_COMMAND_COUNT: u16 = 0x0A;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeOptions {
    /// Combine the STROKE_WIDTH halves as `(p2 << 16) | p1`.
    ///
    /// Off by default: files are decoded with `(p2 << 16) & p1`, which the known renderings
    /// were produced with and which always yields zero for 16-bit parameters.
    pub combine_stroke_width_halves: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Type2Header {
    pub z1: u16,
    pub command_count: u16,
    pub z2: u16,
    pub x1: u16,
    pub y1: u16,
    pub x2: u16,
    pub y2: u16,
}

impl Type2Header {
    pub fn from_words(words: [u16; 7]) -> Self {
        let [z1, command_count, z2, x1, y1, x2, y2] = words;
        Self {
            z1,
            command_count,
            z2,
            x1,
            y1,
            x2,
            y2,
        }
    }

    pub fn is_plausible(&self) -> bool {
        self.command_count > MIN_COMMAND_COUNT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Type2Footer {
    pub command: u16,
    pub points_file: u16,
    pub zero: [u16; 3],
}

impl Type2Footer {
    pub fn from_words(words: [u16; 5]) -> Self {
        let [command, points_file, z1, z2, z3] = words;
        Self {
            command,
            points_file,
            zero: [z1, z2, z3],
        }
    }

    pub fn is_valid(&self) -> bool {
        self.command == op::END_FILE && self.zero == [0, 0, 0]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PointsHeader {
    pub unknown: u16,
    pub point_count: u16,
}

/// Parameter of an END_PATH record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndPathKind {
    /// 0: the path is stroked.
    Stroke,
    /// 1: close the path; fill on, stroke off.
    CloseFill,
    /// 2: emit the path with the flags gathered so far.
    Finish,
    /// 3: fill off.
    NoFill,
    /// 4: start of an unpainted area.
    UnpaintedStart,
    /// 5: end of unpainted areas.
    UnpaintedEnd,
}

impl EndPathKind {
    pub fn from_param(value: u16) -> Result<Self> {
        Ok(match value {
            0 => EndPathKind::Stroke,
            1 => EndPathKind::CloseFill,
            2 => EndPathKind::Finish,
            3 => EndPathKind::NoFill,
            4 => EndPathKind::UnpaintedStart,
            5 => EndPathKind::UnpaintedEnd,
            value => return Err(Error::UnknownEndPathKind { value }),
        })
    }

    pub fn param(self) -> u16 {
        match self {
            EndPathKind::Stroke => 0,
            EndPathKind::CloseFill => 1,
            EndPathKind::Finish => 2,
            EndPathKind::NoFill => 3,
            EndPathKind::UnpaintedStart => 4,
            EndPathKind::UnpaintedEnd => 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Type2Command {
    EndFile { points_file: u16 },
    MoveTo(Point),
    Lines { points: Vec<Point> },
    Cubics { cubics: Vec<Cubic> },
    StrokeColor(Color),
    FillColor(Color),
    EndPath(EndPathKind),
    StrokeFlagA(u16),
    StrokeFlagB(u16),
    StrokeWidth(i32),
    Unknown { code: u16, params: [u16; 4] },
}

impl Type2Command {
    pub fn opcode(&self) -> u16 {
        match self {
            Type2Command::EndFile { .. } => op::END_FILE,
            Type2Command::MoveTo(_) => op::MOVE_TO,
            Type2Command::Lines { .. } => op::POINTS_LINES,
            Type2Command::Cubics { .. } => op::POINTS_CUBICS,
            Type2Command::StrokeColor(_) => op::STROKE_COLOR,
            Type2Command::FillColor(_) => op::FILL_COLOR,
            Type2Command::EndPath(_) => op::END_PATH,
            Type2Command::StrokeFlagA(_) => op::STROKE_FLAG_A,
            Type2Command::StrokeFlagB(_) => op::STROKE_FLAG_B,
            Type2Command::StrokeWidth(_) => op::STROKE_WIDTH,
            Type2Command::Unknown { code, .. } => *code,
        }
    }

    pub fn name(&self) -> Cow<'static, str> {
        commands::type2_name(self.opcode())
    }
}

pub fn stroke_width_from_words(p1: u16, p2: u16, options: DecodeOptions) -> i32 {
    let high = u32::from(p2) << 16;
    let low = u32::from(p1);
    let combined = if options.combine_stroke_width_halves {
        high | low
    } else {
        high & low
    };
    combined as i32
}

/// Validated command file, positioned at the first command record.
#[derive(Debug)]
pub struct CommandFile<R> {
    reader: RecordReader<R>,
    header: Type2Header,
    footer: Type2Footer,
}

impl<R: Read + Seek> CommandFile<R> {
    pub fn open(inner: R) -> Result<Self> {
        let mut reader = RecordReader::new(inner, WordLayout::SplitHalves);
        reader.seek(SeekFrom::Start(0))?;
        let header = Type2Header::from_words(reader.read_u16s::<7>("header")?);
        if !header.is_plausible() {
            return Err(Error::InvalidHeader);
        }

        reader.seek(SeekFrom::End(-FOOTER_LEN))?;
        let footer = Type2Footer::from_words(reader.read_u16s::<5>("footer")?);
        if !footer.is_valid() {
            return Err(Error::InvalidFooter);
        }

        reader.seek(SeekFrom::Start(HEADER_LEN))?;
        Ok(Self {
            reader,
            header,
            footer,
        })
    }
}

impl<R> CommandFile<R> {
    pub fn header(&self) -> &Type2Header {
        &self.header
    }

    pub fn footer(&self) -> &Type2Footer {
        &self.footer
    }
}

/// Point data reader. Every coordinate read widens the running view bounds, which start
/// at one unit square.
#[derive(Debug)]
pub struct PointsFile<R> {
    reader: RecordReader<R>,
    header: PointsHeader,
}

impl<R: Read> PointsFile<R> {
    pub fn open(inner: R) -> Result<Self> {
        let mut reader = RecordReader::new(inner, WordLayout::SplitHalves)
            .with_bounds(ViewBounds::unit(SCALE.factor()));
        let [unknown, point_count] = reader.read_u16s::<2>("pointsFile")?;
        Ok(Self {
            reader,
            header: PointsHeader {
                unknown,
                point_count,
            },
        })
    }
}

impl<R> PointsFile<R> {
    pub fn header(&self) -> &PointsHeader {
        &self.header
    }
}

/// Pulls [`Type2Command`]s from a command file, fetching point data as it goes.
///
/// Records are read while the running counter, starting at 1, is below the declared
/// command count. Every decoded record advances the counter, so a file whose END_FILE is
/// its last announced command finishes with `consumed() == header().command_count`.
#[derive(Debug)]
pub struct Type2Decoder<C, P> {
    commands: CommandFile<C>,
    points: PointsFile<P>,
    options: DecodeOptions,
    counter: u16,
    finished: bool,
}

impl<C: Read, P: Read> Type2Decoder<C, P> {
    pub fn new(commands: CommandFile<C>, points: PointsFile<P>, options: DecodeOptions) -> Self {
        Self {
            commands,
            points,
            options,
            counter: 1,
            finished: false,
        }
    }

    pub fn header(&self) -> &Type2Header {
        &self.commands.header
    }

    pub fn footer(&self) -> &Type2Footer {
        &self.commands.footer
    }

    pub fn points_header(&self) -> &PointsHeader {
        &self.points.header
    }

    /// Value of the record counter; see the type docs.
    pub fn consumed(&self) -> u16 {
        self.counter
    }

    /// `true` once the END_FILE record has been decoded.
    pub fn reached_end_file(&self) -> bool {
        self.finished
    }

    pub fn counts_match(&self) -> bool {
        self.counter == self.commands.header.command_count
    }

    /// Bounds of every point read so far, in raw units.
    pub fn bounds(&self) -> ViewBounds {
        self.points
            .reader
            .bounds()
            .unwrap_or(ViewBounds::unit(SCALE.factor()))
    }

    pub fn next_command(&mut self) -> Result<Option<Type2Command>> {
        if self.finished || self.counter >= self.commands.header.command_count {
            return Ok(None);
        }
        let [code, p1, p2, p3, p4] = self.commands.reader.read_u16s::<5>("command")?;

        let points = match commands::type2_opcode(code) {
            Some(info) if info.payload == Payload::StreamPoints => {
                self.read_stream_points(info, p1)?
            }
            _ => Vec::new(),
        };

        let command = match code {
            op::END_FILE => {
                self.finished = true;
                Type2Command::EndFile { points_file: p1 }
            }
            op::MOVE_TO => {
                let [point] = points[..] else {
                    return Err(Error::UnexpectedParameter {
                        opcode: "MOVE_TO",
                        expected: 1,
                        value: p1,
                    });
                };
                Type2Command::MoveTo(point)
            }
            op::POINTS_LINES => Type2Command::Lines { points },
            op::POINTS_CUBICS => Type2Command::Cubics {
                cubics: points.chunks_exact(3).filter_map(Cubic::from_points).collect(),
            },
            op::STROKE_COLOR => Type2Command::StrokeColor(Color::rgb(p1, p2, p3)),
            op::FILL_COLOR => Type2Command::FillColor(Color::rgb(p1, p2, p3)),
            op::END_PATH => Type2Command::EndPath(EndPathKind::from_param(p1)?),
            op::STROKE_FLAG_A => Type2Command::StrokeFlagA(p1),
            op::STROKE_FLAG_B => Type2Command::StrokeFlagB(p1),
            op::STROKE_WIDTH => {
                Type2Command::StrokeWidth(stroke_width_from_words(p1, p2, self.options))
            }
            code => {
                tracing::debug!(code, "unknown type 2 opcode");
                Type2Command::Unknown {
                    code,
                    params: [p1, p2, p3, p4],
                }
            }
        };

        self.counter = self.counter.wrapping_add(1);
        Ok(Some(command))
    }

    /// Pulls the `count` points a point-stream opcode announces.
    fn read_stream_points(&mut self, info: &OpcodeInfo, count: u16) -> Result<Vec<Point>> {
        if info.code == u32::from(op::MOVE_TO) && count != 1 {
            return Err(Error::UnexpectedParameter {
                opcode: info.name,
                expected: 1,
                value: count,
            });
        }
        if count == 0 {
            return Err(Error::EmptyPointList { what: info.name });
        }
        if info.code == u32::from(op::POINTS_CUBICS) && count % 3 != 0 {
            return Err(Error::CubicPointCount {
                count: u32::from(count),
            });
        }
        self.points.reader.read_points(u32::from(count), info.name)
    }

    /// `true` when the command file has bytes past the last record read.
    pub fn trailing_commands(&mut self) -> Result<bool> {
        Ok(!self.commands.reader.at_end()?)
    }

    /// `true` when the points file has unread point data.
    pub fn trailing_points(&mut self) -> Result<bool> {
        Ok(!self.points.reader.at_end()?)
    }
}

impl<C: Read, P: Read> Iterator for Type2Decoder<C, P> {
    type Item = Result<Type2Command>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_command().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn be16(words: &[u16]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_be_bytes()).collect()
    }

    fn command_file(count: u16, records: &[[u16; 5]], points_file: u16) -> Vec<u8> {
        let mut out = be16(&[0, count, 0, 0, 0, 0, 0]);
        for r in records {
            out.extend(be16(r));
        }
        out.extend(be16(&[op::END_FILE, points_file, 0, 0, 0]));
        out
    }

    fn points_file(points: &[(i32, i32)]) -> Vec<u8> {
        let mut out = be16(&[0, points.len() as u16]);
        for &(x, y) in points {
            for v in [x as u32, y as u32] {
                out.extend(be16(&[v as u16, (v >> 16) as u16]));
            }
        }
        out
    }

    fn decoder(
        cmds: Vec<u8>,
        pts: Vec<u8>,
        options: DecodeOptions,
    ) -> Type2Decoder<Cursor<Vec<u8>>, Cursor<Vec<u8>>> {
        let commands = CommandFile::open(Cursor::new(cmds)).unwrap();
        let points = PointsFile::open(Cursor::new(pts)).unwrap();
        Type2Decoder::new(commands, points, options)
    }

    fn filler(n: usize) -> Vec<[u16; 5]> {
        vec![[op::STROKE_FLAG_A, 0, 0, 0, 0]; n]
    }

    #[test]
    fn rejects_small_command_count() {
        let bytes = command_file(0x0A, &filler(9), 1);
        assert!(matches!(
            CommandFile::open(Cursor::new(bytes)).unwrap_err(),
            Error::InvalidHeader
        ));
    }

    #[test]
    fn rejects_bad_footer() {
        let mut bytes = command_file(0x20, &filler(3), 1);
        let n = bytes.len();
        bytes[n - 1] = 1;
        assert!(matches!(
            CommandFile::open(Cursor::new(bytes)).unwrap_err(),
            Error::InvalidFooter
        ));
    }

    #[test]
    fn footer_names_points_file() {
        let file = CommandFile::open(Cursor::new(command_file(0x20, &filler(3), 52))).unwrap();
        assert_eq!(file.footer().points_file, 52);
        assert_eq!(file.header().command_count, 0x20);
    }

    #[test]
    fn well_formed_file_consumes_declared_count() {
        let mut records = vec![[op::MOVE_TO, 1, 0, 0, 0], [op::POINTS_LINES, 2, 0, 0, 0]];
        records.extend(filler(9));
        let count = records.len() as u16 + 2;
        let mut d = decoder(
            command_file(count, &records, 1),
            points_file(&[(0, 0), (0x10000, 0), (0x28000, -0x8000)]),
            DecodeOptions::default(),
        );
        let cmds: Vec<_> = d.by_ref().collect::<Result<_>>().unwrap();
        assert_eq!(cmds.len(), records.len() + 1);
        assert_eq!(cmds[0], Type2Command::MoveTo(Point::new(0, 0)));
        assert_eq!(cmds.last(), Some(&Type2Command::EndFile { points_file: 1 }));
        assert!(d.counts_match());
        assert_eq!(d.bounds(), ViewBounds::new(0, -0x8000, 0x28000, 0x10000));
        assert!(!d.trailing_commands().unwrap());
        assert!(!d.trailing_points().unwrap());
    }

    #[test]
    fn early_end_file_leaves_counter_short() {
        let records = filler(10);
        let mut d = decoder(
            command_file(0x20, &records, 1),
            points_file(&[]),
            DecodeOptions::default(),
        );
        let cmds: Vec<_> = d.by_ref().collect::<Result<_>>().unwrap();
        assert_eq!(cmds.len(), 11);
        assert_eq!(d.consumed(), 12);
        assert!(!d.counts_match());
    }

    #[test]
    fn move_to_requires_single_point() {
        let mut records = vec![[op::MOVE_TO, 2, 0, 0, 0]];
        records.extend(filler(10));
        let mut d = decoder(
            command_file(0x20, &records, 1),
            points_file(&[(0, 0), (1, 1)]),
            DecodeOptions::default(),
        );
        assert!(matches!(
            d.next_command().unwrap_err(),
            Error::UnexpectedParameter { value: 2, .. }
        ));
    }

    #[test]
    fn point_list_arity() {
        for (record, zero) in [
            ([op::POINTS_LINES, 0, 0, 0, 0], true),
            ([op::POINTS_CUBICS, 0, 0, 0, 0], true),
            ([op::POINTS_CUBICS, 4, 0, 0, 0], false),
        ] {
            let mut records = vec![record];
            records.extend(filler(10));
            let mut d = decoder(
                command_file(0x20, &records, 1),
                points_file(&[(0, 0); 4]),
                DecodeOptions::default(),
            );
            let err = d.next_command().unwrap_err();
            if zero {
                assert!(matches!(err, Error::EmptyPointList { .. }));
            } else {
                assert!(matches!(err, Error::CubicPointCount { count: 4 }));
            }
        }
    }

    #[test]
    fn end_path_parameters() {
        for v in 0..=5 {
            assert_eq!(EndPathKind::from_param(v).unwrap().param(), v);
        }
        assert!(matches!(
            EndPathKind::from_param(6).unwrap_err(),
            Error::UnknownEndPathKind { value: 6 }
        ));
    }

    #[test]
    fn stroke_width_halves() {
        let observed = DecodeOptions::default();
        let combined = DecodeOptions {
            combine_stroke_width_halves: true,
        };
        assert_eq!(stroke_width_from_words(0x8000, 0x0001, observed), 0);
        assert_eq!(stroke_width_from_words(0x8000, 0x0001, combined), 0x18000);
        assert_eq!(stroke_width_from_words(0, 0x0002, combined), 0x20000);
    }

    #[test]
    fn unknown_record_keeps_parameters() {
        let mut records = vec![[0x0B, 1, 2, 3, 4], [op::FILL_COLOR, 10, 20, 30, 0]];
        records.extend(filler(9));
        let mut d = decoder(
            command_file(0x20, &records, 1),
            points_file(&[]),
            DecodeOptions::default(),
        );
        let first = d.next_command().unwrap().unwrap();
        assert_eq!(
            first,
            Type2Command::Unknown {
                code: 0x0B,
                params: [1, 2, 3, 4]
            }
        );
        assert_eq!(first.name(), "UNKNOWN 0x000B");
        assert_eq!(
            d.next_command().unwrap(),
            Some(Type2Command::FillColor(Color::rgb(10, 20, 30)))
        );
    }

    #[test]
    fn truncated_points_are_an_error() {
        let mut records = vec![[op::POINTS_LINES, 3, 0, 0, 0]];
        records.extend(filler(10));
        let mut d = decoder(
            command_file(0x20, &records, 1),
            points_file(&[(0, 0)]),
            DecodeOptions::default(),
        );
        assert!(matches!(
            d.next_command().unwrap_err(),
            Error::Truncated {
                what: "POINTS_LINES"
            }
        ));
    }
}
