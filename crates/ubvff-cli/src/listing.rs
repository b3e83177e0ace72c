//! Human-readable listing of decoded commands.

use std::io::{self, Write};
use ubvff_core::names::escape_display;
use ubvff_core::type1::{self, Type1Command};
use ubvff_core::type2::{self, Type2Command};
use ubvff_core::{Cubic, Point, Scale};

/// Points shown for a LINE record before the listing is cut short.
const LINE_PREVIEW: usize = 3;
/// Cubics shown for a CUBIC record before the listing is cut short.
const CUBIC_PREVIEW: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Detail {
    /// Unknown opcodes and summaries only.
    Less,
    #[default]
    Normal,
    /// Every point of every record.
    More,
}

fn name_column(name: &str) -> String {
    format!("{name:<24}")
}

fn point(scale: Scale, p: &Point) -> String {
    format!("{}{}", scale.format_column(p.x), scale.format_column(p.y))
}

fn write_points(
    out: &mut impl Write,
    scale: Scale,
    points: &[Point],
    preview: usize,
    detail: Detail,
) -> io::Result<()> {
    let shown = if detail == Detail::More {
        points.len()
    } else {
        points.len().min(preview)
    };
    for p in &points[..shown] {
        writeln!(out, "{:24}{}", "", point(scale, p))?;
    }
    if shown < points.len() {
        writeln!(out, "{:24}...", "")?;
    }
    Ok(())
}

fn write_cubics(
    out: &mut impl Write,
    scale: Scale,
    cubics: &[Cubic],
    detail: Detail,
) -> io::Result<()> {
    let shown = if detail == Detail::More {
        cubics.len()
    } else {
        cubics.len().min(CUBIC_PREVIEW)
    };
    for c in &cubics[..shown] {
        let [a, b, e] = &c.points;
        writeln!(
            out,
            "{:24}{}{}{}",
            "",
            point(scale, a),
            point(scale, b),
            point(scale, e)
        )?;
    }
    if shown < cubics.len() {
        writeln!(out, "{:24}...", "")?;
    }
    Ok(())
}

pub fn write_type1(out: &mut impl Write, command: &Type1Command, detail: Detail) -> io::Result<()> {
    let unknown = matches!(command, Type1Command::Unknown { .. });
    if detail == Detail::Less && !unknown {
        return Ok(());
    }
    let scale = type1::SCALE;
    let name = name_column(&command.name());
    match command {
        Type1Command::StartLayer { name: layer } => {
            writeln!(out, "{name}\"{}\"", escape_display(layer))
        }
        Type1Command::StartFile(h) => writeln!(
            out,
            "{name}{}{}{}{}0x{:08X}",
            scale.format_column(h.x1),
            scale.format_column(h.y1),
            scale.format_column(h.x2),
            scale.format_column(h.y2),
            h.unknown
        ),
        Type1Command::StrokeColor(c) | Type1Command::FillColor(c) => {
            writeln!(out, "{name}{}", c.css())
        }
        Type1Command::StartPath(p) => writeln!(out, "{name}{}", point(scale, p)),
        Type1Command::Line { points } => {
            writeln!(out, "{name}({} points)", points.len())?;
            write_points(out, scale, points, LINE_PREVIEW, detail)
        }
        Type1Command::Cubic { cubics } => {
            writeln!(out, "{name}({} points)", cubics.len() * 3)?;
            write_cubics(out, scale, cubics, detail)
        }
        Type1Command::Flag1(v) | Type1Command::Flag2(v) => writeln!(out, "{name}0x{v:08X}"),
        Type1Command::StrokeWidth(w) => writeln!(out, "{name}{}", scale.format_column(*w)),
        _ => writeln!(out, "{}", name.trim_end()),
    }
}

pub fn write_type2(out: &mut impl Write, command: &Type2Command, detail: Detail) -> io::Result<()> {
    let unknown = matches!(command, Type2Command::Unknown { .. });
    if detail == Detail::Less && !unknown {
        return Ok(());
    }
    let scale = type2::SCALE;
    let name = name_column(&command.name());
    match command {
        Type2Command::EndFile { points_file } => writeln!(out, "{name}{points_file:05}"),
        Type2Command::MoveTo(p) => writeln!(out, "{name}{}", point(scale, p)),
        Type2Command::Lines { points } => {
            writeln!(out, "{name}({} points)", points.len())?;
            write_points(out, scale, points, LINE_PREVIEW, detail)
        }
        Type2Command::Cubics { cubics } => {
            writeln!(out, "{name}({} points)", cubics.len() * 3)?;
            write_cubics(out, scale, cubics, detail)
        }
        Type2Command::StrokeColor(c) | Type2Command::FillColor(c) => {
            writeln!(out, "{name}{}", c.css())
        }
        Type2Command::EndPath(kind) => writeln!(out, "{name}{}", kind.param()),
        Type2Command::StrokeFlagA(v) | Type2Command::StrokeFlagB(v) => {
            writeln!(out, "{name}{v}")
        }
        Type2Command::StrokeWidth(w) => writeln!(out, "{name}{}", scale.format_column(*w)),
        Type2Command::Unknown { params, .. } => {
            let [p1, p2, p3, p4] = params;
            writeln!(out, "{name}0x{p1:04X} 0x{p2:04X} 0x{p3:04X} 0x{p4:04X}")
        }
    }
}
