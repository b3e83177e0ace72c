//! Composite documents from assembly files.
//!
//! Assembly is two passes. [`collect_layers`] walks the include tree and gathers the layer
//! references in ascending layer order. [`write_composite`] then copies the body of each
//! already-converted `NNNNN.svg` into its own `<g>` and widens the composite viewBox to
//! cover every fragment.

use crate::svg::viewbox::parse_header_viewbox;
use crate::svg::{SVG_FOOTER, StateProfile, SvgEmitter};
use crate::{Error, Result};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Seek, Write};
use std::path::{Path, PathBuf};
use ubvff_core::assembly::{
    AssemblyFile, LayerRef, MAX_DEPTH, MAX_LAYERS, SkipReason, read_assembly,
};
use ubvff_core::names;
use ubvff_core::{Scale, ViewBounds};

/// Bytes of a fragment searched for its viewBox and the end of its opening tag.
pub const FRAGMENT_HEAD_LEN: usize = 150;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssemblyPlan {
    /// The top-level file includes a single layer directly; nothing is written.
    Shallow,
    /// Layers to embed, sorted by layer number.
    Layers(Vec<LayerRef>),
}

struct Collector<'a> {
    prefix: &'a str,
    layers: Vec<LayerRef>,
}

impl Collector<'_> {
    fn visit(&mut self, path: &str, depth: usize) -> Result<Option<SkipReason>> {
        if depth == MAX_DEPTH {
            tracing::warn!(path, "max depth reached, not going deeper");
            return Ok(None);
        }
        let file = File::open(path).map_err(|source| Error::Open {
            path: PathBuf::from(path),
            source,
        })?;
        let (_, parsed) = read_assembly(BufReader::new(file), depth)?;

        match parsed {
            AssemblyFile::Skip(SkipReason::Shallow) => return Ok(Some(SkipReason::Shallow)),
            AssemblyFile::Skip(reason) => {
                return Err(Error::Rejected {
                    path: PathBuf::from(path),
                    reason,
                });
            }
            AssemblyFile::Leaf(layer) => {
                tracing::info!(depth, "load layer {} from {:05}.svg", layer.layer, layer.file);
                self.layers.push(layer);
                if self.layers.len() >= MAX_LAYERS {
                    return Err(Error::TooManyLayers { max: MAX_LAYERS });
                }
            }
            AssemblyFile::Group(group) => {
                for number in group.includes {
                    let next = names::numbered_name(self.prefix, number, "bin");
                    tracing::info!(depth, "include {next}");
                    self.visit(&next, depth + 1)?;
                }
                if group.truncated {
                    tracing::warn!(path, "read failed (include parameter)");
                }
                tracing::debug!(depth, path, "end file");
            }
        }
        Ok(None)
    }
}

/// Walks the include tree rooted at `assembly_file`.
///
/// Includes are resolved as `<prefix>NNNNN.bin`, where `prefix` is whatever precedes a
/// trailing `NNNNN.bin` in `assembly_file` (empty otherwise).
pub fn collect_layers(assembly_file: &str) -> Result<AssemblyPlan> {
    let prefix = names::numbered_prefix(assembly_file).unwrap_or("");
    let mut collector = Collector {
        prefix,
        layers: Vec::new(),
    };
    if let Some(SkipReason::Shallow) = collector.visit(assembly_file, 0)? {
        tracing::info!("{}", SkipReason::Shallow);
        return Ok(AssemblyPlan::Shallow);
    }
    let mut layers = collector.layers;
    layers.sort_by_key(|l| l.layer);
    Ok(AssemblyPlan::Layers(layers))
}

/// The reusable part of a converted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment<'a> {
    pub view_box: ViewBounds,
    /// Everything between the opening `<svg>` line and the footer.
    pub body: &'a [u8],
}

impl<'a> Fragment<'a> {
    pub fn parse(bytes: &'a [u8]) -> std::result::Result<Self, &'static str> {
        let head = &bytes[..bytes.len().min(FRAGMENT_HEAD_LEN)];
        let view_box = parse_header_viewbox(head).ok_or("unable to read viewBox")?;
        let newline = head
            .iter()
            .position(|&b| b == b'\n')
            .ok_or("no end of header line")?;
        let start = newline + 1;
        let end = bytes
            .len()
            .checked_sub(SVG_FOOTER.len())
            .filter(|&end| end >= start)
            .ok_or("shorter than its header and footer")?;
        Ok(Self {
            view_box,
            body: &bytes[start..end],
        })
    }
}

/// Writes the composite document for `layers` to `out`.
///
/// Fragments are read from `<prefix>NNNNN.svg`; a missing fragment is skipped with a
/// warning.
pub fn write_composite<W: Write + Seek>(layers: &[LayerRef], prefix: &str, out: W) -> Result<W> {
    let mut emitter = SvgEmitter::new(out, StateProfile::COMPOSITE, Scale::new(1));
    emitter.header_deferred()?;
    let mut bounds = ViewBounds::unit(1);

    for layer in layers {
        let path = names::numbered_name(prefix, layer.file, "svg");
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(path = %path, %err, "unable to open layer input file");
                continue;
            }
        };
        let fragment = Fragment::parse(&bytes).map_err(|message| Error::FragmentHeader {
            path: PathBuf::from(&path),
            message,
        })?;
        bounds.fold(&fragment.view_box);

        emitter.start_layer()?;
        emitter.embed(fragment.body)?;
        emitter.end_layer()?;
    }

    emitter.patch_viewbox(&bounds)?;
    emitter.footer()?;
    emitter.finish()
}

/// Collects the layers of `assembly_file` and, unless the tree is shallow, writes the
/// composite to `output`. The output file is only created once collection succeeded.
pub fn assemble_file(assembly_file: &str, output: &Path) -> Result<AssemblyPlan> {
    let plan = collect_layers(assembly_file)?;
    if let AssemblyPlan::Layers(layers) = &plan {
        let prefix = names::numbered_prefix(assembly_file).unwrap_or("");
        tracing::info!(output = %output.display(), "writing composite");
        let file = File::create(output).map_err(|source| Error::Open {
            path: output.to_path_buf(),
            source,
        })?;
        let mut out = write_composite(layers, prefix, BufWriter::new(file))?;
        out.flush()?;
    }
    Ok(plan)
}
