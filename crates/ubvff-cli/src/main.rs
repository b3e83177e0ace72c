mod listing;

use listing::Detail;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use ubvff_core::assembly::SkipReason;
use ubvff_core::names::{self, MAX_ASSEMBLY_NAME, MAX_INPUT_NAME};
use ubvff_core::type1::Type1Command;
use ubvff_core::type2::{
    CommandFile, PointsFile, PointsHeader, Type2Command, Type2Footer, Type2Header,
};
use ubvff_core::{DecodeOptions, Type1Decoder, Type2Decoder, ViewBounds};
use ubvff_render::assemble::{AssemblyPlan, assemble_file};
use ubvff_render::type1::{Type1Converter, run_type1};
use ubvff_render::type2::{Type2Converter, run_type2};

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Decode(ubvff_core::Error),
    Render(ubvff_render::Error),
    Json(serde_json::Error),
    CountMismatch { consumed: u16, declared: u16 },
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Decode(err) => write!(f, "{err}"),
            CliError::Render(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::CountMismatch { consumed, declared } => write!(
                f,
                "command counter got to {consumed} of {declared} announced commands"
            ),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ubvff_core::Error> for CliError {
    fn from(value: ubvff_core::Error) -> Self {
        Self::Decode(value)
    }
}

impl From<ubvff_render::Error> for CliError {
    fn from(value: ubvff_render::Error) -> Self {
        Self::Render(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Type1,
    Type2,
    Assemble,
}

#[derive(Debug, Default)]
struct Args {
    command: Option<Command>,
    inputs: Vec<String>,
    svg: Option<String>,
    out: Option<String>,
    detail: Detail,
    json: bool,
    pretty: bool,
    combine_stroke_width: bool,
}

fn usage() -> &'static str {
    "ubvff\n\
\n\
USAGE:\n\
  ubvff type1 [--svg <path>|auto] [--more] [--less] [--json] [--pretty] <file>\n\
  ubvff type2 [--svg <path>|auto] [--more] [--less] [--json] [--pretty] [--combine-stroke-width] <commands> [<points>|auto]\n\
  ubvff assemble [--out <path>|auto] [--less] <assembly-file>\n\
\n\
NOTES:\n\
  - type1/type2 list the decoded commands on stdout; --svg also converts the drawing.\n\
  - 'auto' derives the SVG name from the input by replacing a short extension with .svg.\n\
  - The type2 points file defaults to the number stored in the command file footer.\n\
  - assemble writes next to the assembly file (NNNNN.bin -> NNNNN.svg) unless --out is given.\n\
  - Set RUST_LOG (e.g. RUST_LOG=debug) for decoder diagnostics on stderr.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "type1" if args.command.is_none() => args.command = Some(Command::Type1),
            "type2" if args.command.is_none() => args.command = Some(Command::Type2),
            "assemble" if args.command.is_none() => args.command = Some(Command::Assemble),
            "--more" => args.detail = Detail::More,
            "--less" => args.detail = Detail::Less,
            "--json" => args.json = true,
            "--pretty" => {
                args.json = true;
                args.pretty = true;
            }
            "--combine-stroke-width" => args.combine_stroke_width = true,
            "--svg" => {
                let Some(svg) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.svg = Some(svg.clone());
            }
            "--out" => {
                let Some(out) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(out.clone());
            }
            "--" => {
                args.inputs.extend(it.by_ref().cloned());
            }
            other if other.starts_with('-') => return Err(CliError::Usage(usage())),
            path => args.inputs.push(path.to_string()),
        }
    }

    let Some(command) = args.command else {
        return Err(CliError::Usage(usage()));
    };
    let inputs_ok = match command {
        Command::Type1 | Command::Assemble => args.inputs.len() == 1,
        Command::Type2 => matches!(args.inputs.len(), 1 | 2),
    };
    let flags_ok = match command {
        Command::Type1 => args.out.is_none() && !args.combine_stroke_width,
        Command::Type2 => args.out.is_none(),
        Command::Assemble => args.svg.is_none() && !args.combine_stroke_width && !args.json,
    };
    if !inputs_ok || !flags_ok {
        return Err(CliError::Usage(usage()));
    }

    Ok(args)
}

fn open(path: &str) -> Result<File, CliError> {
    File::open(path).map_err(|source| {
        CliError::Render(ubvff_render::Error::Open {
            path: PathBuf::from(path),
            source,
        })
    })
}

fn create(path: &str) -> Result<BufWriter<File>, CliError> {
    let file = File::create(path).map_err(|source| {
        CliError::Render(ubvff_render::Error::Open {
            path: PathBuf::from(path),
            source,
        })
    })?;
    Ok(BufWriter::new(file))
}

/// Resolves `--svg`: `auto` derives the name from `input`.
fn svg_name(input: &str, svg: Option<&str>) -> Result<Option<String>, CliError> {
    let Some(svg) = svg else {
        return Ok(None);
    };
    let name = if names::is_auto(svg) {
        names::auto_svg_name(input)
    } else {
        svg.to_string()
    };
    names::check_len("svg file", &name, MAX_INPUT_NAME)?;
    Ok(Some(name))
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if pretty {
        serde_json::to_writer_pretty(&mut out, value)?;
    } else {
        serde_json::to_writer(&mut out, value)?;
    }
    writeln!(out)?;
    Ok(())
}

#[derive(Serialize)]
struct Type1Dump<'a> {
    file: &'a str,
    svg: Option<&'a str>,
    commands: Vec<Type1Command>,
    reached_end_file: bool,
    trailing_data: bool,
}

#[derive(Serialize)]
struct Type2Dump<'a> {
    command_file: &'a str,
    points_file: &'a str,
    svg: Option<&'a str>,
    header: Type2Header,
    footer: Type2Footer,
    points_header: PointsHeader,
    commands: Vec<Type2Command>,
    declared: u16,
    consumed: u16,
    reached_end_file: bool,
    trailing_commands: bool,
    trailing_points: bool,
    bounds: ViewBounds,
}

fn run_type1_command(args: &Args) -> Result<(), CliError> {
    let input = args.inputs[0].as_str();
    names::check_len("input file", input, MAX_INPUT_NAME)?;
    let svg = svg_name(input, args.svg.as_deref())?;

    let mut decoder = Type1Decoder::new(BufReader::new(open(input)?));
    let stdout = io::stdout();
    let mut listing_out = stdout.lock();
    let mut listed = Ok(());
    let mut commands = Vec::new();
    let observe = |command: &Type1Command| {
        if args.json {
            commands.push(command.clone());
        } else if listed.is_ok() {
            listed = listing::write_type1(&mut listing_out, command, args.detail);
        }
    };

    let report = match svg.as_deref() {
        Some(path) => {
            let mut converter = Type1Converter::new(create(path)?);
            let report = run_type1(&mut decoder, Some(&mut converter), observe)?;
            converter.finish()?.flush()?;
            report
        }
        None => run_type1::<_, BufWriter<File>>(&mut decoder, None, observe)?,
    };
    listed?;
    drop(listing_out);

    if !report.reached_end_file {
        tracing::warn!("no END_FILE marker");
    }
    if args.json {
        print_json(
            &Type1Dump {
                file: input,
                svg: svg.as_deref(),
                commands,
                reached_end_file: report.reached_end_file,
                trailing_data: report.trailing_data,
            },
            args.pretty,
        )?;
    }
    Ok(())
}

fn run_type2_command(args: &Args) -> Result<(), CliError> {
    let command_name = args.inputs[0].as_str();
    names::check_len("command file", command_name, MAX_INPUT_NAME)?;
    let svg = svg_name(command_name, args.svg.as_deref())?;

    let command_file = CommandFile::open(BufReader::new(open(command_name)?))?;
    let points_name = match args.inputs.get(1) {
        Some(name) if !names::is_auto(name) => name.clone(),
        _ => names::auto_points_name(command_name, command_file.footer().points_file),
    };
    names::check_len("points file", &points_name, MAX_INPUT_NAME)?;
    let points_file = PointsFile::open(BufReader::new(open(&points_name)?))?;

    let options = DecodeOptions {
        combine_stroke_width_halves: args.combine_stroke_width,
    };
    let mut decoder = Type2Decoder::new(command_file, points_file, options);

    let stdout = io::stdout();
    let mut listing_out = stdout.lock();
    if !args.json {
        writeln!(
            listing_out,
            "command file ({:5} commands) : {command_name}",
            decoder.header().command_count
        )?;
        writeln!(
            listing_out,
            "points file  ({:5} points  ) : {points_name}",
            decoder.points_header().point_count
        )?;
    }

    let mut listed = Ok(());
    let mut commands = Vec::new();
    let observe = |command: &Type2Command| {
        if args.json {
            commands.push(command.clone());
        } else if listed.is_ok() {
            listed = listing::write_type2(&mut listing_out, command, args.detail);
        }
    };

    let report = match svg.as_deref() {
        Some(path) => {
            let mut converter = Type2Converter::new(create(path)?)?;
            let report = run_type2(&mut decoder, Some(&mut converter), observe)?;
            converter.finish()?.flush()?;
            report
        }
        None => run_type2::<_, _, BufWriter<File>>(&mut decoder, None, observe)?,
    };
    listed?;
    drop(listing_out);

    if args.json {
        print_json(
            &Type2Dump {
                command_file: command_name,
                points_file: &points_name,
                svg: svg.as_deref(),
                header: *decoder.header(),
                footer: *decoder.footer(),
                points_header: *decoder.points_header(),
                commands,
                declared: report.declared,
                consumed: report.consumed,
                reached_end_file: report.reached_end_file,
                trailing_commands: report.trailing_commands,
                trailing_points: report.trailing_points,
                bounds: report.bounds,
            },
            args.pretty,
        )?;
    }

    if !report.counts_match() {
        return Err(CliError::CountMismatch {
            consumed: report.consumed,
            declared: report.declared,
        });
    }
    Ok(())
}

fn run_assemble_command(args: &Args) -> Result<(), CliError> {
    let input = args.inputs[0].as_str();
    names::check_len("assembly file", input, MAX_ASSEMBLY_NAME)?;
    let output = match args.out.as_deref() {
        Some(out) if !names::is_auto(out) => out.to_string(),
        _ => names::auto_assembly_output(input)?,
    };
    names::check_len("svg file", &output, MAX_ASSEMBLY_NAME)?;

    let plan = assemble_file(input, Path::new(&output))?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match plan {
        AssemblyPlan::Shallow => writeln!(out, "{}", SkipReason::Shallow)?,
        AssemblyPlan::Layers(layers) => {
            if args.detail != Detail::Less {
                for layer in &layers {
                    writeln!(out, "layer {:5} : {:05}.svg", layer.layer, layer.file)?;
                }
            }
            writeln!(out, "{} layers -> {output}", layers.len())?;
        }
    }
    Ok(())
}

fn run(args: Args) -> Result<(), CliError> {
    match args.command {
        Some(Command::Type1) => run_type1_command(&args),
        Some(Command::Type2) => run_type2_command(&args),
        Some(Command::Assemble) => run_assemble_command(&args),
        None => Err(CliError::Usage(usage())),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    init_tracing();

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
