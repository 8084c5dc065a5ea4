//! paintdump - Dump the path and paint calls of PDF content streams
//!
//! Each input file holds one decoded content stream. Streams are interpreted
//! in parallel against a shared resource dictionary and the recorded canvas
//! calls are written as text or JSON. Indirect objects the resources refer
//! to are loaded with `-O N=FILE`.

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser};
use pagepaint_core::api::{InterpretOptions, StreamJob, interpret_streams};
use pagepaint_core::function::BasicFunctionEvaluator;
use pagepaint_core::interp::{CanvasCall, PathSegment, RecordingCanvas, parse_object};
use pagepaint_core::model::{MemoryObjectStore, PDFObject};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "paintdump")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Content stream files
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Resource dictionary in PDF syntax, e.g. `<< /ColorSpace << /CS0 [/CalGray << >>] >> >>`
    #[arg(short = 'r', long)]
    resources: Option<PathBuf>,

    /// Indirect object `N=FILE` that `N 0 R` in the resources refers to (repeatable)
    #[arg(short = 'O', long = "object", value_name = "N=FILE", value_parser = parse_object_arg)]
    objects: Vec<(u32, PathBuf)>,

    /// Write JSON instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    /// Worker threads (0 = one per core)
    #[arg(short = 'j', long, default_value = "0")]
    threads: usize,

    /// Disable color space caching
    #[arg(short = 'C', long = "disable-caching", action = ArgAction::SetTrue)]
    disable_caching: bool,

    /// Output file (- for stdout)
    #[arg(short = 'o', long, default_value = "-")]
    outfile: String,

    /// Enable debug logging
    #[arg(short = 'd', long, action = ArgAction::SetTrue)]
    debug: bool,
}

/// JSON shape of one canvas call.
#[derive(Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
enum CallRecord {
    SetCtm {
        matrix: [f64; 6],
    },
    Segment {
        op: &'static str,
        points: Vec<[f64; 2]>,
    },
    Fill {
        family: &'static str,
        components: Vec<f64>,
        even_odd: bool,
        segments: usize,
    },
    Stroke {
        family: &'static str,
        components: Vec<f64>,
        segments: usize,
    },
    Discard,
}

#[derive(Serialize)]
struct StreamRecord {
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    calls: Vec<CallRecord>,
}

fn segment_op(segment: &PathSegment) -> &'static str {
    match segment {
        PathSegment::MoveTo(..) => "m",
        PathSegment::LineTo(..) => "l",
        PathSegment::CurveTo(..) => "c",
        PathSegment::ClosePath => "h",
    }
}

impl From<&CanvasCall> for CallRecord {
    fn from(call: &CanvasCall) -> Self {
        match call {
            CanvasCall::SetCtm((a, b, c, d, e, f)) => CallRecord::SetCtm {
                matrix: [*a, *b, *c, *d, *e, *f],
            },
            CanvasCall::Segment(segment) => CallRecord::Segment {
                op: segment_op(segment),
                points: segment.points().map(|(x, y)| [x, y]).collect(),
            },
            CanvasCall::Fill {
                components,
                family,
                even_odd,
                path,
            } => CallRecord::Fill {
                family: family.name(),
                components: components.clone(),
                even_odd: *even_odd,
                segments: path.len(),
            },
            CanvasCall::Stroke {
                components,
                family,
                path,
            } => CallRecord::Stroke {
                family: family.name(),
                components: components.clone(),
                segments: path.len(),
            },
            CanvasCall::Discard => CallRecord::Discard,
        }
    }
}

fn write_text<W: Write>(out: &mut W, file: &str, result: &pagepaint_core::Result<RecordingCanvas>) -> Result<()> {
    writeln!(out, "# {file}")?;
    let canvas = match result {
        Ok(canvas) => canvas,
        Err(e) => {
            writeln!(out, "error: {e}")?;
            return Ok(());
        }
    };
    for call in canvas.calls() {
        match call {
            CanvasCall::SetCtm((a, b, c, d, e, f)) => {
                writeln!(out, "ctm [{a} {b} {c} {d} {e} {f}]")?;
            }
            CanvasCall::Segment(segment) => {
                let points: Vec<String> = segment.points().map(|(x, y)| format!("{x} {y}")).collect();
                writeln!(out, "  {} {}", segment_op(segment), points.join(" "))?;
            }
            CanvasCall::Fill {
                components,
                family,
                even_odd,
                ..
            } => {
                let rule = if *even_odd { "evenodd" } else { "nonzero" };
                writeln!(out, "fill {} {components:?} {rule}", family.name())?;
            }
            CanvasCall::Stroke {
                components, family, ..
            } => {
                writeln!(out, "stroke {} {components:?}", family.name())?;
            }
            CanvasCall::Discard => writeln!(out, "discard")?,
        }
    }
    Ok(())
}

fn load_resources(path: &Path) -> Result<HashMap<String, PDFObject>> {
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    match parse_object(&data).with_context(|| format!("parsing {}", path.display()))? {
        PDFObject::Dict(dict) => Ok(dict),
        other => bail!(
            "{}: resources must be a dictionary, found {}",
            path.display(),
            other.type_name()
        ),
    }
}

fn parse_object_arg(arg: &str) -> std::result::Result<(u32, PathBuf), String> {
    let (objid, path) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected N=FILE, got {arg:?}"))?;
    let objid = objid
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("bad object number {objid:?}: {e}"))?;
    if path.is_empty() {
        return Err(format!("missing file for object {objid}"));
    }
    Ok((objid, PathBuf::from(path)))
}

fn load_objects(objects: &[(u32, PathBuf)]) -> Result<MemoryObjectStore> {
    let mut store = MemoryObjectStore::new();
    for (objid, path) in objects {
        let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let obj = parse_object(&data).with_context(|| format!("parsing {}", path.display()))?;
        debug!(objid, file = %path.display(), "loaded indirect object");
        store.insert(*objid, obj);
    }
    Ok(store)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let resources = match &args.resources {
        Some(path) => load_resources(path)?,
        None => HashMap::new(),
    };

    let mut jobs = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let content = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        debug!(file = %path.display(), bytes = content.len(), "loaded content stream");
        jobs.push(StreamJob::new(content).with_resources(resources.clone()));
    }

    let mut options = InterpretOptions {
        threads: args.threads,
        ..InterpretOptions::default()
    };
    options.resolver.caching = !args.disable_caching;
    let store = Arc::new(load_objects(&args.objects)?);
    let resolver = options.build_resolver(
        store.clone(),
        Arc::new(BasicFunctionEvaluator::with_resolver(store)),
    );
    let results = interpret_streams(&jobs, &resolver, &options)?;

    let mut output: Box<dyn Write> = if args.outfile == "-" {
        Box::new(BufWriter::new(io::stdout()))
    } else {
        let file = File::create(&args.outfile)
            .with_context(|| format!("creating {}", args.outfile))?;
        Box::new(BufWriter::new(file))
    };

    let names: Vec<String> = args.files.iter().map(|p| p.display().to_string()).collect();
    for (name, result) in names.iter().zip(&results) {
        if let Err(e) = result {
            warn!(file = %name, error = %e, "stream stopped");
        }
    }

    if args.json {
        let records: Vec<StreamRecord> = names
            .iter()
            .zip(&results)
            .map(|(name, result)| StreamRecord {
                file: name.clone(),
                error: result.as_ref().err().map(ToString::to_string),
                calls: result
                    .as_ref()
                    .map(|canvas| canvas.calls().iter().map(CallRecord::from).collect())
                    .unwrap_or_default(),
            })
            .collect();
        serde_json::to_writer_pretty(&mut output, &records)?;
        writeln!(output)?;
    } else {
        for (name, result) in names.iter().zip(&results) {
            write_text(&mut output, name, result)?;
        }
    }

    output.flush()?;
    Ok(())
}
