//! High-level API for interpreting content streams.
//!
//! # Example
//!
//! ```ignore
//! use pagepaint_core::api::{InterpretOptions, StreamJob, interpret_streams};
//!
//! let options = InterpretOptions::default();
//! let resolver = options.build_resolver(objects, functions);
//! let jobs = vec![StreamJob::new(b"0 0 10 10 re f".to_vec())];
//! let canvases = interpret_streams(&jobs, &resolver, &options)?;
//! ```

use crate::error::{PdfError, Result};
use crate::function::FunctionEvaluator;
use crate::interp::device::RecordingCanvas;
use crate::interp::interpreter::PDFPageInterpreter;
use crate::model::color::{ColorSpaceResolver, ResolverOptions};
use crate::model::objects::{ObjectResolver, PDFObject};
use crate::utils::{MATRIX_IDENTITY, Matrix};
use bytes::Bytes;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tracing::debug;

pub(crate) fn default_thread_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Options for stream interpretation.
#[derive(Debug, Clone)]
pub struct InterpretOptions {
    /// Worker threads for [`interpret_streams`]. 0 means one per core.
    pub threads: usize,

    /// CTM each stream starts with.
    pub initial_ctm: Matrix,

    /// Options for resolvers built with [`InterpretOptions::build_resolver`].
    pub resolver: ResolverOptions,
}

impl Default for InterpretOptions {
    fn default() -> Self {
        Self {
            threads: 0,
            initial_ctm: MATRIX_IDENTITY,
            resolver: ResolverOptions::default(),
        }
    }
}

impl InterpretOptions {
    /// Resolver configured with these options.
    pub fn build_resolver(
        &self,
        objects: Arc<dyn ObjectResolver>,
        functions: Arc<dyn FunctionEvaluator>,
    ) -> ColorSpaceResolver {
        ColorSpaceResolver::with_options(objects, functions, self.resolver.clone())
    }

    fn thread_count(&self) -> usize {
        if self.threads == 0 {
            default_thread_count()
        } else {
            self.threads
        }
    }
}

/// One content stream with the resources it draws against.
#[derive(Debug, Clone, Default)]
pub struct StreamJob {
    pub content: Bytes,
    pub resources: HashMap<String, PDFObject>,
}

impl StreamJob {
    pub fn new(content: impl Into<Bytes>) -> Self {
        Self {
            content: content.into(),
            resources: HashMap::new(),
        }
    }

    pub fn with_resources(mut self, resources: HashMap<String, PDFObject>) -> Self {
        self.resources = resources;
        self
    }
}

/// Interpret a single stream onto a fresh [`RecordingCanvas`].
pub fn interpret_stream(
    job: &StreamJob,
    resolver: &ColorSpaceResolver,
    options: &InterpretOptions,
) -> Result<RecordingCanvas> {
    interpret_stream_inner(job, resolver, options, None)
}

fn interpret_stream_inner(
    job: &StreamJob,
    resolver: &ColorSpaceResolver,
    options: &InterpretOptions,
    cancel: Option<&AtomicBool>,
) -> Result<RecordingCanvas> {
    let mut canvas = RecordingCanvas::new();
    let mut interp = PDFPageInterpreter::new(resolver, &mut canvas);
    interp.init_state(options.initial_ctm);
    interp.init_resources(job.resources.clone());
    match cancel {
        Some(flag) => interp.execute_with_cancel(&job.content, flag)?,
        None => interp.execute(&job.content)?,
    }
    Ok(canvas)
}

/// Interpret independent streams in parallel.
///
/// Each stream gets its own interpreter, graphics state and canvas; the
/// resolver (and its cache) is shared. Results are in input order.
pub fn interpret_streams(
    jobs: &[StreamJob],
    resolver: &ColorSpaceResolver,
    options: &InterpretOptions,
) -> Result<Vec<Result<RecordingCanvas>>> {
    interpret_streams_inner(jobs, resolver, options, None)
}

/// [`interpret_streams`] that stops every stream once `cancel` is set.
pub fn interpret_streams_with_cancel(
    jobs: &[StreamJob],
    resolver: &ColorSpaceResolver,
    options: &InterpretOptions,
    cancel: &AtomicBool,
) -> Result<Vec<Result<RecordingCanvas>>> {
    interpret_streams_inner(jobs, resolver, options, Some(cancel))
}

fn interpret_streams_inner(
    jobs: &[StreamJob],
    resolver: &ColorSpaceResolver,
    options: &InterpretOptions,
    cancel: Option<&AtomicBool>,
) -> Result<Vec<Result<RecordingCanvas>>> {
    let thread_count = options.thread_count();
    let pool = ThreadPoolBuilder::new()
        .num_threads(thread_count)
        .build()
        .map_err(|e| PdfError::ThreadPoolError(e.to_string()))?;
    debug!(streams = jobs.len(), threads = thread_count, "interpreting streams");

    let mut results: Vec<(usize, Result<RecordingCanvas>)> = pool.install(|| {
        jobs.par_iter()
            .enumerate()
            .map(|(idx, job)| (idx, interpret_stream_inner(job, resolver, options, cancel)))
            .collect()
    });

    results.sort_by_key(|(idx, _)| *idx);
    Ok(results.into_iter().map(|(_, result)| result).collect())
}
