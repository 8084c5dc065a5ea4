//! PDF page interpreter.
//!
//! Executes content stream operators against a [`Canvas`]. Operators are
//! looked up in a dispatch table of processors; each processor pops its
//! operands, updates the graphics state and forwards geometry to the canvas.
//!
//! Failure policy: operand misalignment, lexing failures and cancellation
//! stop the stream (`PdfError::is_stream_fatal`); any other processor error
//! is logged and only voids that one operator.

use super::device::{Canvas, Path, PathSegment};
use super::lexer::{ContentLexer, ContentToken};
use crate::error::{PdfError, Result};
use crate::model::color::ColorSpaceResolver;
use crate::model::objects::PDFObject;
use crate::model::state::PDFGraphicState;
use crate::utils::{MATRIX_IDENTITY, Matrix, Point};
use bytes::Bytes;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{trace, warn};

/// Operator processor: receives the operator name and its operands.
pub type Processor<'a, C> =
    fn(&mut PDFPageInterpreter<'a, C>, &str, &mut Vec<PDFObject>) -> Result<()>;

/// Dispatch table from operator name to processor.
pub type ProcessorTable<'a, C> = FxHashMap<&'static str, Processor<'a, C>>;

/// Saved graphics state for q/Q operators.
type SavedState = PDFGraphicState;

/// PDF Page Interpreter - executes PDF content stream operators.
///
/// Note: Method names like `do_Q`, `do_S`, `do_B` intentionally use uppercase
/// to match PDF operator names (q/Q, s/S, b/B, etc.).
pub struct PDFPageInterpreter<'a, C: Canvas> {
    /// Shared color space resolver
    pub(crate) resolver: &'a ColorSpaceResolver,
    /// Output canvas for path and paint calls
    pub(crate) canvas: &'a mut C,
    /// Graphics state stack for q/Q operators
    pub(crate) gstack: Vec<SavedState>,
    /// Current graphics state
    pub(crate) graphicstate: PDFGraphicState,
    /// Current path being constructed, in device space
    pub(crate) curpath: Path,
    /// Page resource dictionary (`/ColorSpace` lookups)
    pub(crate) resources: HashMap<String, PDFObject>,
    processors: ProcessorTable<'a, C>,
}

#[allow(non_snake_case)]
impl<'a, C: Canvas> PDFPageInterpreter<'a, C> {
    /// Create a new interpreter with the default operator table.
    pub fn new(resolver: &'a ColorSpaceResolver, canvas: &'a mut C) -> Self {
        let mut processors = ProcessorTable::default();
        Self::register_graphics_state_ops(&mut processors);
        Self::register_color_ops(&mut processors);
        Self::register_path_ops(&mut processors);
        let mut interp = Self {
            resolver,
            canvas,
            gstack: Vec::new(),
            graphicstate: PDFGraphicState::new(),
            curpath: Path::new(),
            resources: HashMap::new(),
            processors,
        };
        interp.init_state(MATRIX_IDENTITY);
        interp
    }

    /// Reset the graphics state under an initial transformation.
    pub fn init_state(&mut self, ctm: Matrix) {
        self.gstack.clear();
        self.graphicstate = PDFGraphicState::with_ctm(ctm);
        self.canvas.set_ctm(ctm);
        self.curpath.clear();
    }

    /// Install the page resource dictionary.
    pub fn init_resources(&mut self, resources: HashMap<String, PDFObject>) {
        self.resources = resources;
    }

    /// Add or replace the processor for an operator.
    pub fn register_operator(&mut self, name: &'static str, processor: Processor<'a, C>) {
        self.processors.insert(name, processor);
    }

    /// Whether `name` has a processor.
    pub fn has_operator(&self, name: &str) -> bool {
        self.processors.contains_key(name)
    }

    /// Get current transformation matrix.
    pub const fn ctm(&self) -> Matrix {
        self.graphicstate.ctm
    }

    /// Get current graphics state (read-only).
    pub const fn graphicstate(&self) -> &PDFGraphicState {
        &self.graphicstate
    }

    /// Get current path (read-only).
    pub const fn current_path(&self) -> &Path {
        &self.curpath
    }

    /// Depth of the q/Q stack.
    pub fn stack_depth(&self) -> usize {
        self.gstack.len()
    }

    pub(crate) fn get_current_state(&self) -> SavedState {
        self.graphicstate.clone()
    }

    pub(crate) fn set_current_state(&mut self, state: SavedState) {
        self.graphicstate = state;
        self.canvas.set_ctm(self.graphicstate.ctm);
    }

    /// Execute one content stream.
    pub fn execute(&mut self, data: &[u8]) -> Result<()> {
        self.run(ContentLexer::new(Bytes::copy_from_slice(data)), None)
    }

    /// Execute one content stream, stopping with [`PdfError::Interrupted`]
    /// once `cancel` is set. The flag is checked between tokens.
    pub fn execute_with_cancel(&mut self, data: &[u8], cancel: &AtomicBool) -> Result<()> {
        self.run(ContentLexer::new(Bytes::copy_from_slice(data)), Some(cancel))
    }

    /// Execute an already tokenized stream.
    pub fn execute_tokens<I>(&mut self, tokens: I) -> Result<()>
    where
        I: IntoIterator<Item = Result<ContentToken>>,
    {
        self.run(tokens, None)
    }

    fn run<I>(&mut self, tokens: I, cancel: Option<&AtomicBool>) -> Result<()>
    where
        I: IntoIterator<Item = Result<ContentToken>>,
    {
        let mut operand_stack: Vec<PDFObject> = Vec::new();

        for token in tokens {
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                return Err(PdfError::Interrupted);
            }
            match token? {
                ContentToken::Operand(obj) => operand_stack.push(obj),
                ContentToken::Operator(name) => {
                    let result = self.process_operator(&name, &mut operand_stack);
                    operand_stack.clear();
                    result?;
                }
            }
        }
        Ok(())
    }

    /// Run a single operator with its operands.
    ///
    /// Returns `Err` only for stream-fatal errors; other failures are
    /// logged and swallowed.
    pub fn process_operator(&mut self, name: &str, args: &mut Vec<PDFObject>) -> Result<()> {
        let Some(processor) = self.processors.get(name).copied() else {
            trace!(operator = name, "skipping unsupported operator");
            return Ok(());
        };
        match processor(self, name, args) {
            Ok(()) => Ok(()),
            Err(e) if e.is_stream_fatal() => Err(e),
            Err(e) => {
                warn!(operator = name, error = %e, "operator failed");
                Ok(())
            }
        }
    }

    // ========================================================================
    // Canvas helpers
    // ========================================================================

    /// Append a device-space segment to the current path and the canvas.
    pub(crate) fn append_segment(&mut self, segment: PathSegment) {
        self.curpath.push(segment);
        self.canvas.append_path_segment(segment);
    }

    /// Hand the current path to the canvas and clear it.
    pub(crate) fn paint_path(&mut self, stroke: bool, fill: bool, even_odd: bool) {
        if fill {
            let color = self.graphicstate.color(false);
            self.canvas
                .fill_path(&color.to_vec(), color.family(), even_odd);
        }
        if stroke {
            let color = self.graphicstate.color(true);
            self.canvas.stroke_path(&color.to_vec(), color.family());
        }
        if !stroke && !fill {
            self.canvas.discard_path();
        }
        self.canvas.end_path();
        self.curpath.clear();
    }

    // ========================================================================
    // Operand helpers
    // ========================================================================

    /// Take the last `n` operands as numbers.
    pub(crate) fn pop_numbers(
        operator: &str,
        args: &mut Vec<PDFObject>,
        n: usize,
    ) -> Result<SmallVec<[f64; 6]>> {
        let count_error = |got| PdfError::OperandCountError {
            operator: operator.to_string(),
            expected: n,
            got,
        };
        if args.len() < n {
            return Err(count_error(args.len()));
        }
        let tail = args.split_off(args.len() - n);
        let numbers: SmallVec<[f64; 6]> =
            tail.iter().filter_map(|obj| obj.as_num().ok()).collect();
        if numbers.len() != n {
            return Err(count_error(numbers.len()));
        }
        Ok(numbers)
    }

    pub(crate) fn pop_scalar(operator: &str, args: &mut Vec<PDFObject>) -> Result<f64> {
        Ok(Self::pop_numbers(operator, args, 1)?[0])
    }

    pub(crate) fn pop_point(operator: &str, args: &mut Vec<PDFObject>) -> Result<Point> {
        let p = Self::pop_numbers(operator, args, 2)?;
        Ok((p[0], p[1]))
    }

    pub(crate) fn pop_matrix(operator: &str, args: &mut Vec<PDFObject>) -> Result<Matrix> {
        let m = Self::pop_numbers(operator, args, 6)?;
        Ok((m[0], m[1], m[2], m[3], m[4], m[5]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::NoFunctionEvaluator;
    use crate::interp::device::RecordingCanvas;
    use crate::model::objects::MemoryObjectStore;
    use std::sync::Arc;

    fn resolver() -> ColorSpaceResolver {
        ColorSpaceResolver::new(
            Arc::new(MemoryObjectStore::new()),
            Arc::new(NoFunctionEvaluator),
        )
    }

    #[test]
    fn unknown_operators_are_skipped() {
        let resolver = resolver();
        let mut canvas = RecordingCanvas::new();
        let mut interp = PDFPageInterpreter::new(&resolver, &mut canvas);
        assert!(interp.execute(b"BT /F1 12 Tf (x) Tj ET 0 0 m").is_ok());
        assert_eq!(interp.current_path().len(), 1);
    }

    #[test]
    fn operand_count_error_stops_stream() {
        let resolver = resolver();
        let mut canvas = RecordingCanvas::new();
        let mut interp = PDFPageInterpreter::new(&resolver, &mut canvas);
        let err = interp.execute(b"0 0 m 1 l 5 5 l").unwrap_err();
        assert!(matches!(err, PdfError::OperandCountError { expected: 2, got: 1, .. }));
        assert_eq!(interp.current_path().len(), 1);
    }

    #[test]
    fn custom_processor_can_be_registered() {
        fn count(
            interp: &mut PDFPageInterpreter<'_, RecordingCanvas>,
            _: &str,
            _: &mut Vec<PDFObject>,
        ) -> Result<()> {
            interp.graphicstate.linewidth += 1.0;
            Ok(())
        }
        let resolver = resolver();
        let mut canvas = RecordingCanvas::new();
        let mut interp = PDFPageInterpreter::new(&resolver, &mut canvas);
        assert!(!interp.has_operator("BX"));
        interp.register_operator("BX", count);
        interp.execute(b"BX BX").unwrap();
        assert_eq!(interp.graphicstate().linewidth, 3.0);
    }

    #[test]
    fn cancellation_interrupts() {
        let resolver = resolver();
        let mut canvas = RecordingCanvas::new();
        let mut interp = PDFPageInterpreter::new(&resolver, &mut canvas);
        let cancel = AtomicBool::new(true);
        assert_eq!(
            interp.execute_with_cancel(b"0 0 m", &cancel),
            Err(PdfError::Interrupted)
        );
    }
}
