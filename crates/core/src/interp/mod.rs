//! PDF content stream interpretation and canvas output.
//!
//! This module contains:
//! - `lexer`: content stream tokenizer
//! - `interpreter`: operator dispatch and page interpreter
//! - `device`: Canvas trait and the recording implementation
//! - `ops`: Operator implementations by category

pub mod device;
pub mod interpreter;
pub mod lexer;
pub mod ops;

// Re-export main types for convenience
pub use device::{Canvas, CanvasCall, Path, PathSegment, RecordingCanvas};
pub use interpreter::{PDFPageInterpreter, Processor, ProcessorTable};
pub use lexer::{ContentLexer, ContentToken, parse_object};
pub use ops::NativeProcessor;
