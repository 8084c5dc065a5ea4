//! pagepaint - PDF content stream interpreter and color space engine.
//!
//! Resolves color space descriptors into [`model::ColorSpace`] values,
//! converts colors between models, and interprets path and color operators
//! onto an [`interp::Canvas`].

pub mod api;
pub mod error;
pub mod function;
pub mod interp;
pub mod model;
pub mod text;
pub mod utils;

pub use error::{PdfError, Result};
pub use function::{BasicFunctionEvaluator, FunctionEvaluator, NoFunctionEvaluator, PdfFunction};
pub use interp::{Canvas, CanvasCall, PDFPageInterpreter, RecordingCanvas};
pub use model::{ColorSpace, ColorSpaceFamily, ColorSpaceResolver, PDFObject};
