//! Error types for the pagepaint interpreter and color engine.

use thiserror::Error;

/// Primary error type for color resolution and content interpretation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PdfError {
    #[error("unsupported color space: {0}")]
    UnsupportedColorSpace(String),

    #[error("function evaluation failed: {0}")]
    FunctionEvaluationError(String),

    #[error("operator {operator} is not valid in color space {space}")]
    InvalidColorSpaceOperator { operator: String, space: String },

    #[error("alternate color space {space} is not supported within operator {operator}")]
    UnsupportedAlternateColorSpace { operator: String, space: String },

    #[error("operator {operator} expects {expected} operands, got {got}")]
    OperandCountError {
        operator: String,
        expected: usize,
        got: usize,
    },

    #[error("type error: expected {expected}, got {got}")]
    TypeError {
        expected: &'static str,
        got: &'static str,
    },

    #[error("key not found: {0}")]
    KeyError(String),

    #[error("PDF object not found: {0} {1} R")]
    ObjectNotFound(u32, u32),

    #[error("PDF syntax error at position {pos}: {msg}")]
    SyntaxError { pos: usize, msg: String },

    #[error("interpretation interrupted")]
    Interrupted,

    #[error("thread pool error: {0}")]
    ThreadPoolError(String),
}

impl PdfError {
    /// Whether the error invalidates the rest of the content stream.
    ///
    /// Operand misalignment and lexing failures corrupt every later operator,
    /// so interpretation stops. Everything else only voids the current
    /// operator's effect.
    pub const fn is_stream_fatal(&self) -> bool {
        matches!(
            self,
            Self::OperandCountError { .. } | Self::SyntaxError { .. } | Self::Interrupted
        )
    }
}

/// Convenience Result type alias for PdfError.
pub type Result<T> = std::result::Result<T, PdfError>;
