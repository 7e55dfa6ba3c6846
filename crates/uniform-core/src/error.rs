//! Error types for uniform-core operations

use crate::dtype::DataType;

/// Result type for uniform-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in uniform-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Out of memory
    #[error("Out of memory: requested {requested} bytes")]
    OutOfMemory { requested: usize },

    /// Byte size of a shape/type pair does not fit in `usize`
    #[error("Allocation size overflow: shape {shape:?} of {dtype}")]
    SizeOverflow { shape: Vec<usize>, dtype: DataType },

    /// Buffer size mismatch
    #[error("Buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// Tensor shapes differ
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch { expected: Vec<usize>, actual: Vec<usize> },

    /// A broadcast parameter tensor holds more or fewer than one element
    #[error("Parameter `{param}` must hold exactly one element, got {numel}")]
    ParameterNotScalar { param: &'static str, numel: usize },

    /// Type mismatch
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: DataType, actual: DataType },

    /// Element type not accepted by an operation
    #[error("Unsupported type {dtype} for {op}")]
    UnsupportedType { dtype: DataType, op: &'static str },

    /// Scalar value cannot be represented in the requested type
    #[error("Value {value} cannot be represented as {dtype}")]
    ScalarConversion { value: f64, dtype: DataType },

    /// Generation failure inside a kernel
    #[error("Kernel execution error: parameter `{param}`: {reason}")]
    KernelExecution { param: &'static str, reason: String },

    /// The reference oracle failed to produce an output
    #[error("Reference oracle error: {0}")]
    Oracle(String),
}

/// Coarse error classes, for callers that branch on the kind of failure
/// rather than on individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Allocation,
    ShapeMismatch,
    DType,
    KernelExecution,
    Oracle,
}

impl Error {
    /// Class of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::OutOfMemory { .. } | Error::SizeOverflow { .. } => ErrorCategory::Allocation,
            Error::BufferSizeMismatch { .. } | Error::ShapeMismatch { .. } | Error::ParameterNotScalar { .. } => {
                ErrorCategory::ShapeMismatch
            }
            Error::TypeMismatch { .. } | Error::UnsupportedType { .. } | Error::ScalarConversion { .. } => {
                ErrorCategory::DType
            }
            Error::KernelExecution { .. } => ErrorCategory::KernelExecution,
            Error::Oracle(_) => ErrorCategory::Oracle,
        }
    }
}
