//! # uniform-core - Uniform Random Tensors and Equivalence Checking
//!
//! Generates tensors of uniformly distributed values shaped like an input
//! tensor, and checks generated tensors against an external reference.
//!
//! ## Architecture
//!
//! - **Tensors**: typed, shaped host storage, either owned or aliasing a
//!   caller's bytes for the caller's lifetime
//! - **Kernel**: `uniform_like`, a deterministic ChaCha-driven generator for
//!   the four float types
//! - **Verifier**: exact element comparison with a cosine-similarity fallback
//! - **Harness**: builds one case's tensors, runs kernel and reference, and
//!   reports a verdict
//!
//! ## Example
//!
//! ```
//! use uniform_core::{uniform_like, equivalent, DataType, Tensor};
//!
//! let input = Tensor::create(DataType::Float32, &[4])?;
//! let high = Tensor::from_vec(&[1], vec![1.0f32])?;
//! let low = Tensor::from_vec(&[1], vec![0.0f32])?;
//! let seed = Tensor::from_vec(&[1], vec![42.0f32])?;
//!
//! let a = uniform_like(DataType::Float32, &input, &high, &low, &seed)?;
//! let b = uniform_like(DataType::Float32, &input, &high, &low, &seed)?;
//! assert!(equivalent(&a, &b)?);
//! # Ok::<(), uniform_core::Error>(())
//! ```
//!
//! ## Modules
//!
//! - [`tensor`], [`dtype`], [`buffer`] - Tensor construction
//! - [`ops::random`] - `uniform_like`
//! - [`ops::memory`] - Test-pattern fill
//! - [`verify`] - Equivalence checks
//! - [`oracle`] - Reference generator seam
//! - [`harness`] - Per-case driver

pub mod buffer;
pub mod dtype;
pub mod error;
pub mod harness;
pub mod instrumentation;
pub mod ops;
pub mod oracle;
pub mod tensor;
pub mod verify;

// Re-export primary types
pub use buffer::{HostBuffer, MemoryPool};
pub use dtype::{DataType, Element};
pub use error::{Error, ErrorCategory, Result};
pub use harness::{run_case, run_case_with, run_cases, CaseReport, UniformLikeCase};
pub use instrumentation::ExecutionMetrics;
pub use ops::random::uniform_like;
pub use oracle::{OracleOutput, ReferenceOracle};
pub use tensor::Tensor;
pub use verify::{equivalent, Verdict, Verifier, VerifyConfig, COSINE_SIMILARITY_THRESHOLD};
