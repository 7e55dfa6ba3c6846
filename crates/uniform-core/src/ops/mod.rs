//! Tensor-producing operations
//!
//! ## Modules
//!
//! - `memory` - Deterministic fills for harness input tensors
//! - `random` - Random generation kernels (`uniform_like`)

pub mod memory;
pub mod random;
