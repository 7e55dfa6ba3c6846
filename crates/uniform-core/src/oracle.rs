//! Reference generator seam
//!
//! The harness compares kernel output against an independent reference
//! implementation reached through [`ReferenceOracle`]. The oracle hands back
//! raw bytes and a shape; the harness wraps them into a tensor of the input's
//! type and trusts nothing else about the reference.

use crate::error::Result;
use crate::tensor::Tensor;

/// Raw output of a reference generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleOutput {
    /// Row-major element bytes in the input tensor's type
    pub buffer: Vec<u8>,
    /// Output dimensions
    pub shape: Vec<usize>,
}

impl OracleOutput {
    pub fn rank(&self) -> usize {
        self.shape.len()
    }
}

/// External reference for `RandomUniformLike`
///
/// Implementations report their own failures as [`crate::Error::Oracle`].
pub trait ReferenceOracle {
    /// Generate values uniform in `[low, high)` shaped like `input`
    ///
    /// `rank_hint` is the opaque integer the reference call takes in its
    /// second position; the harness always passes `1`.
    fn random_uniform_like(
        &self,
        input: &Tensor<'_>,
        rank_hint: usize,
        high: f32,
        low: f32,
        seed: f32,
    ) -> Result<OracleOutput>;
}

impl<O: ReferenceOracle + ?Sized> ReferenceOracle for &O {
    fn random_uniform_like(
        &self,
        input: &Tensor<'_>,
        rank_hint: usize,
        high: f32,
        low: f32,
        seed: f32,
    ) -> Result<OracleOutput> {
        (**self).random_uniform_like(input, rank_hint, high, low, seed)
    }
}
