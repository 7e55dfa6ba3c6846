//! Memory operations
//!
//! Deterministic fills used to give harness input tensors reproducible
//! contents. Values come from a fixed-seed ChaCha stream, so two fills of
//! tensors with the same type and shape produce identical bytes.
//!
//! # Example
//!
//! ```
//! use uniform_core::{ops::memory, DataType, Tensor};
//!
//! let mut input = Tensor::create(DataType::Float32, &[2, 8])?;
//! memory::fill_with_test_pattern(&mut input)?;
//! # Ok::<(), uniform_core::Error>(())
//! ```

use crate::dtype::{with_element_type, DataType, Element};
use crate::error::Result;
use crate::instrumentation::ExecutionMetrics;
use crate::tensor::Tensor;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seed of the test-pattern stream
pub const TEST_PATTERN_SEED: u64 = 0x5eed_7e57;

/// Fill `tensor` with a reproducible synthetic pattern
///
/// - floats: uniform in `[-1, 1)`
/// - signed integers: uniform in `[-8, 8)`
/// - unsigned integers: uniform in `[0, 16)`
/// - bool: 0 or 1
///
/// An aliasing tensor is detached into owned storage first; the caller's
/// bytes are never written.
#[tracing::instrument(skip(tensor), fields(dtype = %tensor.datatype(), shape = ?tensor.shape()))]
pub fn fill_with_test_pattern(tensor: &mut Tensor<'_>) -> Result<()> {
    let start = std::time::Instant::now();
    let dtype = tensor.datatype();
    let n = tensor.numel();
    let mut rng = ChaCha8Rng::seed_from_u64(TEST_PATTERN_SEED);

    let bytes = tensor.bytes_mut();
    with_element_type!(dtype, T => {
        let values: Vec<T> = (0..n).map(|_| T::from_f64_lossy(pattern_value(dtype, &mut rng))).collect();
        bytes.copy_from_slice(bytemuck::cast_slice(&values));
    });

    ExecutionMetrics::new("fill_with_test_pattern", n, tensor.size_bytes(), start).log();
    Ok(())
}

fn pattern_value(dtype: DataType, rng: &mut ChaCha8Rng) -> f64 {
    if dtype.is_float() {
        rng.gen_range(-1.0..1.0)
    } else if dtype.is_signed_int() {
        rng.gen_range(-8i32..8) as f64
    } else if dtype == DataType::Bool {
        (rng.gen::<u32>() & 1) as f64
    } else {
        rng.gen_range(0u32..16) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_is_reproducible() -> Result<()> {
        let mut a = Tensor::create(DataType::Float32, &[4, 4])?;
        let mut b = Tensor::create(DataType::Float32, &[4, 4])?;
        fill_with_test_pattern(&mut a)?;
        fill_with_test_pattern(&mut b)?;

        assert_eq!(a.as_bytes(), b.as_bytes());
        assert!(a.to_f64_vec().iter().any(|&v| v != 0.0));
        Ok(())
    }

    #[test]
    fn test_fill_ranges_per_type() -> Result<()> {
        for dtype in DataType::ALL {
            let mut tensor = Tensor::create(dtype, &[64])?;
            fill_with_test_pattern(&mut tensor)?;
            let values = tensor.to_f64_vec();

            let (lo, hi) = if dtype.is_float() {
                (-1.0, 1.0)
            } else if dtype.is_signed_int() {
                (-8.0, 7.0)
            } else if dtype == DataType::Bool {
                (0.0, 1.0)
            } else {
                (0.0, 15.0)
            };
            assert!(
                values.iter().all(|&v| v >= lo && v <= hi),
                "{dtype}: {values:?}"
            );
        }
        Ok(())
    }

    #[test]
    fn test_fill_detaches_aliased_storage() -> Result<()> {
        let raw = [0u8; 16];
        let mut tensor = Tensor::from_buffer(DataType::Int32, &[4], &raw, false)?;
        fill_with_test_pattern(&mut tensor)?;

        assert!(tensor.is_owned());
        assert_eq!(raw, [0u8; 16]);
        Ok(())
    }

    #[test]
    fn test_fill_empty() -> Result<()> {
        let mut tensor = Tensor::create(DataType::Float64, &[0, 3])?;
        fill_with_test_pattern(&mut tensor)?;
        assert_eq!(tensor.size_bytes(), 0);
        Ok(())
    }
}
