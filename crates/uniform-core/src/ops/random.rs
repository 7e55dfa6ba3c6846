//! Random generation kernels
//!
//! [`uniform_like`] fills a new tensor, shaped like its input, with values
//! drawn uniformly from `[low, high)`.
//!
//! ## Generation
//!
//! - The generator is `ChaCha8Rng` seeded with the `seed` parameter, so
//!   output depends only on `(datatype, shape, high, low, seed)` and is
//!   stable across platforms.
//! - One 53-bit `f64` unit sample is drawn per element in row-major order
//!   and scaled in `f64`, then rounded to the output type.
//! - Rounding can land on `high` or just below `low`; such values are
//!   clamped to the nearest representable value inside `[low, high)`.
//!
//! # Example
//!
//! ```
//! use uniform_core::{ops::random::uniform_like, DataType, Tensor};
//!
//! let input = Tensor::create(DataType::Float32, &[2, 3])?;
//! let high = Tensor::from_vec(&[1], vec![1.0f32])?;
//! let low = Tensor::from_vec(&[1], vec![0.0f32])?;
//! let seed = Tensor::from_vec(&[1], vec![42.0f32])?;
//!
//! let out = uniform_like(DataType::Float32, &input, &high, &low, &seed)?;
//! assert_eq!(out.shape(), &[2, 3]);
//! # Ok::<(), uniform_core::Error>(())
//! ```

use crate::dtype::{DataType, Element};
use crate::error::{Error, Result};
use crate::instrumentation::ExecutionMetrics;
use crate::tensor::Tensor;
use half::{bf16, f16};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Upper bound (exclusive) of seeds accepted after truncation: 2^63
const SEED_LIMIT: f64 = 9_223_372_036_854_775_808.0;

/// Float element that can step to its neighbouring representable values
pub trait UniformElement: Element {
    /// Largest representable value strictly below `self`
    fn next_below(self) -> Self;

    /// Smallest representable value strictly above `self`
    fn next_above(self) -> Self;
}

macro_rules! impl_uniform_element {
    ($($t:ty => $sign:expr),* $(,)?) => {$(
        impl UniformElement for $t {
            fn next_below(self) -> Self {
                let bits = self.to_bits();
                if bits & !$sign == 0 {
                    // +0 or -0: smallest negative subnormal
                    <$t>::from_bits($sign | 1)
                } else if bits & $sign == 0 {
                    <$t>::from_bits(bits - 1)
                } else {
                    <$t>::from_bits(bits + 1)
                }
            }

            fn next_above(self) -> Self {
                let bits = self.to_bits();
                if bits & !$sign == 0 {
                    <$t>::from_bits(1)
                } else if bits & $sign == 0 {
                    <$t>::from_bits(bits + 1)
                } else {
                    <$t>::from_bits(bits - 1)
                }
            }
        }
    )*};
}

impl_uniform_element!(
    f16 => 0x8000u16,
    bf16 => 0x8000u16,
    f32 => 0x8000_0000u32,
    f64 => 0x8000_0000_0000_0000u64,
);

/// Validated kernel parameters in working precision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformParams {
    pub high: f64,
    pub low: f64,
    pub seed: u64,
}

impl UniformParams {
    /// Check bounds and convert the seed
    ///
    /// # Errors
    ///
    /// [`Error::KernelExecution`] naming the offending parameter when a bound
    /// is not finite, `low >= high`, `high - low` overflows, or the seed is
    /// not finite or outside the `i64` range.
    pub fn new(high: f64, low: f64, seed: f64) -> Result<Self> {
        if !high.is_finite() {
            return Err(Error::KernelExecution {
                param: "high",
                reason: format!("bound must be finite, got {high}"),
            });
        }
        if !low.is_finite() {
            return Err(Error::KernelExecution {
                param: "low",
                reason: format!("bound must be finite, got {low}"),
            });
        }
        if low >= high {
            return Err(Error::KernelExecution {
                param: "low",
                reason: format!("empty range: low {low} is not below high {high}"),
            });
        }
        if !(high - low).is_finite() {
            return Err(Error::KernelExecution {
                param: "high",
                reason: format!("range width overflows: [{low}, {high})"),
            });
        }

        Ok(Self {
            high,
            low,
            seed: seed_to_u64(seed)?,
        })
    }
}

/// Convert a float seed to the generator seed
///
/// Truncates toward zero and reinterprets the `i64` as `u64`.
fn seed_to_u64(seed: f64) -> Result<u64> {
    let truncated = seed.trunc();
    if !truncated.is_finite() || truncated < -SEED_LIMIT || truncated >= SEED_LIMIT {
        return Err(Error::KernelExecution {
            param: "seed",
            reason: format!("seed {seed} does not fit in a 64-bit integer"),
        });
    }
    Ok(truncated as i64 as u64)
}

/// Read a single-element parameter tensor as `f64`
fn read_scalar(param: &'static str, tensor: &Tensor<'_>) -> Result<f64> {
    tensor.scalar_f64().ok_or(Error::ParameterNotScalar {
        param,
        numel: tensor.numel(),
    })
}

/// Generate a tensor shaped like `input` with values uniform in `[low, high)`
///
/// `high`, `low` and `seed` are single-element tensors of any type; their
/// values are read in their own type and widened to `f64`. Elements of
/// `input` are never read.
///
/// # Errors
///
/// - [`Error::UnsupportedType`] if `datatype` is not a float type
/// - [`Error::ParameterNotScalar`] if a parameter does not hold one element
/// - [`Error::KernelExecution`] for invalid bounds or seed, or if no value of
///   `datatype` lies in `[low, high)`
/// - allocation errors from [`Tensor::create`]
#[tracing::instrument(skip(input, high, low, seed), fields(dtype = %datatype, shape = ?input.shape()))]
pub fn uniform_like(
    datatype: DataType,
    input: &Tensor<'_>,
    high: &Tensor<'_>,
    low: &Tensor<'_>,
    seed: &Tensor<'_>,
) -> Result<Tensor<'static>> {
    if !datatype.is_float() {
        return Err(Error::UnsupportedType {
            dtype: datatype,
            op: "uniform_like",
        });
    }

    let params = UniformParams::new(
        read_scalar("high", high)?,
        read_scalar("low", low)?,
        read_scalar("seed", seed)?,
    )?;
    tracing::trace!(high = params.high, low = params.low, seed = params.seed, "uniform_like params");

    generate(datatype, input.shape(), params)
}

/// Generate a uniform tensor of `datatype` and `shape` from validated params
pub fn generate(datatype: DataType, shape: &[usize], params: UniformParams) -> Result<Tensor<'static>> {
    let start = std::time::Instant::now();
    let mut output = Tensor::create(datatype, shape)?;
    let n = output.numel();

    match datatype {
        DataType::Float16 => fill_uniform::<f16>(&mut output, params)?,
        DataType::BFloat16 => fill_uniform::<bf16>(&mut output, params)?,
        DataType::Float32 => fill_uniform::<f32>(&mut output, params)?,
        DataType::Float64 => fill_uniform::<f64>(&mut output, params)?,
        other => {
            return Err(Error::UnsupportedType {
                dtype: other,
                op: "uniform_like",
            })
        }
    }

    ExecutionMetrics::new("uniform_like", n, output.size_bytes(), start).log();
    Ok(output)
}

/// Representable bounds of `[low, high)` in `T`: smallest value `>= low`
/// and largest value `< high`
fn representable_bounds<T: UniformElement>(params: UniformParams) -> Result<(T, T)> {
    let mut lo = T::from_f64_lossy(params.low);
    if lo.to_f64() < params.low {
        lo = lo.next_above();
    }
    let mut hi = T::from_f64_lossy(params.high);
    while hi.to_f64() >= params.high {
        hi = hi.next_below();
    }

    if lo.to_f64() > hi.to_f64() {
        return Err(Error::KernelExecution {
            param: "high",
            reason: format!(
                "no {} value lies in [{}, {})",
                T::DTYPE,
                params.low,
                params.high
            ),
        });
    }
    Ok((lo, hi))
}

fn fill_uniform<T: UniformElement>(output: &mut Tensor<'static>, params: UniformParams) -> Result<()> {
    let (lo, hi) = representable_bounds::<T>(params)?;
    let (lo_f, hi_f) = (lo.to_f64(), hi.to_f64());
    let width = params.high - params.low;
    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);

    let values: Vec<T> = (0..output.numel())
        .map(|_| {
            let unit: f64 = rng.gen();
            let value = T::from_f64_lossy(params.low + width * unit);
            let v = value.to_f64();
            if v > hi_f {
                hi
            } else if v < lo_f {
                lo
            } else {
                value
            }
        })
        .collect();

    output.bytes_mut().copy_from_slice(bytemuck::cast_slice(&values));
    Ok(())
}
