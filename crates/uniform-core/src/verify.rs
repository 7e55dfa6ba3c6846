//! Tensor equivalence checks
//!
//! Two tensors of the same shape and type are equivalent when every element
//! pair is identical, or failing that, when their cosine similarity reaches a
//! threshold. The fallback accepts outputs of a different but statistically
//! compatible generator.
//!
//! # Example
//!
//! ```
//! use uniform_core::{verify::Verdict, Tensor, Verifier};
//!
//! let a = Tensor::from_vec(&[3], vec![1.0f32, 2.0, 3.0])?;
//! let b = Tensor::from_vec(&[3], vec![1.0f32, 2.0, 3.001])?;
//!
//! let verdict = Verifier::default().compare(&a, &b)?;
//! assert!(matches!(verdict, Verdict::Similar { .. }));
//! # Ok::<(), uniform_core::Error>(())
//! ```

use crate::dtype::{with_element_type, Element};
use crate::error::{Error, Result};
use crate::tensor::Tensor;

/// Default minimum cosine similarity for the fallback check
pub const COSINE_SIMILARITY_THRESHOLD: f64 = 0.99;

/// Environment variable overriding [`VerifyConfig::cosine_threshold`]
pub const COSINE_THRESHOLD_ENV: &str = "UNIFORM_VERIFY_COSINE_THRESHOLD";

/// Verifier settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerifyConfig {
    /// Minimum cosine similarity accepted by the fallback, in `(0, 1]`
    pub cosine_threshold: f64,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            cosine_threshold: COSINE_SIMILARITY_THRESHOLD,
        }
    }
}

impl VerifyConfig {
    /// Defaults, overridden by `UNIFORM_VERIFY_COSINE_THRESHOLD` when it
    /// parses to a value in `(0, 1]`
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(COSINE_THRESHOLD_ENV) {
            match raw.trim().parse::<f64>() {
                Ok(value) if value > 0.0 && value <= 1.0 => config.cosine_threshold = value,
                _ => tracing::warn!(value = %raw, "ignoring invalid {COSINE_THRESHOLD_ENV}"),
            }
        }
        config
    }
}

/// Outcome of comparing two tensors
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    /// Every element pair identical
    Exact,
    /// Not identical, but cosine similarity at or above the threshold
    Similar { cosine: f64 },
    /// Neither check passed; `cosine` is `None` when a norm is zero
    Mismatch { cosine: Option<f64> },
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        !matches!(self, Verdict::Mismatch { .. })
    }
}

/// Equivalence checker
#[derive(Debug, Clone, Default)]
pub struct Verifier {
    config: VerifyConfig,
}

impl Verifier {
    pub fn new(config: VerifyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VerifyConfig {
        &self.config
    }

    /// Compare `expected` against `actual`
    ///
    /// Symmetric: swapping the arguments never changes pass/fail.
    ///
    /// # Errors
    ///
    /// [`Error::ShapeMismatch`] if the dimension lists differ (equal element
    /// counts are not enough), then [`Error::TypeMismatch`] if the types
    /// differ.
    #[tracing::instrument(skip(self, expected, actual), fields(dtype = %expected.datatype(), shape = ?expected.shape()))]
    pub fn compare(&self, expected: &Tensor<'_>, actual: &Tensor<'_>) -> Result<Verdict> {
        if expected.shape() != actual.shape() {
            return Err(Error::ShapeMismatch {
                expected: expected.shape().to_vec(),
                actual: actual.shape().to_vec(),
            });
        }
        if expected.datatype() != actual.datatype() {
            return Err(Error::TypeMismatch {
                expected: expected.datatype(),
                actual: actual.datatype(),
            });
        }

        if is_same_tensor(expected, actual) {
            return Ok(Verdict::Exact);
        }

        let verdict = match cosine_similarity(expected, actual) {
            Some(cosine) if cosine >= self.config.cosine_threshold => Verdict::Similar { cosine },
            cosine => Verdict::Mismatch { cosine },
        };
        tracing::debug!(?verdict, threshold = self.config.cosine_threshold, "exact check failed");
        Ok(verdict)
    }

    /// Emit a warning carrying both tensors' dumps
    pub fn report_mismatch(&self, expected: &Tensor<'_>, actual: &Tensor<'_>, verdict: &Verdict) {
        tracing::warn!(
            ?verdict,
            threshold = self.config.cosine_threshold,
            expected = %expected,
            actual = %actual,
            "tensors are not equivalent"
        );
    }
}

/// Pass/fail under the default verifier
pub fn equivalent(expected: &Tensor<'_>, actual: &Tensor<'_>) -> Result<bool> {
    Verifier::default().compare(expected, actual).map(|v| v.is_pass())
}

/// Element-wise identity of two tensors already known to share shape and type
fn is_same_tensor(a: &Tensor<'_>, b: &Tensor<'_>) -> bool {
    if a.as_bytes() == b.as_bytes() {
        return true;
    }
    with_element_type!(a.datatype(), T => {
        let size = std::mem::size_of::<T>();
        a.as_bytes()
            .chunks_exact(size)
            .zip(b.as_bytes().chunks_exact(size))
            .all(|(x, y)| {
                bytemuck::pod_read_unaligned::<T>(x).same(bytemuck::pod_read_unaligned::<T>(y))
            })
    })
}

/// Cosine similarity in `f64`; `None` when either vector has zero norm
pub fn cosine_similarity(a: &Tensor<'_>, b: &Tensor<'_>) -> Option<f64> {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.to_f64_vec().into_iter().zip(b.to_f64_vec()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }
    Some(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::DataType;
    use approx::assert_relative_eq;
    use std::sync::Mutex;

    // Serializes tests that touch process environment.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_identical_is_exact() -> Result<()> {
        let a = Tensor::from_vec(&[4], vec![0.1f32, 0.2, 0.3, 0.4])?;
        assert_eq!(Verifier::default().compare(&a, &a.clone())?, Verdict::Exact);
        Ok(())
    }

    #[test]
    fn test_signed_zero_is_exact() -> Result<()> {
        let a = Tensor::from_vec(&[2], vec![0.0f64, 1.0])?;
        let b = Tensor::from_vec(&[2], vec![-0.0f64, 1.0])?;
        assert_eq!(Verifier::default().compare(&a, &b)?, Verdict::Exact);
        Ok(())
    }

    #[test]
    fn test_identical_nan_is_exact() -> Result<()> {
        let a = Tensor::from_vec(&[2], vec![f32::NAN, 1.0])?;
        assert_eq!(Verifier::default().compare(&a, &a.clone())?, Verdict::Exact);
        Ok(())
    }

    #[test]
    fn test_close_values_are_similar() -> Result<()> {
        let a = Tensor::from_vec(&[3], vec![1.0f32, 2.0, 3.0])?;
        let b = Tensor::from_vec(&[3], vec![1.0f32, 2.0, 3.01])?;
        match Verifier::default().compare(&a, &b)? {
            Verdict::Similar { cosine } => assert!(cosine > 0.999),
            other => panic!("expected Similar, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_orthogonal_is_mismatch() -> Result<()> {
        let a = Tensor::from_vec(&[2], vec![1.0f32, 0.0])?;
        let b = Tensor::from_vec(&[2], vec![0.0f32, 1.0])?;
        let verdict = Verifier::default().compare(&a, &b)?;
        assert_eq!(verdict, Verdict::Mismatch { cosine: Some(0.0) });
        assert!(!verdict.is_pass());
        Ok(())
    }

    #[test]
    fn test_zero_norm_is_undefined() -> Result<()> {
        let zeros = Tensor::create(DataType::Float32, &[3])?;
        let ones = Tensor::from_vec(&[3], vec![1.0f32; 3])?;
        assert_eq!(
            Verifier::default().compare(&zeros, &ones)?,
            Verdict::Mismatch { cosine: None }
        );
        Ok(())
    }

    #[test]
    fn test_threshold_is_configurable() -> Result<()> {
        let a = Tensor::from_vec(&[2], vec![1.0f64, 0.0])?;
        let b = Tensor::from_vec(&[2], vec![1.0f64, 1.0])?;
        let cosine = cosine_similarity(&a, &b).unwrap();
        assert_relative_eq!(cosine, std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-12);

        let strict = Verifier::default();
        let loose = Verifier::new(VerifyConfig { cosine_threshold: 0.7 });
        assert!(!strict.compare(&a, &b)?.is_pass());
        assert!(loose.compare(&a, &b)?.is_pass());
        Ok(())
    }

    #[test]
    fn test_shape_checked_before_type() {
        let a = Tensor::create(DataType::Float32, &[4]).unwrap();
        let b = Tensor::create(DataType::Int32, &[2, 2]).unwrap();
        assert!(matches!(
            Verifier::default().compare(&a, &b),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_type_mismatch() {
        let a = Tensor::create(DataType::Float32, &[4]).unwrap();
        let b = Tensor::create(DataType::Int32, &[4]).unwrap();
        assert!(matches!(
            equivalent(&a, &b),
            Err(Error::TypeMismatch {
                expected: DataType::Float32,
                actual: DataType::Int32
            })
        ));
    }

    #[test]
    fn test_empty_is_exact() -> Result<()> {
        let a = Tensor::create(DataType::Float16, &[0, 5])?;
        assert_eq!(Verifier::default().compare(&a, &a.clone())?, Verdict::Exact);
        Ok(())
    }

    #[test]
    fn test_default_config() {
        assert_eq!(VerifyConfig::default().cosine_threshold, 0.99);
    }

    #[test]
    fn test_config_from_env() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var(COSINE_THRESHOLD_ENV, "0.95");
        assert_eq!(VerifyConfig::from_env().cosine_threshold, 0.95);

        for invalid in ["0", "1.5", "-0.2", "high"] {
            std::env::set_var(COSINE_THRESHOLD_ENV, invalid);
            assert_eq!(VerifyConfig::from_env(), VerifyConfig::default(), "{invalid}");
        }

        std::env::remove_var(COSINE_THRESHOLD_ENV);
        assert_eq!(VerifyConfig::from_env(), VerifyConfig::default());
    }
}
