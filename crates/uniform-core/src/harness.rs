//! Per-case comparison of `uniform_like` against a reference oracle
//!
//! [`run_case`] builds the input and parameter tensors for one
//! [`UniformLikeCase`], runs both the kernel and the oracle, and hands the two
//! outputs to the [`Verifier`]. [`run_cases`] drives many cases, keeping each
//! case's failure to itself.
//!
//! Cases deserialize from any serde source; the parameter names used by
//! existing case files (`lhs_type`, `l_shape`, `shape`, `value1`..`value3`)
//! are accepted as aliases.

use crate::dtype::DataType;
use crate::error::{Error, Result};
use crate::ops::{memory, random};
use crate::oracle::ReferenceOracle;
use crate::tensor::Tensor;
use crate::verify::{Verdict, Verifier};
use serde::Deserialize;

/// Rank hint passed to the reference call
const ORACLE_RANK_HINT: usize = 1;

/// One parameter combination
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UniformLikeCase {
    /// Element type of the input and the output; parameters are always float32
    #[serde(alias = "lhs_type")]
    pub datatype: DataType,
    /// Shape of the input (and therefore the output)
    #[serde(alias = "l_shape")]
    pub input_shape: Vec<usize>,
    /// Shape of each parameter tensor; must hold one element
    #[serde(alias = "shape")]
    pub param_shape: Vec<usize>,
    #[serde(alias = "value1")]
    pub high: f32,
    #[serde(alias = "value2")]
    pub low: f32,
    #[serde(alias = "value3")]
    pub seed: f32,
}

impl UniformLikeCase {
    /// Case with a `[1]` parameter shape
    pub fn new(datatype: DataType, input_shape: &[usize], high: f32, low: f32, seed: f32) -> Self {
        Self {
            datatype,
            input_shape: input_shape.to_vec(),
            param_shape: vec![1],
            high,
            low,
            seed,
        }
    }
}

/// Outcome of one case
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaseReport {
    pub passed: bool,
    pub verdict: Verdict,
}

/// Run one case with the default verifier
pub fn run_case<O: ReferenceOracle>(case: &UniformLikeCase, oracle: &O) -> Result<CaseReport> {
    run_case_with(case, oracle, &Verifier::default())
}

/// Run one case
///
/// # Errors
///
/// Any construction, kernel or oracle error, and shape or type disagreements
/// between the two outputs. A failed comparison is not an error: it is
/// reported with `passed == false` and logged with both tensors.
#[tracing::instrument(skip(oracle, verifier), fields(dtype = %case.datatype, shape = ?case.input_shape))]
pub fn run_case_with<O: ReferenceOracle>(
    case: &UniformLikeCase,
    oracle: &O,
    verifier: &Verifier,
) -> Result<CaseReport> {
    let mut input = Tensor::create(case.datatype, &case.input_shape)?;
    memory::fill_with_test_pattern(&mut input)?;

    // Parameters stay float32 whatever the case type, matching the values the oracle receives
    let mut high_raw = [0u8; 4];
    let mut low_raw = [0u8; 4];
    let mut seed_raw = [0u8; 4];
    let high = scalar_param(case, case.high, &mut high_raw)?;
    let low = scalar_param(case, case.low, &mut low_raw)?;
    let seed = scalar_param(case, case.seed, &mut seed_raw)?;

    let reference = oracle.random_uniform_like(&input, ORACLE_RANK_HINT, case.high, case.low, case.seed)?;
    let expected = Tensor::from_buffer(input.datatype(), &reference.shape, &reference.buffer, true)?;

    let actual = random::uniform_like(input.datatype(), &input, &high, &low, &seed)?;

    let verdict = verifier.compare(&expected, &actual)?;
    let passed = verdict.is_pass();
    if !passed {
        verifier.report_mismatch(&expected, &actual, &verdict);
    }
    Ok(CaseReport { passed, verdict })
}

/// Run every case, isolating failures
///
/// Errors from one case are logged and returned in its slot; the remaining
/// cases still run.
pub fn run_cases<O: ReferenceOracle>(cases: &[UniformLikeCase], oracle: &O) -> Vec<Result<CaseReport>> {
    let verifier = Verifier::default();
    cases
        .iter()
        .enumerate()
        .map(|(index, case)| {
            let result = run_case_with(case, oracle, &verifier);
            if let Err(err) = &result {
                tracing::warn!(index, error = %err, category = ?err.category(), "case failed");
            }
            result
        })
        .collect()
}

/// Float32 parameter tensor of `case.param_shape` aliasing `raw`
fn scalar_param<'a>(case: &UniformLikeCase, value: f32, raw: &'a mut [u8; 4]) -> Result<Tensor<'a>> {
    let bytes: &'a [u8] = DataType::Float32.write_scalar(f64::from(value), raw)?;
    Tensor::from_buffer(DataType::Float32, &case.param_shape, bytes, false).map_err(|err| match err {
        Error::BufferSizeMismatch { .. } => Error::ParameterNotScalar {
            param: "param_shape",
            numel: case.param_shape.iter().product(),
        },
        other => other,
    })
}
