//! Reference oracles shared by the integration tests

#![allow(dead_code)]

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::cell::Cell;
use uniform_core::ops::random::{generate, UniformParams};
use uniform_core::{DataType, Error, OracleOutput, ReferenceOracle, Result, Tensor};

pub fn init() {
    uniform_tracing::init_test_tracing();
}

/// Reference sharing the kernel's generator; outputs match byte for byte
pub struct SameGeneratorOracle;

impl ReferenceOracle for SameGeneratorOracle {
    fn random_uniform_like(
        &self,
        input: &Tensor<'_>,
        _rank_hint: usize,
        high: f32,
        low: f32,
        seed: f32,
    ) -> Result<OracleOutput> {
        let params = UniformParams::new(high.into(), low.into(), seed.into())?;
        let out = generate(input.datatype(), input.shape(), params)?;
        Ok(OracleOutput {
            buffer: out.as_bytes().to_vec(),
            shape: out.shape().to_vec(),
        })
    }
}

/// Single-precision reference over the same ChaCha stream
///
/// Keeps only the top 24 bits of each draw and scales in `f32`, so outputs
/// differ from the kernel's in the last bits of many elements.
pub struct SinglePrecisionOracle;

impl ReferenceOracle for SinglePrecisionOracle {
    fn random_uniform_like(
        &self,
        input: &Tensor<'_>,
        _rank_hint: usize,
        high: f32,
        low: f32,
        seed: f32,
    ) -> Result<OracleOutput> {
        if input.datatype() != DataType::Float32 {
            return Err(Error::Oracle(format!("no {} support", input.datatype())));
        }
        let mut rng = ChaCha8Rng::seed_from_u64(seed.trunc() as i64 as u64);
        let scale = 1.0f32 / (1u32 << 24) as f32;
        let values: Vec<f32> = (0..input.numel())
            .map(|_| {
                let unit = (rng.next_u64() >> 40) as f32 * scale;
                (low + (high - low) * unit).min(largest_below(high))
            })
            .collect();
        Ok(OracleOutput {
            buffer: bytemuck::cast_slice::<f32, u8>(&values).to_vec(),
            shape: input.shape().to_vec(),
        })
    }
}

fn largest_below(x: f32) -> f32 {
    if x > 0.0 {
        f32::from_bits(x.to_bits() - 1)
    } else if x == 0.0 {
        -f32::from_bits(1)
    } else {
        f32::from_bits(x.to_bits() + 1)
    }
}

/// Wraps another oracle and overwrites one `f32` element
pub struct CorruptingOracle<O> {
    pub inner: O,
    pub index: usize,
    pub value: f32,
}

impl<O: ReferenceOracle> ReferenceOracle for CorruptingOracle<O> {
    fn random_uniform_like(
        &self,
        input: &Tensor<'_>,
        rank_hint: usize,
        high: f32,
        low: f32,
        seed: f32,
    ) -> Result<OracleOutput> {
        let mut out = self.inner.random_uniform_like(input, rank_hint, high, low, seed)?;
        let start = self.index * std::mem::size_of::<f32>();
        out.buffer[start..start + 4].copy_from_slice(&self.value.to_ne_bytes());
        Ok(out)
    }
}

/// Returns a fixed output regardless of input
pub struct FixedOracle(pub OracleOutput);

impl ReferenceOracle for FixedOracle {
    fn random_uniform_like(&self, _: &Tensor<'_>, _: usize, _: f32, _: f32, _: f32) -> Result<OracleOutput> {
        Ok(self.0.clone())
    }
}

/// Records the rank hint it receives, then defers to [`SameGeneratorOracle`]
#[derive(Default)]
pub struct RecordingOracle {
    pub rank_hint: Cell<Option<usize>>,
}

impl ReferenceOracle for RecordingOracle {
    fn random_uniform_like(
        &self,
        input: &Tensor<'_>,
        rank_hint: usize,
        high: f32,
        low: f32,
        seed: f32,
    ) -> Result<OracleOutput> {
        self.rank_hint.set(Some(rank_hint));
        SameGeneratorOracle.random_uniform_like(input, rank_hint, high, low, seed)
    }
}
