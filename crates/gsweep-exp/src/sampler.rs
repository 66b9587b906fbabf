//! Sampling functions that produce whole batches of parameter vectors.

use std::collections::BTreeMap;
use std::sync::Arc;

use gsweep_core::errors::{ErrorInfo, SweepError};
use gsweep_core::RngHandle;
use rand::{seq::SliceRandom, Rng};

use crate::config::SamplerSpec;

/// Produces a batch of parameter vectors for a program.
pub trait Sampler: Send + Sync {
    /// Draws `spec.samples` vectors of width `spec.dimensionality()`.
    fn sample(&self, spec: &SamplerSpec, rng: &mut RngHandle) -> Result<Vec<Vec<f64>>, SweepError>;
}

/// Name-indexed collection of samplers.
#[derive(Clone, Default)]
pub struct SamplerRegistry {
    samplers: BTreeMap<String, Arc<dyn Sampler>>,
}

impl SamplerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `uniform`, `lhs` and `halton`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("uniform", UniformSampler);
        registry.register("lhs", LatinHypercubeSampler);
        registry.register("halton", HaltonSampler);
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, sampler: impl Sampler + 'static) {
        self.samplers.insert(name.into(), Arc::new(sampler));
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Sampler>, SweepError> {
        self.samplers.get(name).cloned().ok_or_else(|| {
            SweepError::Sampler(
                ErrorInfo::new("unknown-sampler", "no sampler registered under this name")
                    .with_context("sampler", name)
                    .with_hint(format!(
                        "known samplers: {}",
                        self.samplers.keys().cloned().collect::<Vec<_>>().join(", ")
                    )),
            )
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.samplers.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for SamplerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SamplerRegistry")
            .field("samplers", &self.samplers.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn check_bounds(spec: &SamplerSpec) -> Result<(), SweepError> {
    for (idx, [low, high]) in spec.bounds.iter().enumerate() {
        if !(low.is_finite() && high.is_finite()) || low > high {
            return Err(SweepError::Sampler(
                ErrorInfo::new("sampler-bounds", "bounds must be finite with low <= high")
                    .with_context("sampler", &spec.name)
                    .with_context("dimension", idx.to_string()),
            ));
        }
    }
    Ok(())
}

fn scale(unit: f64, [low, high]: [f64; 2]) -> f64 {
    low + unit * (high - low)
}

/// Independent uniform draws inside the bounds.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformSampler;

impl Sampler for UniformSampler {
    fn sample(&self, spec: &SamplerSpec, rng: &mut RngHandle) -> Result<Vec<Vec<f64>>, SweepError> {
        check_bounds(spec)?;
        Ok((0..spec.samples)
            .map(|_| {
                spec.bounds
                    .iter()
                    .map(|bound| scale(rng.gen::<f64>(), *bound))
                    .collect()
            })
            .collect())
    }
}

/// Latin hypercube: one point per stratum in every dimension.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatinHypercubeSampler;

impl Sampler for LatinHypercubeSampler {
    fn sample(&self, spec: &SamplerSpec, rng: &mut RngHandle) -> Result<Vec<Vec<f64>>, SweepError> {
        check_bounds(spec)?;
        let samples = spec.samples;
        let mut outputs = vec![Vec::with_capacity(spec.dimensionality()); samples];
        let mut strata: Vec<usize> = (0..samples).collect();
        for bound in &spec.bounds {
            strata.shuffle(rng);
            for (row, stratum) in strata.iter().enumerate() {
                let unit = (*stratum as f64 + rng.gen::<f64>()) / samples as f64;
                outputs[row].push(scale(unit, *bound));
            }
        }
        Ok(outputs)
    }
}

/// Halton low-discrepancy sequence using the first primes as bases.
///
/// The sequence is deterministic; the RNG is not consumed.
#[derive(Debug, Clone, Copy, Default)]
pub struct HaltonSampler;

impl Sampler for HaltonSampler {
    fn sample(&self, spec: &SamplerSpec, _rng: &mut RngHandle) -> Result<Vec<Vec<f64>>, SweepError> {
        check_bounds(spec)?;
        let bases = first_primes(spec.dimensionality());
        Ok((0..spec.samples)
            .map(|idx| {
                // index 0 maps to the origin in every base, so start at 1
                let index = (idx + spec.skip + 1) as u64;
                bases
                    .iter()
                    .zip(&spec.bounds)
                    .map(|(base, bound)| scale(radical_inverse(index, *base), *bound))
                    .collect()
            })
            .collect())
    }
}

/// Van der Corput radical inverse of `index` in `base`.
pub fn radical_inverse(mut index: u64, base: u64) -> f64 {
    let inv_base = 1.0 / base as f64;
    let mut factor = inv_base;
    let mut value = 0.0;
    while index > 0 {
        value += (index % base) as f64 * factor;
        index /= base;
        factor *= inv_base;
    }
    value
}

fn first_primes(count: usize) -> Vec<u64> {
    let mut primes: Vec<u64> = Vec::with_capacity(count);
    let mut candidate = 2u64;
    while primes.len() < count {
        if primes
            .iter()
            .take_while(|p| *p * *p <= candidate)
            .all(|p| candidate % p != 0)
        {
            primes.push(candidate);
        }
        candidate += 1;
    }
    primes
}
