//! Deterministic enumeration of hyperparameter combinations and sweep points.

use gsweep_core::errors::{ErrorInfo, SweepError};
use gsweep_core::{RngHandle, Scalar};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::normalize::ParameterSpace;
use crate::sampler::SamplerRegistry;

/// Hyperparameter key that makes estimators report their path count.
pub const RETURN_NUM_PATHS: &str = "return_num_paths";

/// One hyperparameter assignment, keys in declaration order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HyperCombination(IndexMap<String, Scalar>);

impl HyperCombination {
    pub fn new(values: IndexMap<String, Scalar>) -> Self {
        Self(values)
    }

    pub fn get(&self, key: &str) -> Option<&Scalar> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Scalar)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Presence of the key is what counts, not its value.
    pub fn requests_num_paths(&self) -> bool {
        self.0.contains_key(RETURN_NUM_PATHS)
    }

    /// Renders `k1=v1-k2=v2` in declaration order.
    pub fn render(&self) -> String {
        self.0
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("-")
    }
}

/// Cartesian product of the hyperparameter axes, first axis varying slowest.
///
/// No axes yield a single empty combination.
pub fn hyperparameter_combinations(axes: &[(String, Vec<Scalar>)]) -> Vec<HyperCombination> {
    let mut outputs = Vec::new();
    expand_hyper(axes, 0, IndexMap::new(), &mut outputs);
    outputs
}

fn expand_hyper(
    axes: &[(String, Vec<Scalar>)],
    idx: usize,
    current: IndexMap<String, Scalar>,
    outputs: &mut Vec<HyperCombination>,
) {
    if idx == axes.len() {
        outputs.push(HyperCombination(current));
        return;
    }
    let (name, values) = &axes[idx];
    for value in values {
        let mut next = current.clone();
        next.insert(name.clone(), value.clone());
        expand_hyper(axes, idx + 1, next, outputs);
    }
}

/// Cartesian product of per-slot axes, first slot varying slowest.
pub fn grid_points(axes: &[Vec<Scalar>]) -> Vec<Vec<Scalar>> {
    let mut outputs = Vec::new();
    expand_grid(axes, 0, Vec::with_capacity(axes.len()), &mut outputs);
    outputs
}

fn expand_grid(
    axes: &[Vec<Scalar>],
    idx: usize,
    current: Vec<Scalar>,
    outputs: &mut Vec<Vec<Scalar>>,
) {
    if idx == axes.len() {
        outputs.push(current);
        return;
    }
    for value in &axes[idx] {
        let mut next = current.clone();
        next.push(value.clone());
        expand_grid(axes, idx + 1, next, outputs);
    }
}

/// Produces the sweep points of a parameter space.
///
/// Sampled batches are validated against `dimensionality` so that every row
/// matches the header written before the first point.
pub fn sweep_points(
    space: &ParameterSpace,
    dimensionality: usize,
    samplers: &SamplerRegistry,
    rng: &mut RngHandle,
) -> Result<Vec<Vec<Scalar>>, SweepError> {
    match space {
        ParameterSpace::Grid { axes } => Ok(grid_points(axes)),
        ParameterSpace::Sampled { sampler } => {
            let batch = samplers.get(&sampler.name)?.sample(sampler, rng)?;
            batch
                .into_iter()
                .enumerate()
                .map(|(idx, vector)| {
                    if vector.len() != dimensionality {
                        return Err(SweepError::Sampler(
                            ErrorInfo::new(
                                "sampler-width",
                                "sampled vector width differs from declared dimensionality",
                            )
                            .with_context("sampler", &sampler.name)
                            .with_context("index", idx.to_string())
                            .with_context("expected", dimensionality.to_string())
                            .with_context("actual", vector.len().to_string()),
                        ));
                    }
                    Ok(vector.into_iter().map(Scalar::Float).collect())
                })
                .collect()
        }
    }
}

/// Converts a sweep point into the numeric vector handed to estimators.
pub fn point_vector(point: &[Scalar]) -> Result<Vec<f64>, SweepError> {
    point
        .iter()
        .enumerate()
        .map(|(idx, value)| {
            value.as_f64().ok_or_else(|| {
                SweepError::Config(
                    ErrorInfo::new("non-numeric-param", "sweep point holds a non-numeric value")
                        .with_context("index", idx.to_string())
                        .with_context("value", value.to_string()),
                )
            })
        })
        .collect()
}
