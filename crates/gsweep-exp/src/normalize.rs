//! Normalization of program and estimator descriptors into uniform sequences.

use gsweep_core::errors::{ErrorInfo, SweepError};
use gsweep_core::Scalar;
use serde::{Deserialize, Serialize};

use crate::config::{EstimatorDescriptor, ParamSlot, ProgramDescriptor, SamplerSpec};
use crate::naming::clean_segment;

/// How the sweep points of a program are produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ParameterSpace {
    /// Cartesian product of one axis per parameter slot.
    Grid { axes: Vec<Vec<Scalar>> },
    /// A single batch drawn from a sampling function.
    Sampled { sampler: SamplerSpec },
}

/// Program descriptor with every field resolved to its run-time shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedProgram {
    pub key: String,
    pub name: String,
    pub clean_name: String,
    pub space: ParameterSpace,
    /// Index of the swept parameter slot.
    pub dim: usize,
    /// Width of every parameter vector (and of the gradient).
    pub dimensionality: usize,
    pub stddevs: Vec<Scalar>,
    pub seed: u64,
    pub nreps: u64,
}

/// Estimator descriptor with every hyperparameter resolved to a sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEstimator {
    pub key: String,
    pub name: String,
    /// Hyperparameter axes in declaration order.
    pub axes: Vec<(String, Vec<Scalar>)>,
}

fn config_error(code: &str, message: impl Into<String>, program: &str) -> SweepError {
    SweepError::Config(ErrorInfo::new(code, message).with_context("program", program))
}

/// Resolves a program descriptor, classifying its parameter slots.
///
/// The first swept slot determines `dim`; a sampled first slot delegates the
/// whole parameter space to the sampler. Multiple seeds or nreps are rejected.
pub fn normalize_program(
    key: &str,
    descriptor: &ProgramDescriptor,
) -> Result<NormalizedProgram, SweepError> {
    let name = descriptor.name.clone().unwrap_or_else(|| key.to_string());

    let seeds = descriptor.seed.to_vec();
    let nreps_values = descriptor.nreps.to_vec();
    if seeds.len() > 1 || nreps_values.len() > 1 {
        return Err(SweepError::Config(
            ErrorInfo::new(
                "multi-seed-nreps",
                "multiple seeds or nreps per program are not supported",
            )
            .with_context("program", &name)
            .with_context("seeds", seeds.len().to_string())
            .with_context("nreps", nreps_values.len().to_string())
            .with_hint("declare one program entry per seed/nreps value"),
        ));
    }
    let (Some(seed), Some(nreps)) = (seeds.first(), nreps_values.first()) else {
        return Err(config_error(
            "missing-seed-nreps",
            "program must declare one seed and one nreps value",
            &name,
        ));
    };
    let seed = whole_number("seed", seed, &name)?;
    let nreps = whole_number("nreps", nreps, &name)?;

    let stddevs = descriptor.stddevs.to_vec();
    if let Some(bad) = stddevs.iter().find(|value| !value.is_numeric()) {
        return Err(config_error(
            "non-numeric-stddev",
            format!("stddev `{bad}` is not numeric"),
            &name,
        ));
    }

    let (space, dim, dimensionality) = classify_params(&name, &descriptor.params)?;

    Ok(NormalizedProgram {
        key: key.to_string(),
        clean_name: clean_segment(&name),
        name,
        space,
        dim,
        dimensionality,
        stddevs,
        seed,
        nreps,
    })
}

fn whole_number(field: &str, value: &Scalar, program: &str) -> Result<u64, SweepError> {
    let whole = match value {
        Scalar::Int(value) => u64::try_from(*value).ok(),
        Scalar::Float(value)
            if value.fract() == 0.0 && *value >= 0.0 && *value < u64::MAX as f64 =>
        {
            Some(*value as u64)
        }
        _ => None,
    };
    whole.ok_or_else(|| {
        SweepError::Config(
            ErrorInfo::new(
                "non-integral-seed-nreps",
                format!("{field} must be a non-negative integer"),
            )
            .with_context("program", program)
            .with_context("value", value.to_string()),
        )
    })
}

fn classify_params(
    program: &str,
    params: &[ParamSlot],
) -> Result<(ParameterSpace, usize, usize), SweepError> {
    if let Some(ParamSlot::Sampled(sampler)) = params.first() {
        if params.len() > 1 {
            tracing::warn!(
                program,
                ignored = params.len() - 1,
                "sampler supplies the full parameter vector; remaining slots ignored"
            );
        }
        if sampler.dimensionality() == 0 {
            return Err(config_error(
                "sampler-dimensionality",
                "sampler must declare at least one bound",
                program,
            ));
        }
        let space = ParameterSpace::Sampled {
            sampler: sampler.clone(),
        };
        return Ok((space, 0, sampler.dimensionality()));
    }

    let mut dim = None;
    let mut axes = Vec::with_capacity(params.len());
    for (idx, slot) in params.iter().enumerate() {
        let axis = match slot {
            ParamSlot::Fixed(value) => vec![value.clone()],
            ParamSlot::Swept(values) => {
                match dim {
                    None => dim = Some(idx),
                    Some(first) => tracing::warn!(
                        program,
                        first,
                        extra = idx,
                        "more than one swept parameter; sweeping the full grid"
                    ),
                }
                values.clone()
            }
            ParamSlot::Sampled(_) => {
                return Err(config_error(
                    "sampler-position",
                    format!("sampler found in parameter slot {idx}; only slot 0 may sample"),
                    program,
                ));
            }
        };
        if let Some(bad) = axis.iter().find(|value| !value.is_numeric()) {
            return Err(config_error(
                "non-numeric-param",
                format!("parameter slot {idx} holds non-numeric value `{bad}`"),
                program,
            ));
        }
        axes.push(axis);
    }
    let dimensionality = axes.len();
    Ok((ParameterSpace::Grid { axes }, dim.unwrap_or(0), dimensionality))
}

/// Resolves an estimator descriptor into ordered hyperparameter axes.
pub fn normalize_estimator(key: &str, descriptor: &EstimatorDescriptor) -> NormalizedEstimator {
    NormalizedEstimator {
        key: key.to_string(),
        name: descriptor.name.clone().unwrap_or_else(|| key.to_string()),
        axes: descriptor
            .params
            .iter()
            .map(|(name, values)| (name.clone(), values.to_vec()))
            .collect(),
    }
}
