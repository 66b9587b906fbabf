//! Fan-out of (program, estimator) units onto isolated workers.

use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;

use gsweep_core::errors::{ErrorInfo, SweepError};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{ExecutionMode, Experiment, RunConfig};
use crate::estimator::EstimatorRegistry;
use crate::executor::{execute_unit, plan_unit, ExecutionContext, FileReport, UnitSpec};
use crate::sampler::SamplerRegistry;

/// Terminal state of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    Completed,
    Failed,
    Panicked,
}

/// Outcome of one (program, estimator) unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitReport {
    pub program: String,
    pub estimator: String,
    pub status: UnitStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub files: Vec<FileReport>,
}

/// File names a unit would write, or the reason it would not run.
#[derive(Debug)]
pub struct PlannedUnit {
    pub program: String,
    pub estimator: String,
    pub files: Result<Vec<PathBuf>, SweepError>,
}

/// Program-major cross product of the experiment's programs and estimators.
pub fn enumerate_units(experiment: &Experiment) -> Vec<UnitSpec> {
    let mut units = Vec::with_capacity(experiment.programs.len() * experiment.estimators.len());
    for (program_key, program) in &experiment.programs {
        for (estimator_key, estimator) in &experiment.estimators {
            units.push(UnitSpec {
                index: units.len(),
                program_key: program_key.clone(),
                program: program.clone(),
                estimator_key: estimator_key.clone(),
                estimator: estimator.clone(),
            });
        }
    }
    units
}

/// Lists every file the sweep would produce without running estimators.
pub fn plan_sweep(experiment: &Experiment, config: &RunConfig) -> Vec<PlannedUnit> {
    enumerate_units(experiment)
        .iter()
        .map(|unit| PlannedUnit {
            program: unit.program_key.clone(),
            estimator: unit.estimator_key.clone(),
            files: plan_unit(unit, config)
                .map(|plan| plan.files.into_iter().map(|file| file.path).collect()),
        })
        .collect()
}

/// Runs every unit of the experiment and returns their outcomes in unit order.
///
/// A unit that fails or panics is logged and reported; it never affects its
/// siblings and is not re-raised. Only setup failures return `Err`.
pub fn run_sweep(
    experiment: &Experiment,
    estimators: &EstimatorRegistry,
    samplers: &SamplerRegistry,
    config: &RunConfig,
) -> Result<Vec<UnitReport>, SweepError> {
    fs::create_dir_all(&config.out_dir).map_err(|err| {
        SweepError::Io(
            ErrorInfo::new("out-dir", "failed to create output directory")
                .with_context("path", config.out_dir.display().to_string())
                .with_hint(err.to_string()),
        )
    })?;
    let units = enumerate_units(experiment);
    let ctx = ExecutionContext {
        estimators,
        samplers,
        config,
    };
    tracing::info!(units = units.len(), mode = ?config.mode, "sweep scheduled");

    match config.mode {
        ExecutionMode::Sequential => Ok(units.iter().map(|unit| run_isolated(unit, &ctx)).collect()),
        ExecutionMode::Parallel => {
            let threads = config.max_jobs.unwrap_or(units.len()).max(1);
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .thread_name(|idx| format!("gsweep-unit-{idx}"))
                .build()
                .map_err(|err| {
                    SweepError::Io(ErrorInfo::new("thread-pool", "failed to build worker pool")
                        .with_hint(err.to_string()))
                })?;
            Ok(pool.install(|| {
                units
                    .par_iter()
                    .map(|unit| run_isolated(unit, &ctx))
                    .collect()
            }))
        }
    }
}

fn run_isolated(unit: &UnitSpec, ctx: &ExecutionContext<'_>) -> UnitReport {
    let mut files = Vec::new();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| execute_unit(unit, ctx, &mut files)));
    let (status, error) = match outcome {
        Ok(Ok(())) => (UnitStatus::Completed, None),
        Ok(Err(err)) => {
            tracing::error!(
                program = %unit.program_key,
                estimator = %unit.estimator_key,
                code = err.code(),
                "{err}"
            );
            (UnitStatus::Failed, Some(err.to_string()))
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(
                program = %unit.program_key,
                estimator = %unit.estimator_key,
                "unit panicked: {message}"
            );
            (UnitStatus::Panicked, Some(message))
        }
    };
    UnitReport {
        program: unit.program_key.clone(),
        estimator: unit.estimator_key.clone(),
        status,
        error,
        files,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
