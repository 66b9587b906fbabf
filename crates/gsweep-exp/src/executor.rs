//! Execution of one (program, estimator) unit into incrementally written files.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

use csv::{Writer, WriterBuilder};
use gsweep_core::errors::{ErrorInfo, SweepError};
use gsweep_core::{format_float, replication_seed, RngHandle, Scalar};
use serde::{Deserialize, Serialize};

use crate::canonical::stable_seed;
use crate::config::{EstimatorDescriptor, ProgramDescriptor, RunConfig};
use crate::enumerate::{hyperparameter_combinations, point_vector, sweep_points, HyperCombination};
use crate::estimator::{EstimateRequest, Estimator, EstimatorRegistry};
use crate::naming::{header, RunFileKey};
use crate::normalize::{normalize_estimator, normalize_program, NormalizedEstimator, NormalizedProgram};
use crate::sampler::SamplerRegistry;

/// One (program, estimator) pair scheduled by the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitSpec {
    pub index: usize,
    pub program_key: String,
    pub program: ProgramDescriptor,
    pub estimator_key: String,
    pub estimator: EstimatorDescriptor,
}

/// A result file to be produced, fully resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct RunFile {
    pub key: RunFileKey,
    pub path: PathBuf,
    pub combination: HyperCombination,
    pub stddev: f64,
    pub rng_seed: u64,
}

/// Normalized unit together with every file it will write, in write order.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitPlan {
    pub program: NormalizedProgram,
    pub estimator: NormalizedEstimator,
    pub files: Vec<RunFile>,
}

/// Outcome of one completed result file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReport {
    pub path: String,
    pub rng_seed: u64,
    pub rows: usize,
    pub wall_secs: f64,
    /// Sum of estimator-reported times, in microseconds.
    pub cumulative_time: f64,
    #[serde(default)]
    pub num_paths: Option<u64>,
}

/// Shared, read-only collaborators of every unit.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionContext<'a> {
    pub estimators: &'a EstimatorRegistry,
    pub samplers: &'a SamplerRegistry,
    pub config: &'a RunConfig,
}

/// Validates a unit and lists its result files without touching the disk.
///
/// Every input-validation failure surfaces here, before any file is created.
pub fn plan_unit(unit: &UnitSpec, config: &RunConfig) -> Result<UnitPlan, SweepError> {
    let program = normalize_program(&unit.program_key, &unit.program)?;
    let estimator = normalize_estimator(&unit.estimator_key, &unit.estimator);
    let combinations = hyperparameter_combinations(&estimator.axes);

    if program.nreps != 1 && combinations.iter().any(HyperCombination::requests_num_paths) {
        return Err(SweepError::Invariant(
            ErrorInfo::new(
                "num-paths-nreps",
                "path-count reporting requires nreps == 1",
            )
            .with_context("program", &program.name)
            .with_context("estimator", &estimator.name)
            .with_context("nreps", program.nreps.to_string()),
        ));
    }

    let mut files = Vec::new();
    for combination in combinations {
        let rendered = combination.render();
        let combination_seed = stable_seed(&(&program.name, &estimator.name, &rendered))?;
        for replication in 0..config.replications {
            let rng_seed = replication_seed(combination_seed, replication);
            for stddev in &program.stddevs {
                let key = RunFileKey {
                    program: program.clean_name.clone(),
                    stddev: stddev.clone(),
                    seed: program.seed,
                    nreps: program.nreps,
                    estimator: estimator.name.clone(),
                    hyperparameters: rendered.clone(),
                    dim: program.dim,
                    replication,
                };
                files.push(RunFile {
                    path: key.path_in(&config.out_dir),
                    key,
                    combination: combination.clone(),
                    stddev: stddev.as_f64().unwrap_or_default(),
                    rng_seed,
                });
            }
        }
    }

    Ok(UnitPlan {
        program,
        estimator,
        files,
    })
}

/// Runs every file of a unit, pushing a report after each completed file.
///
/// Reports of files completed before a failure stay in `reports`.
pub fn execute_unit(
    unit: &UnitSpec,
    ctx: &ExecutionContext<'_>,
    reports: &mut Vec<FileReport>,
) -> Result<(), SweepError> {
    let plan = plan_unit(unit, ctx.config)?;
    let estimator = ctx.estimators.get(&plan.estimator.name)?;
    for file in &plan.files {
        let report = run_file(&plan.program, file, estimator.as_ref(), ctx.samplers)
            .map_err(|err| err.with_context("file", file.path.display().to_string()))?;
        reports.push(report);
    }
    Ok(())
}

fn run_file(
    program: &NormalizedProgram,
    file: &RunFile,
    estimator: &dyn Estimator,
    samplers: &SamplerRegistry,
) -> Result<FileReport, SweepError> {
    let mut rng = RngHandle::from_seed(file.rng_seed);
    let points = sweep_points(&program.space, program.dimensionality, samplers, &mut rng)?;
    let vectors = points
        .iter()
        .map(|point| point_vector(point))
        .collect::<Result<Vec<_>, _>>()?;
    let wants_paths = file.combination.requests_num_paths();

    tracing::info!(file = %file.path.display(), points = points.len(), "started");
    let started = Instant::now();
    let mut writer = ResultWriter::create(&file.path, program.dimensionality)?;
    let mut cumulative_time = 0.0;
    let mut num_paths = None;

    for (point, vector) in points.iter().zip(&vectors) {
        let request = EstimateRequest {
            program: &program.name,
            stddev: file.stddev,
            seed: program.seed,
            nreps: program.nreps,
            params: vector,
            hyperparameters: &file.combination,
        };
        let estimate = estimator.estimate(&request)?;
        if estimate.gradient.len() != program.dimensionality {
            return Err(SweepError::Estimator(
                ErrorInfo::new("gradient-width", "gradient length differs from dimensionality")
                    .with_context("expected", program.dimensionality.to_string())
                    .with_context("actual", estimate.gradient.len().to_string()),
            ));
        }
        if !(estimate.elapsed.is_finite() && estimate.elapsed >= 0.0) {
            return Err(SweepError::Estimator(
                ErrorInfo::new("invalid-elapsed", "estimation time must be finite and non-negative")
                    .with_context("elapsed", estimate.elapsed.to_string()),
            ));
        }
        if wants_paths {
            num_paths = Some(estimate.num_paths.ok_or_else(|| {
                SweepError::Estimator(ErrorInfo::new(
                    "missing-num-paths",
                    "estimator did not report num_paths although return_num_paths is set",
                ))
            })?);
        }
        cumulative_time += estimate.elapsed;
        writer.write_row(point, estimate.output, &estimate.gradient, cumulative_time)?;
    }

    let wall_secs = started.elapsed().as_secs_f64();
    tracing::info!(
        file = %file.path.display(),
        wall_secs = %format!("{wall_secs:.2}"),
        estimation_secs = %format!("{:.6}", cumulative_time * 1e-6),
        num_paths = ?num_paths,
        "finished"
    );
    Ok(FileReport {
        path: file.path.display().to_string(),
        rng_seed: file.rng_seed,
        rows: writer.rows(),
        wall_secs,
        cumulative_time,
        num_paths,
    })
}

fn io_error(code: &str, path: &Path, err: impl ToString) -> SweepError {
    SweepError::Io(
        ErrorInfo::new(code, "result file I/O failed")
            .with_context("path", path.display().to_string())
            .with_hint(err.to_string()),
    )
}

/// CSV writer that flushes after the header and after every row.
///
/// A crash loses at most the row being estimated; what is on disk is always a
/// header followed by complete rows.
pub struct ResultWriter {
    path: PathBuf,
    writer: Writer<File>,
    width: usize,
    rows: usize,
}

impl ResultWriter {
    /// Creates (truncating) the file and writes the header.
    pub fn create(path: &Path, dimensionality: usize) -> Result<Self, SweepError> {
        let writer = WriterBuilder::new()
            .has_headers(false)
            .from_path(path)
            .map_err(|err| io_error("result-open", path, err))?;
        let mut result = Self {
            path: path.to_path_buf(),
            writer,
            width: dimensionality,
            rows: 0,
        };
        result.write_record(&header(dimensionality))?;
        Ok(result)
    }

    pub fn write_row(
        &mut self,
        point: &[Scalar],
        output: f64,
        gradient: &[f64],
        cumulative_time: f64,
    ) -> Result<(), SweepError> {
        if point.len() != self.width || gradient.len() != self.width {
            return Err(SweepError::Invariant(
                ErrorInfo::new("row-width", "row does not match header width")
                    .with_context("path", self.path.display().to_string())
                    .with_context("width", self.width.to_string()),
            ));
        }
        let mut record = Vec::with_capacity(2 * self.width + 2);
        record.extend(point.iter().map(Scalar::to_string));
        record.push(format_float(output));
        record.extend(gradient.iter().map(|value| format_float(*value)));
        record.push(format_float(cumulative_time));
        self.write_record(&record)?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    fn write_record(&mut self, record: &[String]) -> Result<(), SweepError> {
        self.writer
            .write_record(record)
            .map_err(|err| io_error("result-write", &self.path, err))?;
        self.writer
            .flush()
            .map_err(|err| io_error("result-flush", &self.path, err))
    }
}
