use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::fs;
use std::path::{Path, PathBuf};

use gsweep_core::errors::{ErrorInfo, SweepError};
use gsweep_core::Scalar;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// File name looked up when the experiment path is a directory.
pub const EXPERIMENT_FILE: &str = "experiment.yaml";

/// Field that may be written either as a single value or as a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T: Clone> OneOrMany<T> {
    /// Normalizes the field into a sequence; a single value becomes a singleton.
    pub fn to_vec(&self) -> Vec<T> {
        match self {
            OneOrMany::One(value) => vec![value.clone()],
            OneOrMany::Many(values) => values.clone(),
        }
    }
}

/// Evenly spaced sweep values, both endpoints included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Linspace {
    pub start: f64,
    pub stop: f64,
    pub num: usize,
}

impl Linspace {
    pub fn values(&self) -> Vec<Scalar> {
        match self.num {
            0 => Vec::new(),
            1 => vec![Scalar::Float(self.start)],
            num => {
                let step = (self.stop - self.start) / (num - 1) as f64;
                (0..num)
                    .map(|idx| {
                        if idx == num - 1 {
                            Scalar::Float(self.stop)
                        } else {
                            Scalar::Float(self.start + step * idx as f64)
                        }
                    })
                    .collect()
            }
        }
    }
}

/// Reference to a sampling function producing whole parameter vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerSpec {
    /// Name resolved in the [`SamplerRegistry`](crate::SamplerRegistry).
    pub name: String,
    /// Number of parameter vectors in the batch.
    pub samples: usize,
    /// Inclusive `[low, high]` range per dimension.
    pub bounds: Vec<[f64; 2]>,
    /// Number of leading points of a low-discrepancy sequence to drop.
    #[serde(default)]
    pub skip: usize,
}

impl SamplerSpec {
    /// Length of every vector the sampler must produce.
    pub fn dimensionality(&self) -> usize {
        self.bounds.len()
    }
}

/// One entry of a program's `params` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSlot", into = "RawSlot")]
pub enum ParamSlot {
    /// Held constant at a single value.
    Fixed(Scalar),
    /// Varied across the listed values.
    Swept(Vec<Scalar>),
    /// The whole parameter vector comes from a sampling function.
    Sampled(SamplerSpec),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawSlot {
    Scalar(Scalar),
    List(Vec<Scalar>),
    Linspace { linspace: Linspace },
    Sampler { sampler: SamplerSpec },
}

impl TryFrom<RawSlot> for ParamSlot {
    type Error = String;

    fn try_from(raw: RawSlot) -> Result<Self, Self::Error> {
        match raw {
            RawSlot::Scalar(value) => Ok(ParamSlot::Fixed(value)),
            RawSlot::List(values) => Ok(ParamSlot::Swept(values)),
            RawSlot::Linspace { linspace } => {
                if linspace.num == 0 {
                    return Err("linspace requires num >= 1".to_string());
                }
                Ok(ParamSlot::Swept(linspace.values()))
            }
            RawSlot::Sampler { sampler } => Ok(ParamSlot::Sampled(sampler)),
        }
    }
}

impl From<ParamSlot> for RawSlot {
    fn from(slot: ParamSlot) -> Self {
        match slot {
            ParamSlot::Fixed(value) => RawSlot::Scalar(value),
            ParamSlot::Swept(values) => RawSlot::List(values),
            ParamSlot::Sampled(sampler) => RawSlot::Sampler { sampler },
        }
    }
}

/// Declarative description of a parameterized program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramDescriptor {
    /// Name passed to the estimator; defaults to the mapping key.
    #[serde(default)]
    pub name: Option<String>,
    pub params: Vec<ParamSlot>,
    pub stddevs: OneOrMany<Scalar>,
    /// Integral; `1` and `1.0` are both accepted.
    pub seed: OneOrMany<Scalar>,
    pub nreps: OneOrMany<Scalar>,
}

/// Declarative description of an estimator and its hyperparameter grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatorDescriptor {
    /// Registry name of the estimator; defaults to the mapping key.
    #[serde(default)]
    pub name: Option<String>,
    /// Hyperparameters in declaration order.
    #[serde(default)]
    pub params: IndexMap<String, OneOrMany<Scalar>>,
}

/// External command implementing the estimator contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendSpec {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// Experiment document: programs, estimators and optional command backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub programs: IndexMap<String, ProgramDescriptor>,
    pub estimators: IndexMap<String, EstimatorDescriptor>,
    #[serde(default)]
    pub backends: IndexMap<String, BackendSpec>,
}

/// Resolves the experiment document for a directory or a direct file path.
pub fn experiment_file_path(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(EXPERIMENT_FILE)
    } else {
        path.to_path_buf()
    }
}

/// Parses a YAML document, or any fragment of one, into `T`.
pub fn from_yaml_slice<T: DeserializeOwned>(data: &[u8]) -> Result<T, SweepError> {
    serde_yaml::from_slice(data)
        .map_err(|err| SweepError::Serde(ErrorInfo::new("yaml-deserialize", err.to_string())))
}

/// Loads and parses an experiment document.
pub fn load_experiment(path: &Path) -> Result<Experiment, SweepError> {
    let file = experiment_file_path(path);
    let bytes = fs::read(&file).map_err(|err| {
        SweepError::Io(
            ErrorInfo::new("experiment-read", "failed to read experiment file")
                .with_context("path", file.display().to_string())
                .with_hint(err.to_string()),
        )
    })?;
    from_yaml_slice(&bytes).map_err(|err| match err {
        SweepError::Serde(info) => {
            SweepError::Config(info.with_context("path", file.display().to_string()))
        }
        other => other,
    })
}

/// Scheduling policy for the (program, estimator) units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// One unit at a time on the calling thread, in declaration order.
    Sequential,
    /// All units concurrently on a worker pool.
    #[default]
    Parallel,
}

/// Settings for one sweep invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "RunConfig::default_out_dir")]
    pub out_dir: PathBuf,
    /// Replications per run unit, each written to its own file.
    #[serde(default = "RunConfig::default_replications")]
    pub replications: usize,
    #[serde(default)]
    pub mode: ExecutionMode,
    /// Upper bound on concurrently running units; `None` runs every unit at once.
    #[serde(default)]
    pub max_jobs: Option<usize>,
}

impl RunConfig {
    fn default_out_dir() -> PathBuf {
        PathBuf::from("results")
    }

    const fn default_replications() -> usize {
        1
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            out_dir: Self::default_out_dir(),
            replications: Self::default_replications(),
            mode: ExecutionMode::default(),
            max_jobs: None,
        }
    }
}
