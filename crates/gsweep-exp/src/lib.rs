//! Parameter-sweep planning and execution for gradient estimator experiments.

pub mod aggregate;
mod canonical;
mod config;
mod enumerate;
mod estimator;
mod executor;
mod naming;
mod normalize;
mod orchestrator;
mod report;
mod sampler;

pub use canonical::{stable_hash_string, stable_seed, to_canonical_json_bytes};
pub use config::{
    experiment_file_path, from_yaml_slice, load_experiment, BackendSpec, EstimatorDescriptor,
    ExecutionMode, Experiment, Linspace, OneOrMany, ParamSlot, ProgramDescriptor, RunConfig,
    SamplerSpec, EXPERIMENT_FILE,
};
pub use enumerate::{
    grid_points, hyperparameter_combinations, point_vector, sweep_points, HyperCombination,
    RETURN_NUM_PATHS,
};
pub use estimator::{CommandEstimator, Estimate, EstimateRequest, Estimator, EstimatorRegistry};
pub use executor::{
    execute_unit, plan_unit, ExecutionContext, FileReport, ResultWriter, RunFile, UnitPlan,
    UnitSpec,
};
pub use naming::{clean_segment, header, RunFileKey};
pub use normalize::{
    normalize_estimator, normalize_program, NormalizedEstimator, NormalizedProgram,
    ParameterSpace,
};
pub use orchestrator::{
    enumerate_units, plan_sweep, run_sweep, PlannedUnit, UnitReport, UnitStatus,
};
pub use report::{read_report, write_report, SweepReport, REPORT_FILE};
pub use sampler::{
    radical_inverse, HaltonSampler, LatinHypercubeSampler, Sampler, SamplerRegistry,
    UniformSampler,
};
