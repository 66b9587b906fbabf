use std::error::Error;
use std::path::PathBuf;

use chrono::{SecondsFormat, Utc};
use clap::Args;
use gsweep_exp::{
    load_experiment, plan_sweep, run_sweep, write_report, EstimatorRegistry, ExecutionMode,
    RunConfig, SamplerRegistry, SweepReport,
};

#[derive(Args, Debug)]
pub struct SweepArgs {
    /// Directory holding `experiment.yaml`, or the YAML file itself.
    pub experiment_path: PathBuf,
    /// Replications per run unit; each replication writes its own file.
    #[arg(long = "num_reps", short = 'r', default_value_t = 1)]
    pub num_reps: usize,
    /// Run (program, estimator) pairs one after another.
    #[arg(long, short = 's')]
    pub sequential: bool,
    /// Output directory for result files and the sweep report.
    #[arg(long, short = 'o', default_value = "results")]
    pub out: PathBuf,
    /// Cap on concurrently running pairs (default: all at once).
    #[arg(long, short = 'j')]
    pub jobs: Option<usize>,
    /// Print the result files that would be written and exit.
    #[arg(long)]
    pub dry_run: bool,
}

impl SweepArgs {
    fn config(&self) -> RunConfig {
        RunConfig {
            out_dir: self.out.clone(),
            replications: self.num_reps,
            mode: if self.sequential {
                ExecutionMode::Sequential
            } else {
                ExecutionMode::Parallel
            },
            max_jobs: self.jobs,
        }
    }
}

pub fn run(args: &SweepArgs) -> Result<(), Box<dyn Error>> {
    let experiment = load_experiment(&args.experiment_path)?;
    let config = args.config();
    tracing::info!(
        programs = experiment.programs.len(),
        estimators = experiment.estimators.len(),
        path = %args.experiment_path.display(),
        "experiment loaded"
    );

    if args.dry_run {
        for unit in plan_sweep(&experiment, &config) {
            match unit.files {
                Ok(files) => {
                    for file in files {
                        println!("{}", file.display());
                    }
                }
                Err(err) => tracing::warn!(
                    program = %unit.program,
                    estimator = %unit.estimator,
                    "unit would fail: {err}"
                ),
            }
        }
        return Ok(());
    }

    let estimators = EstimatorRegistry::from_backends(&experiment.backends);
    let samplers = SamplerRegistry::with_builtins();
    let units = run_sweep(&experiment, &estimators, &samplers, &config)?;
    let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let report = SweepReport::new(&experiment, &config, created_at, units)?;
    let path = write_report(&config.out_dir, &report)?;
    tracing::info!(
        files = report.files_written(),
        failed_units = report.failed_units(),
        report = %path.display(),
        "sweep finished"
    );

    if report.failed_units() > 0 {
        return Err(format!(
            "{} of {} units failed; see {}",
            report.failed_units(),
            report.units.len(),
            path.display()
        )
        .into());
    }
    Ok(())
}
