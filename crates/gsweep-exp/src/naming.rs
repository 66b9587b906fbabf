//! Result file naming and header layout.

use std::path::{Path, PathBuf};

use gsweep_core::Scalar;
use serde::{Deserialize, Serialize};

/// Every field that distinguishes one result file from another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFileKey {
    pub program: String,
    pub stddev: Scalar,
    pub seed: u64,
    pub nreps: u64,
    pub estimator: String,
    /// Rendered hyperparameter combination, see [`HyperCombination::render`](crate::HyperCombination::render).
    pub hyperparameters: String,
    pub dim: usize,
    pub replication: usize,
}

impl RunFileKey {
    pub fn file_name(&self) -> String {
        format!(
            "{}_stddev={}_seed={}_nreps={}-{}_{}-dim_{:03}-replication_{:04}.txt",
            clean_segment(&self.program),
            self.stddev,
            self.seed,
            self.nreps,
            clean_segment(&self.estimator),
            clean_segment(&self.hyperparameters),
            self.dim,
            self.replication,
        )
    }

    pub fn path_in(&self, out_dir: &Path) -> PathBuf {
        out_dir.join(self.file_name())
    }
}

/// Keeps a name component within a single path segment.
pub fn clean_segment(name: &str) -> String {
    name.replace(['/', '\\'], "_")
}

/// Column names for a result file with `dimensionality` parameters.
pub fn header(dimensionality: usize) -> Vec<String> {
    let mut columns = Vec::with_capacity(2 * dimensionality + 2);
    columns.extend((0..dimensionality).map(|idx| format!("x{idx}")));
    columns.push("y".to_string());
    columns.extend((0..dimensionality).map(|idx| format!("dydx{idx}")));
    columns.push("cumulative_time".to_string());
    columns
}
