use std::fs;
use std::path::{Path, PathBuf};

use gsweep_core::errors::{ErrorInfo, SweepError};
use serde::{Deserialize, Serialize};

use crate::canonical::{stable_hash_string, to_canonical_json_bytes};
use crate::config::{Experiment, RunConfig};
use crate::orchestrator::{UnitReport, UnitStatus};

/// File name of the sweep report inside the output directory.
pub const REPORT_FILE: &str = "sweep_report.json";

/// Aggregate record of one sweep invocation, persisted for provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    pub experiment_hash: String,
    pub created_at: String,
    pub settings: RunConfig,
    pub units: Vec<UnitReport>,
}

impl SweepReport {
    pub fn new(
        experiment: &Experiment,
        settings: &RunConfig,
        created_at: impl Into<String>,
        units: Vec<UnitReport>,
    ) -> Result<Self, SweepError> {
        Ok(Self {
            experiment_hash: stable_hash_string(experiment)?,
            created_at: created_at.into(),
            settings: settings.clone(),
            units,
        })
    }

    pub fn failed_units(&self) -> usize {
        self.units
            .iter()
            .filter(|unit| unit.status != UnitStatus::Completed)
            .count()
    }

    pub fn files_written(&self) -> usize {
        self.units.iter().map(|unit| unit.files.len()).sum()
    }
}

/// Writes the report as canonical JSON and returns its path.
pub fn write_report(out_dir: &Path, report: &SweepReport) -> Result<PathBuf, SweepError> {
    let path = out_dir.join(REPORT_FILE);
    let bytes = to_canonical_json_bytes(report)?;
    fs::write(&path, bytes).map_err(|err| {
        SweepError::Io(
            ErrorInfo::new("report-write", "failed to write sweep report")
                .with_context("path", path.display().to_string())
                .with_hint(err.to_string()),
        )
    })?;
    Ok(path)
}

/// Reads back a report written by [`write_report`].
pub fn read_report(path: &Path) -> Result<SweepReport, SweepError> {
    let bytes = fs::read(path).map_err(|err| {
        SweepError::Io(
            ErrorInfo::new("report-read", "failed to read sweep report")
                .with_context("path", path.display().to_string())
                .with_hint(err.to_string()),
        )
    })?;
    serde_json::from_slice(&bytes).map_err(|err| {
        SweepError::Serde(
            ErrorInfo::new("report-parse", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })
}
