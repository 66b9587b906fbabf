//! Block-sum downsampling of three-compartment reference trajectories.

use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use gsweep_core::errors::{ErrorInfo, SweepError};
use gsweep_core::format_float;

/// Column order of reference trajectories.
pub const STATES: [&str; 3] = ["sus", "inf", "rec"];

/// Default number of consecutive rows summed into one block.
pub const DEFAULT_BLOCK: usize = 100;

fn wrap_csv(code: &str, path: &Path, err: csv::Error) -> SweepError {
    SweepError::Io(
        ErrorInfo::new(code, "reference CSV failure")
            .with_context("path", path.display().to_string())
            .with_hint(err.to_string()),
    )
}

/// Sums rows in consecutive blocks of `block` rows; the last block may be partial.
pub fn block_sums(rows: &[[f64; 3]], block: usize) -> Result<Vec<[f64; 3]>, SweepError> {
    if block == 0 {
        return Err(SweepError::Config(ErrorInfo::new(
            "block-size",
            "block size must be positive",
        )));
    }
    Ok(rows
        .chunks(block)
        .map(|chunk| {
            chunk.iter().fold([0.0; 3], |mut acc, row| {
                for (sum, value) in acc.iter_mut().zip(row) {
                    *sum += value;
                }
                acc
            })
        })
        .collect())
}

/// Reads a headerless `sus,inf,rec` CSV.
pub fn read_states(path: &Path) -> Result<Vec<[f64; 3]>, SweepError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|err| wrap_csv("reference-read", path, err))?;
    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|err| wrap_csv("reference-record", path, err))?;
        if record.len() != STATES.len() {
            return Err(SweepError::Config(
                ErrorInfo::new("reference-width", "expected three columns")
                    .with_context("path", path.display().to_string())
                    .with_context("line", (line + 1).to_string()),
            ));
        }
        let mut row = [0.0; 3];
        for (slot, field) in row.iter_mut().zip(record.iter()) {
            *slot = field.trim().parse().map_err(|_| {
                SweepError::Config(
                    ErrorInfo::new("reference-value", "non-numeric reference value")
                        .with_context("path", path.display().to_string())
                        .with_context("line", (line + 1).to_string())
                        .with_context("value", field),
                )
            })?;
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Writes block sums with a `block,sus,inf,rec` header.
pub fn write_blocks(path: &Path, blocks: &[[f64; 3]]) -> Result<(), SweepError> {
    let mut writer = WriterBuilder::new()
        .from_path(path)
        .map_err(|err| wrap_csv("blocks-open", path, err))?;
    writer
        .write_record(["block", STATES[0], STATES[1], STATES[2]])
        .map_err(|err| wrap_csv("blocks-header", path, err))?;
    for (idx, block) in blocks.iter().enumerate() {
        let mut record = vec![idx.to_string()];
        record.extend(block.iter().map(|value| format_float(*value)));
        writer
            .write_record(&record)
            .map_err(|err| wrap_csv("blocks-row", path, err))?;
    }
    writer
        .flush()
        .map_err(|err| wrap_csv("blocks-flush", path, err.into()))
}
