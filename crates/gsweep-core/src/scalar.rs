//! Scalar values appearing in experiment files and their textual rendering.
//!
//! Rendering is part of the output contract: scalars end up in file names and
//! in result rows, so the same value must always render to the same text.
//! Integers render in plain decimal. Floats render as the shortest decimal
//! that round-trips, keep a trailing `.0` when integral, and switch to
//! scientific notation (`1e-05`, `1.5e+16`) when the decimal exponent is below
//! `-4` or at least `16`. Booleans render capitalised (`True`, `False`).

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// A single configuration value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Boolean flag, e.g. `return_num_paths: true`.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Free-form text, e.g. the name of a smoothing kernel.
    Text(String),
}

impl Scalar {
    /// Returns the numeric value, if the scalar is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(value) => Some(*value as f64),
            Scalar::Float(value) => Some(*value),
            Scalar::Bool(_) | Scalar::Text(_) => None,
        }
    }

    /// Returns true when the scalar can be handed to an estimator as a number.
    pub fn is_numeric(&self) -> bool {
        self.as_f64().is_some()
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(true) => f.write_str("True"),
            Scalar::Bool(false) => f.write_str("False"),
            Scalar::Int(value) => write!(f, "{value}"),
            Scalar::Float(value) => f.write_str(&format_float(*value)),
            Scalar::Text(value) => f.write_str(value),
        }
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

/// Renders a float using the stable rules described in the module docs.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }
    // `{:e}` yields the shortest round-trip mantissa, e.g. `1.25e-7`.
    let scientific = format!("{value:e}");
    if let Some((mantissa, exponent)) = scientific.split_once('e') {
        if let Ok(exponent) = exponent.parse::<i32>() {
            if !(-4..16).contains(&exponent) {
                let sign = if exponent < 0 { '-' } else { '+' };
                return format!("{mantissa}e{sign}{:02}", exponent.abs());
            }
        }
    }
    let plain = value.to_string();
    if plain.contains('.') {
        plain
    } else {
        format!("{plain}.0")
    }
}
