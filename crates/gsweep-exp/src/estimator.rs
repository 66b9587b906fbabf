//! Estimator contract, name registry and the external-command adapter.

use std::collections::BTreeMap;
use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::Arc;

use gsweep_core::errors::{ErrorInfo, SweepError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::BackendSpec;
use crate::enumerate::HyperCombination;

/// Arguments of one estimator call, in contract order.
#[derive(Debug, Clone, Serialize)]
pub struct EstimateRequest<'a> {
    pub program: &'a str,
    pub stddev: f64,
    pub seed: u64,
    pub nreps: u64,
    pub params: &'a [f64],
    pub hyperparameters: &'a HyperCombination,
}

/// Value, gradient and timing returned by an estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub output: f64,
    pub gradient: Vec<f64>,
    /// Estimation time in microseconds.
    pub elapsed: f64,
    /// Reported only when the combination holds `return_num_paths`.
    #[serde(default)]
    pub num_paths: Option<u64>,
}

/// Evaluates a program and its gradient at a point.
pub trait Estimator: Send + Sync {
    fn estimate(&self, request: &EstimateRequest<'_>) -> Result<Estimate, SweepError>;
}

impl<F> Estimator for F
where
    F: Fn(&EstimateRequest<'_>) -> Result<Estimate, SweepError> + Send + Sync,
{
    fn estimate(&self, request: &EstimateRequest<'_>) -> Result<Estimate, SweepError> {
        self(request)
    }
}

/// Name-indexed collection of estimators built once at startup.
#[derive(Clone, Default)]
pub struct EstimatorRegistry {
    estimators: BTreeMap<String, Arc<dyn Estimator>>,
}

impl EstimatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one [`CommandEstimator`] per backend entry.
    pub fn from_backends(backends: &IndexMap<String, BackendSpec>) -> Self {
        let mut registry = Self::new();
        for (name, spec) in backends {
            registry.register(name.clone(), CommandEstimator::new(name.clone(), spec.clone()));
        }
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, estimator: impl Estimator + 'static) {
        self.estimators.insert(name.into(), Arc::new(estimator));
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Estimator>, SweepError> {
        self.estimators.get(name).cloned().ok_or_else(|| {
            SweepError::Estimator(
                ErrorInfo::new("unknown-estimator", "no estimator registered under this name")
                    .with_context("estimator", name)
                    .with_hint("declare a backend with this name in the experiment file"),
            )
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.estimators.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.estimators.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for EstimatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EstimatorRegistry")
            .field("estimators", &self.estimators.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct CommandResponse {
    output: f64,
    gradient: Vec<f64>,
    time: f64,
    #[serde(default)]
    num_paths: Option<u64>,
}

/// Estimator backed by an external command.
///
/// The command is spawned once per sweep point. It receives the request as a
/// single JSON line on stdin and must print a JSON object
/// `{"output", "gradient", "time", "num_paths"?}` as the last line on stdout.
#[derive(Debug, Clone)]
pub struct CommandEstimator {
    name: String,
    spec: BackendSpec,
}

impl CommandEstimator {
    pub fn new(name: impl Into<String>, spec: BackendSpec) -> Self {
        Self {
            name: name.into(),
            spec,
        }
    }

    fn failure(&self, code: &str, message: &str, hint: impl Into<String>) -> SweepError {
        SweepError::Estimator(
            ErrorInfo::new(code, message)
                .with_context("estimator", &self.name)
                .with_context("command", &self.spec.command)
                .with_hint(hint),
        )
    }
}

impl Estimator for CommandEstimator {
    fn estimate(&self, request: &EstimateRequest<'_>) -> Result<Estimate, SweepError> {
        let mut payload = serde_json::to_vec(request).map_err(|err| {
            SweepError::Serde(ErrorInfo::new("backend-request-encode", err.to_string()))
        })?;
        payload.push(b'\n');

        let mut child = Command::new(&self.spec.command)
            .args(&self.spec.args)
            .envs(&self.spec.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|err| self.failure("backend-spawn", "failed to start backend", err.to_string()))?;
        if let Some(mut stdin) = child.stdin.take() {
            if let Err(err) = stdin.write_all(&payload) {
                drop(stdin);
                // backend stopped reading; reap it before reporting
                let _ = child.kill();
                let _ = child.wait();
                return Err(self.failure("backend-stdin", "failed to send request", err.to_string()));
            }
        }
        let output = child.wait_with_output().map_err(|err| {
            self.failure("backend-wait", "failed to collect backend output", err.to_string())
        })?;
        if !output.status.success() {
            return Err(self.failure(
                "backend-exit",
                "backend exited unsuccessfully",
                output.status.to_string(),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let Some(line) = stdout.lines().rev().find(|line| !line.trim().is_empty()) else {
            return Err(self.failure("backend-empty", "backend printed no response", "expected one JSON line"));
        };
        let response: CommandResponse = serde_json::from_str(line.trim()).map_err(|err| {
            self.failure("backend-response", "malformed backend response", err.to_string())
        })?;
        Ok(Estimate {
            output: response.output,
            gradient: response.gradient,
            elapsed: response.time,
            num_paths: response.num_paths,
        })
    }
}
