#![deny(missing_docs)]
#![doc = "Shared primitives for the gsweep parameter-sweep engine: the structured error type, deterministic seeding and the scalar value model used in experiment files."]

pub mod errors;
pub mod rng;
pub mod scalar;

pub use errors::{ErrorInfo, SweepError};
pub use rng::{replication_seed, seed_from_bytes, RngHandle};
pub use scalar::{format_float, Scalar};
