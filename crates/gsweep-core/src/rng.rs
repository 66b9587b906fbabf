//! Per-run seeding.
//!
//! Every result file draws from its own random source. Its seed is derived
//! from a description of the run, never from ambient state: the canonical
//! bytes of a (program, estimator, combination) triple hash to a combination
//! seed, and each replication mixes its index into that seed. SipHash-1-3 with
//! zero keys keeps the values identical across platforms and processes.

use std::hash::Hasher;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use siphasher::sip::SipHasher13;

fn sip() -> SipHasher13 {
    SipHasher13::new_with_keys(0, 0)
}

/// Seed for a combination, from its canonical byte encoding.
pub fn seed_from_bytes(bytes: &[u8]) -> u64 {
    let mut hasher = sip();
    hasher.write(bytes);
    hasher.finish()
}

/// Seed of one replication of a combination.
pub fn replication_seed(combination_seed: u64, replication: usize) -> u64 {
    let mut hasher = sip();
    hasher.write_u64(combination_seed);
    hasher.write_u64(replication as u64);
    hasher.finish()
}

/// Random source handed to samplers, one per result file.
#[derive(Debug, Clone)]
pub struct RngHandle(StdRng);

impl RngHandle {
    /// Creates the source for a run seed.
    pub fn from_seed(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl RngCore for RngHandle {
    fn next_u32(&mut self) -> u32 {
        self.0.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.0.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.0.try_fill_bytes(dest)
    }
}
