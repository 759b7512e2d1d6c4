//! Proof-of-work rules of the collection

use num_bigint::BigUint;
use std::fmt;

/// Interprets a cell hash as a big-endian 256-bit unsigned integer
pub fn hash_to_uint(hash: &[u8; 32]) -> BigUint {
    BigUint::from_bytes_be(hash)
}

/// A mine message is valid when its hash is strictly greater than the threshold
pub fn satisfies(hash: &[u8; 32], complexity: &BigUint) -> bool {
    hash_to_uint(hash) > *complexity
}

/// How the threshold is eased when no solution arrived for a long time
///
/// The result is clamped into the collection bounds by the caller.
pub trait RescalePolicy: fmt::Debug + Send + Sync {
    fn ease(&self, complexity: &BigUint) -> BigUint;
}

/// Shifts the threshold right by a fixed number of bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftRescale {
    pub bits: usize,
}

impl Default for ShiftRescale {
    /// Halves the threshold
    fn default() -> Self {
        Self { bits: 1 }
    }
}

impl RescalePolicy for ShiftRescale {
    fn ease(&self, complexity: &BigUint) -> BigUint {
        complexity >> self.bits
    }
}
