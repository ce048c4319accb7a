//! # Ledger Primitives
//!
//! Fixed-width amounts and account identifiers, plus the block context the
//! host hands to the ledger.
//!
//! Amounts are 256-bit unsigned integers and accounts are 20-byte
//! addresses, both taken from `alloy-primitives` so that what we hash is
//! bit-for-bit what an EVM wallet signs. The arithmetic helpers here never
//! wrap: every overflow and underflow is an [`ArithmeticError`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use alloy_primitives::{Address, B256, U256};

/// A snapshot version. On a live chain this is the block number.
pub type Version = u64;

/// Checked-arithmetic failures on token amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArithmeticError {
    #[error("arithmetic overflow")]
    Overflow,

    #[error("arithmetic underflow")]
    Underflow,
}

/// `a + b`, failing on overflow.
pub fn checked_add(a: U256, b: U256) -> Result<U256, ArithmeticError> {
    a.checked_add(b).ok_or(ArithmeticError::Overflow)
}

/// `a - b`, failing on underflow.
pub fn checked_sub(a: U256, b: U256) -> Result<U256, ArithmeticError> {
    a.checked_sub(b).ok_or(ArithmeticError::Underflow)
}

/// Returns `true` for the null account (`0x000…000`).
pub fn is_zero_address(address: &Address) -> bool {
    *address == Address::ZERO
}

/// The execution context of the current block, supplied by the host.
///
/// `number` is the snapshot version: every balance change inside the same
/// block coalesces into one snapshot entry per account. `timestamp` is the
/// clock permit deadlines are measured against (unix seconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockContext {
    /// Block number.
    pub number: Version,
    /// Block timestamp in unix seconds.
    pub timestamp: u64,
}

impl BlockContext {
    pub fn new(number: Version, timestamp: u64) -> Self {
        Self { number, timestamp }
    }

    /// The block that follows this one, `seconds` later.
    pub fn next(&self, seconds: u64) -> Self {
        Self {
            number: self.number + 1,
            timestamp: self.timestamp + seconds,
        }
    }

    /// Returns `true` if `other` does not move time or height backwards.
    pub fn precedes_or_equals(&self, other: &BlockContext) -> bool {
        self.number <= other.number && self.timestamp <= other.timestamp
    }
}
