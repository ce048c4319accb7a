//! Error types for the ASET token.
//!
//! Every rejected call returns a [`TokenError`] and leaves the ledger
//! untouched. The permit rejections are separate variants on purpose: a
//! caller (or a test) must be able to tell an expired permit from a forged
//! one.

use aset_protocol::types::{Address, ArithmeticError, Version, U256};
use thiserror::Error;

/// Errors that can occur during ledger and permit operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// The sender's balance does not cover the transfer.
    #[error("insufficient balance: account has {balance}, tried to move {amount}")]
    InsufficientBalance {
        /// Current balance of the sender.
        balance: U256,
        /// Amount the caller tried to move.
        amount: U256,
    },

    /// The spender's allowance does not cover the transfer.
    #[error("insufficient allowance: spender may move {allowance}, tried {amount}")]
    InsufficientAllowance {
        /// Remaining allowance.
        allowance: U256,
        /// Amount the spender tried to move.
        amount: U256,
    },

    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    #[error("arithmetic underflow")]
    ArithmeticUnderflow,

    /// A permit or an approval named the null account as the owner.
    #[error("invalid owner: the zero address cannot grant an allowance")]
    InvalidOwner,

    /// The permit deadline is zero or already in the past.
    #[error("invalid expiration: deadline {deadline} is before block time {now}")]
    InvalidExpiration {
        /// Deadline carried by the permit.
        deadline: U256,
        /// Timestamp of the current block.
        now: u64,
    },

    /// The signature does not recover to the permit owner.
    #[error("invalid signature")]
    InvalidSignature,

    /// A transfer or the genesis allocation targeted the null account.
    #[error("invalid recipient: {0}")]
    InvalidRecipient(Address),

    /// A transfer was sent from the null account.
    #[error("invalid sender: {0}")]
    InvalidSender(Address),

    /// An allowance was granted to the null account.
    #[error("invalid spender: {0}")]
    InvalidSpender(Address),

    /// The host tried to move the block context backwards.
    #[error("stale block: current block is {current}, attempted {attempted}")]
    StaleBlock {
        /// Current block number.
        current: Version,
        /// Block number the host tried to switch to.
        attempted: Version,
    },
}

impl From<ArithmeticError> for TokenError {
    fn from(err: ArithmeticError) -> Self {
        match err {
            ArithmeticError::Overflow => TokenError::ArithmeticOverflow,
            ArithmeticError::Underflow => TokenError::ArithmeticUnderflow,
        }
    }
}

/// Shorthand for results in this crate.
pub type Result<T> = std::result::Result<T, TokenError>;
