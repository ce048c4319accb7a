//! # ASET Token Contracts
//!
//! The ASET governance token as a library: an ERC-20 ledger whose every
//! balance change is also written to a per-account history, plus EIP-2612
//! permits so owners can grant allowances with a signature instead of a
//! transaction.
//!
//! - **Ledger** ([`ledger`]) balances, allowances, total supply.
//! - **Snapshots** ([`snapshot`]) balance-by-block histories with
//!   logarithmic lookup, for governance votes and reward weighting.
//! - **Permits** ([`permit`]) signature checks and per-owner nonces.
//! - **Token** ([`token`]) the deployed object tying them together.
//!
//! ## Design Principles
//!
//! 1. Amounts are `U256` and every addition and subtraction is checked.
//! 2. A rejected call leaves no trace: checks run before writes.
//! 3. The library is single-owner and synchronous. Whoever holds
//!    `&mut AsetToken` is the serialization point.
//! 4. Every public type is serializable (serde) so hosts can persist and
//!    serve it.

pub mod error;
pub mod events;
pub mod ledger;
pub mod permit;
pub mod snapshot;
pub mod token;

pub use error::{Result, TokenError};
pub use events::TokenEvent;
pub use permit::PermitRequest;
pub use snapshot::Snapshot;
pub use token::{AsetToken, TokenDeployment};
