// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # ASET Protocol Core Library
//!
//! The primitives underneath the ASET token ledger: 256-bit amounts,
//! 20-byte accounts, Keccak-256, secp256k1 signature recovery, and the
//! EIP-712 hashing that binds a permit to one deployment on one chain.
//!
//! ## Architecture
//!
//! - **config**: Token metadata, genesis allocation, chain ids, devnet timing.
//! - **types**: `Address`, `U256`, checked arithmetic, the host's block context.
//! - **crypto**: Keccak hashing, secp256k1 keys, `ecrecover`.
//! - **eip712**: Domain separator, permit struct hash, signing digest.
//!
//! The ledger logic itself lives in `aset-contracts`; this crate knows
//! nothing about balances.
//!
//! ## Design Philosophy
//!
//! 1. Hash exactly what wallets sign. No "compatible enough".
//! 2. No arithmetic that can wrap.
//! 3. Crypto is a thin wrapper over audited crates.

pub mod config;
pub mod crypto;
pub mod eip712;
pub mod types;

pub use eip712::{Eip712Domain, PermitMessage};
pub use types::{Address, BlockContext, Version, B256, U256};
