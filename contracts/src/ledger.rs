//! # Ledger Core
//!
//! Balances, allowances and total supply, plus the snapshot bookkeeping
//! every balance change triggers.
//!
//! ## Invariants
//!
//! - The sum of all balances equals the total supply.
//! - No amount ever wraps: every addition and subtraction is checked.
//! - A call either applies completely or not at all. Every check runs
//!   before the first write.
//! - Every balance change is mirrored into the [`SnapshotStore`] at the
//!   current version, except self-transfers, which change nothing.
//! - The null account never holds tokens or allowances. It only shows up as
//!   the `from` of the genesis `Transfer` event.

use std::collections::HashMap;

use aset_protocol::types::{checked_add, checked_sub, is_zero_address, Address, Version, U256};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TokenError};
use crate::events::TokenEvent;
use crate::snapshot::{Snapshot, SnapshotStore};

/// The accounting core of the token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    /// Per-account balances. Absent means zero.
    balances: HashMap<Address, U256>,
    /// `owner -> (spender -> allowance)`.
    allowances: HashMap<Address, HashMap<Address, U256>>,
    /// Sum of all balances.
    total_supply: U256,
    /// Per-account balance history.
    snapshots: SnapshotStore,
    /// Version new snapshot entries are recorded under.
    version: Version,
    /// Events emitted since the last drain.
    events: Vec<TokenEvent>,
}

impl Ledger {
    /// Creates an empty ledger recording snapshots at `version`.
    pub fn new(version: Version) -> Self {
        Self {
            version,
            ..Default::default()
        }
    }

    // -----------------------------------------------------------------------
    // Versioning
    // -----------------------------------------------------------------------

    /// Current snapshot version.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Moves the ledger to a new version. Versions never go backwards.
    pub fn advance_to(&mut self, version: Version) -> Result<()> {
        if version < self.version {
            return Err(TokenError::StaleBlock {
                current: self.version,
                attempted: version,
            });
        }
        self.version = version;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }

    pub fn balance_of(&self, account: &Address) -> U256 {
        self.balances.get(account).copied().unwrap_or(U256::ZERO)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> U256 {
        self.allowances
            .get(owner)
            .and_then(|m| m.get(spender))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    /// Balance of `account` at a past (or current) version.
    pub fn balance_at(&self, account: &Address, version: Version) -> U256 {
        self.snapshots.lookup(account, version)
    }

    pub fn snapshot_count(&self, account: &Address) -> usize {
        self.snapshots.count(account)
    }

    pub fn snapshot(&self, account: &Address, index: usize) -> Option<Snapshot> {
        self.snapshots.get(account, index)
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Moves `amount` from `from` to `to`.
    ///
    /// A self-transfer is applied (and emits its event) but leaves the
    /// balance and the snapshot history untouched.
    ///
    /// # Errors
    ///
    /// [`TokenError::InvalidSender`] / [`TokenError::InvalidRecipient`] if
    /// either side is the zero address;
    /// [`TokenError::InsufficientBalance`] if `from` holds less than `amount`;
    /// [`TokenError::ArithmeticOverflow`] if `to`'s balance would overflow.
    pub fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<()> {
        if is_zero_address(&from) {
            return Err(TokenError::InvalidSender(from));
        }
        if is_zero_address(&to) {
            return Err(TokenError::InvalidRecipient(to));
        }

        let from_balance = self.balance_of(&from);
        if from_balance < amount {
            return Err(TokenError::InsufficientBalance {
                balance: from_balance,
                amount,
            });
        }

        if from != to {
            let new_from = checked_sub(from_balance, amount)?;
            let new_to = checked_add(self.balance_of(&to), amount)?;

            self.balances.insert(from, new_from);
            self.balances.insert(to, new_to);
            self.snapshots.record(from, new_from, self.version);
            self.snapshots.record(to, new_to, self.version);
        }

        debug!(%from, %to, %amount, version = self.version, "transfer");
        self.events.push(TokenEvent::Transfer {
            block: self.version,
            from,
            to,
            value: amount,
        });
        Ok(())
    }

    /// Sets `owner`'s allowance for `spender` to exactly `amount`.
    ///
    /// # Errors
    ///
    /// [`TokenError::InvalidOwner`] / [`TokenError::InvalidSpender`] if
    /// either side is the zero address.
    pub fn approve(&mut self, owner: Address, spender: Address, amount: U256) -> Result<()> {
        if is_zero_address(&owner) {
            return Err(TokenError::InvalidOwner);
        }
        if is_zero_address(&spender) {
            return Err(TokenError::InvalidSpender(spender));
        }

        self.allowances
            .entry(owner)
            .or_default()
            .insert(spender, amount);

        debug!(%owner, %spender, %amount, "approve");
        self.events.push(TokenEvent::Approval {
            block: self.version,
            owner,
            spender,
            value: amount,
        });
        Ok(())
    }

    /// `spender` moves `amount` from `from` to `to`, consuming allowance.
    ///
    /// # Errors
    ///
    /// [`TokenError::InsufficientAllowance`] if the allowance is short, then
    /// everything [`transfer`](Self::transfer) can return.
    pub fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<()> {
        if is_zero_address(&spender) {
            return Err(TokenError::InvalidSpender(spender));
        }
        let allowance = self.allowance(&from, &spender);
        if allowance < amount {
            return Err(TokenError::InsufficientAllowance { allowance, amount });
        }
        let remaining = checked_sub(allowance, amount)?;

        // `transfer` checks everything before writing, so a failure here
        // leaves the allowance untouched too. Both sides of the approval are
        // already known to be non-zero.
        self.transfer(from, to, amount)?;
        self.approve(from, spender, remaining)
    }

    /// Raises `owner`'s allowance for `spender` by `added`.
    pub fn increase_allowance(
        &mut self,
        owner: Address,
        spender: Address,
        added: U256,
    ) -> Result<()> {
        let current = self.allowance(&owner, &spender);
        let updated = checked_add(current, added)?;
        self.approve(owner, spender, updated)
    }

    /// Lowers `owner`'s allowance for `spender` by `subtracted`.
    ///
    /// # Errors
    ///
    /// [`TokenError::InsufficientAllowance`] if the allowance would go below zero.
    pub fn decrease_allowance(
        &mut self,
        owner: Address,
        spender: Address,
        subtracted: U256,
    ) -> Result<()> {
        let current = self.allowance(&owner, &spender);
        if current < subtracted {
            return Err(TokenError::InsufficientAllowance {
                allowance: current,
                amount: subtracted,
            });
        }
        let updated = checked_sub(current, subtracted)?;
        self.approve(owner, spender, updated)
    }

    /// Creates `amount` new tokens for `to`. Only used by genesis.
    pub fn mint_genesis(&mut self, to: Address, amount: U256) -> Result<()> {
        let supply = checked_add(self.total_supply, amount)?;
        let balance = checked_add(self.balance_of(&to), amount)?;

        self.total_supply = supply;
        self.balances.insert(to, balance);
        self.snapshots.record(to, balance, self.version);

        debug!(%to, %amount, version = self.version, "genesis mint");
        self.events.push(TokenEvent::Transfer {
            block: self.version,
            from: Address::ZERO,
            to,
            value: amount,
        });
        Ok(())
    }

    /// Returns and clears the events emitted so far.
    pub fn drain_events(&mut self) -> Vec<TokenEvent> {
        std::mem::take(&mut self.events)
    }
}
