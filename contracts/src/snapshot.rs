//! # Snapshot Store
//!
//! Per-account, append-only balance history. Every balance change the
//! ledger makes is recorded here as a `(version, value)` pair, where the
//! version is the block number the change happened in. Governance and
//! reward systems read these histories to weigh an account by what it held
//! at some past block, not what it holds now.
//!
//! ## Recording Rules
//!
//! For `record(account, value, version)`:
//!
//! 1. If the latest entry already belongs to `version`, its value is
//!    overwritten. Several transfers in one block leave exactly one entry,
//!    holding the balance after the last of them.
//! 2. Otherwise, if the value equals the latest recorded value, nothing is
//!    written.
//! 3. Otherwise, if the account has no history and the value is zero,
//!    nothing is written. Lookups already answer zero for it.
//! 4. Otherwise a new entry is appended.
//!
//! ## Lookup
//!
//! `lookup(account, version)` binary-searches for the last entry with
//! `entry.version <= version`. Histories grow with every transfer an account
//! takes part in, so a linear scan is not an option.

use std::collections::HashMap;

use aset_protocol::types::{Address, Version, U256};
use serde::{Deserialize, Serialize};

/// A recorded balance, valid from `version` until the next entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Block number the balance was recorded in.
    pub version: Version,
    /// Balance after the last change in that block.
    pub value: U256,
}

/// Balance histories keyed by account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotStore {
    histories: HashMap<Address, Vec<Snapshot>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `value` as `account`'s balance at `version`.
    ///
    /// Returns `true` if the history changed (appended or overwritten).
    ///
    /// # Panics
    ///
    /// Panics if `version` is older than the account's latest entry. The
    /// ledger guarantees block numbers never go backwards, so this can only
    /// mean corrupted state.
    pub fn record(&mut self, account: Address, value: U256, version: Version) -> bool {
        if value.is_zero() && !self.histories.contains_key(&account) {
            return false;
        }
        let history = self.histories.entry(account).or_default();

        if let Some(last) = history.last_mut() {
            assert!(
                last.version <= version,
                "snapshot history of {} went backwards: {} after {}",
                account,
                version,
                last.version
            );
            if last.version == version {
                last.value = value;
                return true;
            }
            if last.value == value {
                return false;
            }
        }

        history.push(Snapshot { version, value });
        true
    }

    /// Balance of `account` in force at `version`, or zero if the account
    /// had no recorded balance by then.
    ///
    /// Versions past the latest entry return the latest value.
    pub fn lookup(&self, account: &Address, version: Version) -> U256 {
        let Some(history) = self.histories.get(account) else {
            return U256::ZERO;
        };
        // Entries are sorted by version; find the first one *after* the query.
        let after = history.partition_point(|s| s.version <= version);
        if after == 0 {
            U256::ZERO
        } else {
            history[after - 1].value
        }
    }

    /// Number of entries recorded for `account`.
    pub fn count(&self, account: &Address) -> usize {
        self.histories.get(account).map_or(0, Vec::len)
    }

    /// Most recent recorded value, or zero.
    pub fn latest(&self, account: &Address) -> U256 {
        self.histories
            .get(account)
            .and_then(|h| h.last())
            .map_or(U256::ZERO, |s| s.value)
    }

    /// The `index`-th entry of `account`'s history.
    pub fn get(&self, account: &Address, index: usize) -> Option<Snapshot> {
        self.histories.get(account).and_then(|h| h.get(index)).copied()
    }

    /// Full history of `account`, oldest first.
    pub fn history(&self, account: &Address) -> &[Snapshot] {
        self.histories.get(account).map_or(&[], Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Address {
        Address::repeat_byte(0xa1)
    }

    fn u(n: u64) -> U256 {
        U256::from(n)
    }

    #[test]
    fn empty_history_reads_zero() {
        let store = SnapshotStore::new();
        assert_eq!(store.lookup(&alice(), 0), U256::ZERO);
        assert_eq!(store.lookup(&alice(), u64::MAX), U256::ZERO);
        assert_eq!(store.count(&alice()), 0);
        assert_eq!(store.latest(&alice()), U256::ZERO);
        assert!(store.get(&alice(), 0).is_none());
        assert!(store.history(&alice()).is_empty());
    }

    #[test]
    fn appends_one_entry_per_version() {
        let mut store = SnapshotStore::new();
        assert!(store.record(alice(), u(100), 1));
        assert!(store.record(alice(), u(60), 3));
        assert!(store.record(alice(), u(0), 7));

        assert_eq!(store.count(&alice()), 3);
        assert_eq!(store.get(&alice(), 1), Some(Snapshot { version: 3, value: u(60) }));
        assert_eq!(store.latest(&alice()), U256::ZERO);
    }

    #[test]
    fn same_version_overwrites_last_entry() {
        let mut store = SnapshotStore::new();
        store.record(alice(), u(100), 1);
        store.record(alice(), u(80), 2);
        store.record(alice(), u(20), 2);

        assert_eq!(store.count(&alice()), 2);
        assert_eq!(store.lookup(&alice(), 2), u(20));
        assert_eq!(store.lookup(&alice(), 1), u(100));
    }

    #[test]
    fn unchanged_value_is_not_recorded() {
        let mut store = SnapshotStore::new();
        store.record(alice(), u(5), 1);
        assert!(!store.record(alice(), u(5), 4));
        assert_eq!(store.count(&alice()), 1);
    }

    #[test]
    fn zero_on_empty_history_is_not_recorded() {
        let mut store = SnapshotStore::new();
        assert!(!store.record(alice(), U256::ZERO, 1));
        assert_eq!(store.count(&alice()), 0);
    }

    #[test]
    fn lookup_finds_latest_entry_at_or_before_version() {
        let mut store = SnapshotStore::new();
        store.record(alice(), u(10), 5);
        store.record(alice(), u(20), 10);
        store.record(alice(), u(30), 15);

        assert_eq!(store.lookup(&alice(), 4), U256::ZERO);
        assert_eq!(store.lookup(&alice(), 5), u(10));
        assert_eq!(store.lookup(&alice(), 9), u(10));
        assert_eq!(store.lookup(&alice(), 10), u(20));
        assert_eq!(store.lookup(&alice(), 14), u(20));
        assert_eq!(store.lookup(&alice(), 15), u(30));
        // Future versions answer with the current balance.
        assert_eq!(store.lookup(&alice(), 1_000_000), u(30));
    }

    #[test]
    fn lookup_on_long_history() {
        let mut store = SnapshotStore::new();
        for i in 1..=1_000u64 {
            store.record(alice(), u(i * 3), i * 2);
        }
        assert_eq!(store.count(&alice()), 1_000);
        assert_eq!(store.lookup(&alice(), 1), U256::ZERO);
        assert_eq!(store.lookup(&alice(), 2), u(3));
        assert_eq!(store.lookup(&alice(), 1_001), u(1_500));
        assert_eq!(store.lookup(&alice(), 2_000), u(3_000));
    }

    #[test]
    #[should_panic(expected = "went backwards")]
    fn older_version_is_fatal() {
        let mut store = SnapshotStore::new();
        store.record(alice(), u(1), 9);
        store.record(alice(), u(2), 8);
    }
}
