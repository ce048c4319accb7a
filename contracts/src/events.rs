//! Token events.
//!
//! The ledger appends one event per successful balance or allowance change,
//! mirroring the ERC-20 `Transfer` and `Approval` logs. The host drains them
//! after each call and forwards them to subscribers and indexers.

use aset_protocol::types::{Address, Version, U256};
use serde::{Deserialize, Serialize};

/// A ledger event, tagged with the block it happened in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TokenEvent {
    /// Tokens moved. `from` is the zero address for the genesis mint.
    #[serde(rename = "transfer")]
    Transfer {
        block: Version,
        from: Address,
        to: Address,
        value: U256,
    },
    /// An allowance was set, by a direct call, a transfer-from, or a permit.
    #[serde(rename = "approval")]
    Approval {
        block: Version,
        owner: Address,
        spender: Address,
        value: U256,
    },
}

impl TokenEvent {
    /// Block number the event was emitted in.
    pub fn block(&self) -> Version {
        match self {
            TokenEvent::Transfer { block, .. } | TokenEvent::Approval { block, .. } => *block,
        }
    }
}
