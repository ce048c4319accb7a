//! # Protocol Configuration & Constants
//!
//! Every magic number of the ASET ledger lives here. Token metadata, the
//! EIP-712 domain strings, the genesis allocation, and the network
//! parameters the devnet host uses.
//!
//! The token metadata and domain strings are part of every permit signature.
//! Changing any of them after deployment invalidates every signature in
//! flight, so treat them as frozen.

use alloy_primitives::U256;

// ---------------------------------------------------------------------------
// Token Metadata
// ---------------------------------------------------------------------------

/// Human-readable token name. Also the `name` field of the EIP-712 domain.
pub const TOKEN_NAME: &str = "Aset Token";

/// Ticker symbol.
pub const TOKEN_SYMBOL: &str = "ASET";

/// Decimal places of the smallest unit. 18, like ether.
pub const TOKEN_DECIMALS: u8 = 18;

/// Implementation revision reported by the token. Bumped on every upgrade
/// of the ledger logic.
pub const REVISION: u64 = 1;

/// The `version` field of the EIP-712 domain. A string, not a number.
pub const EIP712_REVISION: &str = "1";

/// Supply minted to the distributor at genesis, in whole tokens.
pub const GENESIS_SUPPLY_WHOLE_TOKENS: u64 = 16_000_000;

// ---------------------------------------------------------------------------
// Chain Identifiers
// ---------------------------------------------------------------------------

/// BNB Smart Chain mainnet.
pub const CHAIN_ID_BSC_MAINNET: u64 = 56;

/// BNB Smart Chain testnet.
pub const CHAIN_ID_BSC_TESTNET: u64 = 97;

/// Local development chain (hardhat / anvil default).
pub const CHAIN_ID_DEVNET: u64 = 31_337;

// ---------------------------------------------------------------------------
// Signature Parameters
// ---------------------------------------------------------------------------

/// Length of an `(r, s, v)` signature in its 65-byte RPC form.
pub const SIGNATURE_LENGTH: usize = 65;

// ---------------------------------------------------------------------------
// Devnet Host
// ---------------------------------------------------------------------------

/// Block time of the devnet host in milliseconds. Every call within one
/// block shares a snapshot version.
pub const BLOCK_TIME_MS: u64 = 2_000;

/// Default HTTP / JSON-RPC port.
pub const DEFAULT_RPC_PORT: u16 = 8545;

/// Default Prometheus metrics port.
pub const DEFAULT_METRICS_PORT: u16 = 9545;

// ---------------------------------------------------------------------------
// Utility
// ---------------------------------------------------------------------------

/// Converts a whole-token count into base units (`whole * 10^18`).
pub fn to_base_units(whole: u64) -> U256 {
    U256::from(whole) * U256::from(10u64).pow(U256::from(TOKEN_DECIMALS))
}

/// The genesis allocation in base units.
pub fn genesis_supply() -> U256 {
    to_base_units(GENESIS_SUPPLY_WHOLE_TOKENS)
}

/// Returns a friendly name for a chain ID, mainly for logging.
pub fn network_name(chain_id: u64) -> String {
    match chain_id {
        CHAIN_ID_BSC_MAINNET => "bsc-mainnet".to_string(),
        CHAIN_ID_BSC_TESTNET => "bsc-testnet".to_string(),
        CHAIN_ID_DEVNET => "devnet".to_string(),
        other => format!("unknown({})", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_supply_has_eighteen_decimals() {
        let expected: U256 = "16000000000000000000000000".parse().unwrap();
        assert_eq!(genesis_supply(), expected);
    }

    #[test]
    fn test_to_base_units_scales_by_decimals() {
        assert_eq!(to_base_units(0), U256::ZERO);
        assert_eq!(
            to_base_units(1),
            U256::from(1_000_000_000_000_000_000u64)
        );
    }

    #[test]
    fn test_chain_ids_are_distinct() {
        assert_ne!(CHAIN_ID_BSC_MAINNET, CHAIN_ID_BSC_TESTNET);
        assert_ne!(CHAIN_ID_BSC_MAINNET, CHAIN_ID_DEVNET);
        assert_ne!(CHAIN_ID_BSC_TESTNET, CHAIN_ID_DEVNET);
    }

    #[test]
    fn test_network_name_formatting() {
        assert_eq!(network_name(CHAIN_ID_BSC_MAINNET), "bsc-mainnet");
        assert_eq!(network_name(CHAIN_ID_DEVNET), "devnet");
        assert_eq!(network_name(1), "unknown(1)");
    }
}
