//! # CLI Interface
//!
//! Defines the command-line argument structure for `aset-node` using
//! `clap` derive. Supports four subcommands: `run`, `keygen`,
//! `sign-permit` and `version`.

use aset_protocol::config::{CHAIN_ID_DEVNET, DEFAULT_METRICS_PORT, DEFAULT_RPC_PORT};
use aset_protocol::types::{Address, U256};
use clap::{Parser, Subcommand};

use crate::logging::LogFormat;

/// ASET token devnet host.
///
/// Runs the ASET token ledger behind a block loop and serves it over
/// REST, JSON-RPC and WebSocket, with Prometheus metrics on a side port.
#[derive(Parser, Debug)]
#[command(
    name = "aset-node",
    about = "ASET token devnet host",
    version,
    propagate_version = true
)]
pub struct AsetNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the ASET node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deploy the token in memory and serve it.
    Run(RunArgs),
    /// Generate a fresh secp256k1 key and print it with its address.
    Keygen(KeygenArgs),
    /// Sign an EIP-712 permit with a hex private key.
    SignPermit(SignPermitArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Chain id bound into the permit domain.
    #[arg(long, env = "ASET_CHAIN_ID", default_value_t = CHAIN_ID_DEVNET)]
    pub chain_id: u64,

    /// Address the token is deployed at (the permit `verifyingContract`).
    #[arg(long, env = "ASET_CONTRACT")]
    pub contract: Address,

    /// Account that receives the whole genesis supply.
    #[arg(long, env = "ASET_DISTRIBUTOR")]
    pub distributor: Address,

    /// Governance address recorded at initialization.
    #[arg(long, env = "ASET_GOVERNANCE")]
    pub governance: Option<Address>,

    /// Port for the REST, JSON-RPC and WebSocket API.
    #[arg(long, env = "ASET_RPC_PORT", default_value_t = DEFAULT_RPC_PORT)]
    pub rpc_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "ASET_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Milliseconds between blocks.
    #[arg(long, env = "ASET_BLOCK_TIME_MS", default_value_t = aset_protocol::config::BLOCK_TIME_MS)]
    pub block_time_ms: u64,

    /// Log output format.
    #[arg(long, env = "ASET_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

/// Arguments for the `keygen` subcommand.
#[derive(Parser, Debug)]
pub struct KeygenArgs {
    /// Print the key as a JSON object instead of plain lines.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `sign-permit` subcommand.
#[derive(Parser, Debug)]
pub struct SignPermitArgs {
    /// Hex-encoded secp256k1 private key of the owner.
    ///
    /// **Never pass this flag on a shared machine.** Prefer the env var.
    #[arg(long, env = "ASET_SIGNER_KEY", hide_env_values = true)]
    pub key: String,

    /// Chain id of the target deployment.
    #[arg(long, env = "ASET_CHAIN_ID", default_value_t = CHAIN_ID_DEVNET)]
    pub chain_id: u64,

    /// Address of the target deployment.
    #[arg(long, env = "ASET_CONTRACT")]
    pub contract: Address,

    /// Account allowed to spend.
    #[arg(long)]
    pub spender: Address,

    /// Allowance to grant, in base units (decimal or 0x-hex).
    #[arg(long)]
    pub value: U256,

    /// The owner's current permit nonce.
    #[arg(long, default_value = "0")]
    pub nonce: U256,

    /// Unix timestamp after which the permit is void. Defaults to never.
    #[arg(long)]
    pub deadline: Option<U256>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        AsetNodeCli::command().debug_assert();
    }

    #[test]
    fn run_args_parse() {
        let cli = AsetNodeCli::try_parse_from([
            "aset-node",
            "run",
            "--chain-id",
            "97",
            "--contract",
            "0x4242424242424242424242424242424242424242",
            "--distributor",
            "0xd1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1d1",
            "--log-format",
            "json",
        ])
        .unwrap();

        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.chain_id, 97);
        assert_eq!(args.contract, Address::repeat_byte(0x42));
        assert_eq!(args.governance, None);
        assert_eq!(args.rpc_port, DEFAULT_RPC_PORT);
        assert_eq!(args.log_format, LogFormat::Json);
    }

    #[test]
    fn sign_permit_requires_spender() {
        let res = AsetNodeCli::try_parse_from([
            "aset-node",
            "sign-permit",
            "--key",
            "0x01",
            "--contract",
            "0x4242424242424242424242424242424242424242",
            "--value",
            "1",
        ]);
        assert!(res.is_err());
    }
}
