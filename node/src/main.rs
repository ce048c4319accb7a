// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # ASET Devnet Node
//!
//! Entry point for the `aset-node` binary. Parses CLI arguments, initializes
//! logging and metrics, deploys the token in memory, starts the block loop,
//! and serves the HTTP/JSON-RPC/WS API.
//!
//! The binary supports four subcommands:
//!
//! - `run`:         deploy the token and serve it
//! - `keygen`:      generate a secp256k1 key and print its address
//! - `sign-permit`: sign an EIP-712 permit for a deployment
//! - `version`:     print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::broadcast;

use aset_contracts::TokenDeployment;
use aset_protocol::crypto::keys::AsetKeypair;
use aset_protocol::eip712::{permit_digest, sign_permit, Eip712Domain, PermitMessage};
use aset_protocol::types::{Address, BlockContext, U256};

use cli::{AsetNodeCli, Commands};
use metrics::NodeMetrics;

/// Broadcast channel capacity for live event streaming.
/// 256 is large enough to absorb short bursts without dropping events
/// for connected WebSocket clients.
const EVENT_CHANNEL_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = AsetNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Keygen(args) => keygen(args),
        Commands::SignPermit(args) => sign_permit_command(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Seconds since the unix epoch, as used for block timestamps.
fn unix_now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// Deploys the token and serves it until a shutdown signal arrives.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(logging::DEFAULT_FILTER, args.log_format);

    tracing::info!(
        chain_id = args.chain_id,
        contract = %args.contract,
        rpc_port = args.rpc_port,
        metrics_port = args.metrics_port,
        "starting aset-node"
    );

    // --- Genesis ---
    let genesis = BlockContext::new(1, unix_now());
    let mut token = TokenDeployment::new(args.chain_id, args.contract, genesis)
        .initialize(args.distributor, args.governance.unwrap_or(Address::ZERO))
        .context("failed to initialize token")?;
    // Nobody is subscribed yet; the mint is visible through the snapshots.
    token.drain_events();
    tracing::info!(
        domain_separator = %token.domain_separator(),
        distributor = %args.distributor,
        "genesis block {} sealed",
        genesis.number
    );

    // --- Metrics ---
    let node_metrics = Arc::new(NodeMetrics::new().context("failed to register metrics")?);
    node_metrics.block_height.set(genesis.number as i64);

    // --- Event broadcast ---
    let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

    // --- Application state ---
    let app_state = api::AppState::new(
        token,
        format!(
            "{} (revision {})",
            env!("CARGO_PKG_VERSION"),
            aset_protocol::config::REVISION,
        ),
        event_tx,
        Arc::clone(&node_metrics),
    );

    // --- API server ---
    let api_router = api::create_router(app_state.clone());
    let api_addr = format!("0.0.0.0:{}", args.rpc_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind RPC listener on {}", api_addr))?;
    tracing::info!("RPC/API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Block loop ---
    // Every tick opens a new block. Calls landing between two ticks share a
    // block number and therefore one snapshot entry per account.
    let loop_state = app_state.clone();
    let block_time = Duration::from_millis(args.block_time_ms.max(1));
    let block_loop = tokio::spawn(async move {
        let mut interval = tokio::time::interval(block_time);
        // The first tick completes immediately; genesis already is block 1.
        interval.tick().await;
        loop {
            interval.tick().await;
            if let Err(e) = api::produce_block(&loop_state, unix_now()).await {
                tracing::error!("block production failed: {}", e);
            }
        }
    });

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    block_loop.abort();
    tracing::info!("aset-node stopped");
    Ok(())
}

/// Generates a fresh secp256k1 key and prints it with its address.
fn keygen(args: cli::KeygenArgs) -> Result<()> {
    let keypair = AsetKeypair::generate();

    if args.json {
        let out = serde_json::json!({
            "address": keypair.address(),
            "private_key": keypair.secret_key_hex(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("Address     : {}", keypair.address());
        println!("Private key : {}", keypair.secret_key_hex());
    }
    Ok(())
}

/// Signs a permit the way a wallet would and prints the pieces a relayer
/// needs to submit it.
fn sign_permit_command(args: cli::SignPermitArgs) -> Result<()> {
    let keypair = AsetKeypair::from_hex(&args.key).context("invalid signer key")?;
    let domain = Eip712Domain::new(
        aset_protocol::config::TOKEN_NAME,
        aset_protocol::config::EIP712_REVISION,
        args.chain_id,
        args.contract,
    );
    let separator = domain.separator();

    let message = PermitMessage {
        owner: keypair.address(),
        spender: args.spender,
        value: args.value,
        nonce: args.nonce,
        deadline: args.deadline.unwrap_or(U256::MAX),
    };
    let signature = sign_permit(&keypair, &separator, &message).context("signing failed")?;

    println!("Owner            : {}", message.owner);
    println!("Spender          : {}", message.spender);
    println!("Value            : {}", message.value);
    println!("Nonce            : {}", message.nonce);
    println!("Deadline         : {}", message.deadline);
    println!("Domain separator : {}", separator);
    println!("Digest           : 0x{}", hex::encode(permit_digest(&separator, &message)));
    println!("v                : {}", signature.v);
    println!("r                : 0x{}", hex::encode(signature.r));
    println!("s                : 0x{}", hex::encode(signature.s));
    println!("Signature        : {}", signature.to_hex());
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("aset-node {}", env!("CARGO_PKG_VERSION"));
    println!("revision  {}", aset_protocol::config::REVISION);
    println!("rustc     {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
