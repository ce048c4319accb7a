//! # REST + JSON-RPC + WebSocket API
//!
//! Builds the axum router that exposes the token over HTTP. All endpoints
//! share application state through axum's `State` extractor; the token
//! itself sits behind one `RwLock`, so every mutation is serialized and
//! queries never observe a half-applied call.
//!
//! ## Endpoints
//!
//! | Method | Path                                   | Description                        |
//! |--------|----------------------------------------|------------------------------------|
//! | GET    | `/health`                              | Liveness probe                     |
//! | GET    | `/status`                              | Token and chain summary            |
//! | GET    | `/accounts/:address`                   | Balance, nonce, snapshot count     |
//! | GET    | `/accounts/:address/snapshots`         | Full balance history               |
//! | GET    | `/accounts/:address/snapshots/:index`  | One history entry                  |
//! | GET    | `/accounts/:address/balance/:version`  | Balance as of a past block         |
//! | GET    | `/allowances/:owner/:spender`          | Current allowance                  |
//! | POST   | `/transfer`                            | Direct transfer                    |
//! | POST   | `/approve`                             | Set an allowance                   |
//! | POST   | `/transfer_from`                       | Delegated transfer                 |
//! | POST   | `/increase_allowance`                  | Raise an allowance                 |
//! | POST   | `/decrease_allowance`                  | Lower an allowance                 |
//! | POST   | `/permit`                              | Submit a signed permit             |
//! | POST   | `/rpc`                                 | JSON-RPC 2.0 gateway               |
//! | GET    | `/ws`                                  | Live blocks and token events       |
//!
//! The caller-asserting endpoints (`/transfer`, `/approve`, ...) trust the
//! `from`/`owner`/`spender` field in the body. This is a devnet host: whoever
//! can reach the port can act as any account. `/permit` needs no trust, the
//! signature authenticates the owner.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use aset_contracts::{AsetToken, PermitRequest, Snapshot, TokenError, TokenEvent};
use aset_protocol::config::network_name;
use aset_protocol::crypto::Signature;
use aset_protocol::types::{Address, BlockContext, Version, B256, U256};

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone: everything is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// Network name derived from the chain id ("bsc-mainnet", "devnet", ...).
    pub network: String,
    /// The deployed token. Single serialization point for all calls.
    pub token: Arc<RwLock<AsetToken>>,
    /// Broadcast channel for live event notifications.
    pub event_tx: broadcast::Sender<NodeEvent>,
    /// Reference to Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
}

impl AppState {
    pub fn new(
        token: AsetToken,
        version: String,
        event_tx: broadcast::Sender<NodeEvent>,
        metrics: SharedMetrics,
    ) -> Self {
        Self {
            version,
            network: network_name(token.chain_id()),
            token: Arc::new(RwLock::new(token)),
            event_tx,
            metrics,
        }
    }
}

/// Events pushed to WebSocket subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeEvent {
    /// The block loop opened a new block.
    #[serde(rename = "new_block")]
    NewBlock { number: Version, timestamp: u64 },
    /// Tokens moved.
    #[serde(rename = "transfer")]
    Transfer {
        block: Version,
        from: Address,
        to: Address,
        value: U256,
    },
    /// An allowance was set.
    #[serde(rename = "approval")]
    Approval {
        block: Version,
        owner: Address,
        spender: Address,
        value: U256,
    },
}

impl From<TokenEvent> for NodeEvent {
    fn from(event: TokenEvent) -> Self {
        match event {
            TokenEvent::Transfer {
                block,
                from,
                to,
                value,
            } => NodeEvent::Transfer {
                block,
                from,
                to,
                value,
            },
            TokenEvent::Approval {
                block,
                owner,
                spender,
                value,
            } => NodeEvent::Approval {
                block,
                owner,
                spender,
                value,
            },
        }
    }
}

/// Opens the next block at `timestamp` (unix seconds) and announces it.
///
/// The timestamp is clamped so it never runs behind the current block's.
pub async fn produce_block(state: &AppState, timestamp: u64) -> Result<BlockContext, TokenError> {
    let next = {
        let mut token = state.token.write().await;
        let current = token.block();
        let next = BlockContext::new(current.number + 1, timestamp.max(current.timestamp));
        token.advance_block(next)?;
        next
    };

    state.metrics.block_height.set(next.number as i64);
    state.metrics.blocks_produced_total.inc();
    // No subscribers is not an error.
    let _ = state.event_tx.send(NodeEvent::NewBlock {
        number: next.number,
        timestamp: next.timestamp,
    });
    tracing::debug!(number = next.number, timestamp = next.timestamp, "block produced");
    Ok(next)
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
///
/// The returned router is ready to be served on the configured RPC port.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/accounts/:address", get(account_handler))
        .route("/accounts/:address/snapshots", get(snapshots_handler))
        .route("/accounts/:address/snapshots/:index", get(snapshot_handler))
        .route("/accounts/:address/balance/:version", get(balance_at_handler))
        .route("/allowances/:owner/:spender", get(allowance_handler))
        .route("/transfer", post(transfer_handler))
        .route("/approve", post(approve_handler))
        .route("/transfer_from", post(transfer_from_handler))
        .route("/increase_allowance", post(increase_allowance_handler))
        .route("/decrease_allowance", post(decrease_allowance_handler))
        .route("/permit", post(permit_handler))
        .route("/rpc", post(rpc_handler))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by the REST handlers, rendered as `{"error", "reason"}`.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed path parameter or body field.
    BadRequest(String),
    /// The requested item does not exist.
    NotFound(String),
    /// The ledger rejected the call.
    Rejected(TokenError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, reason, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Rejected(e) => (StatusCode::BAD_REQUEST, rejection_reason(&e), e.to_string()),
        };
        (
            status,
            Json(serde_json::json!({ "error": message, "reason": reason })),
        )
            .into_response()
    }
}

/// Stable machine-readable name of a ledger rejection.
pub fn rejection_reason(err: &TokenError) -> &'static str {
    match err {
        TokenError::InsufficientBalance { .. } => "insufficient_balance",
        TokenError::InsufficientAllowance { .. } => "insufficient_allowance",
        TokenError::ArithmeticOverflow => "arithmetic_overflow",
        TokenError::ArithmeticUnderflow => "arithmetic_underflow",
        TokenError::InvalidOwner => "invalid_owner",
        TokenError::InvalidExpiration { .. } => "invalid_expiration",
        TokenError::InvalidSignature => "invalid_signature",
        TokenError::InvalidRecipient(_) => "invalid_recipient",
        TokenError::InvalidSender(_) => "invalid_sender",
        TokenError::InvalidSpender(_) => "invalid_spender",
        TokenError::StaleBlock { .. } => "stale_block",
    }
}

fn parse_address(raw: &str) -> Result<Address, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid address: {}", raw)))
}

// ---------------------------------------------------------------------------
// JSON-RPC Types
// ---------------------------------------------------------------------------

/// A JSON-RPC 2.0 request envelope.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version. Must be "2.0".
    pub jsonrpc: String,
    /// The method to invoke.
    pub method: String,
    /// Positional method parameters.
    pub params: Option<Value>,
    /// Request identifier. Echoed back in the response.
    pub id: Value,
}

/// A JSON-RPC 2.0 response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Protocol version. Always "2.0".
    pub jsonrpc: String,
    /// The result on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// The error on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    /// Request identifier, echoed from the request.
    pub id: Value,
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Numeric error code.
    pub code: i32,
    /// Short human-readable error description.
    pub message: String,
    /// Optional structured error data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

const INVALID_REQUEST: i32 = -32600;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;
const LEDGER_REJECTED: i32 = -32000;

impl JsonRpcError {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, format!("Invalid params: {}", message.into()))
    }

    fn rejected(err: &TokenError) -> Self {
        Self {
            code: LEDGER_REJECTED,
            message: err.to_string(),
            data: Some(serde_json::json!({ "reason": rejection_reason(err) })),
        }
    }
}

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Node software version.
    pub version: String,
    /// Network name.
    pub network: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub revision: u64,
    pub total_supply: U256,
    pub chain_id: u64,
    /// Address the token is deployed at.
    pub contract: Address,
    /// Governance address (zero if none).
    pub governance: Address,
    pub block_number: Version,
    pub block_timestamp: u64,
    /// EIP-712 domain separator permits must be signed under.
    pub domain_separator: B256,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
}

/// Response payload for `GET /accounts/:address`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub address: Address,
    pub balance: U256,
    /// Next permit nonce.
    pub nonce: U256,
    pub snapshot_count: usize,
}

/// Response payload for `GET /accounts/:address/balance/:version`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoricalBalanceResponse {
    pub address: Address,
    pub version: Version,
    pub balance: U256,
}

/// Response payload for `GET /allowances/:owner/:spender`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AllowanceResponse {
    pub owner: Address,
    pub spender: Address,
    pub allowance: U256,
}

/// Response payload for every successful mutation.
#[derive(Debug, Serialize, Deserialize)]
pub struct CallResponse {
    /// Block the call was applied in.
    pub block: Version,
    /// Events the call emitted.
    pub events: Vec<TokenEvent>,
}

/// Body of `POST /transfer`.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransferBody {
    pub from: Address,
    pub to: Address,
    pub amount: U256,
}

/// Body of `POST /approve`, `/increase_allowance` and `/decrease_allowance`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AllowanceBody {
    pub owner: Address,
    pub spender: Address,
    pub amount: U256,
}

/// Body of `POST /transfer_from`.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransferFromBody {
    pub spender: Address,
    pub from: Address,
    pub to: Address,
    pub amount: U256,
}

/// Body of `POST /permit` and the single parameter of `aset_sendPermit`.
#[derive(Debug, Serialize, Deserialize)]
pub struct PermitBody {
    pub owner: Address,
    pub spender: Address,
    pub value: U256,
    pub deadline: U256,
    /// 65-byte `r || s || v` signature, hex encoded.
    pub signature: String,
}

impl PermitBody {
    fn into_request(self) -> Result<PermitRequest, String> {
        let signature = Signature::from_hex(&self.signature).map_err(|e| e.to_string())?;
        Ok(PermitRequest {
            owner: self.owner,
            spender: self.spender,
            value: self.value,
            deadline: self.deadline,
            signature,
        })
    }
}

// ---------------------------------------------------------------------------
// Mutation Plumbing
// ---------------------------------------------------------------------------

/// Runs `call` under the write lock, then publishes the events it emitted.
async fn apply<F>(state: &AppState, call: F) -> Result<CallResponse, TokenError>
where
    F: FnOnce(&mut AsetToken) -> Result<(), TokenError>,
{
    let timer = state.metrics.call_latency_seconds.start_timer();
    let (outcome, block, events) = {
        let mut token = state.token.write().await;
        let outcome = call(&mut *token);
        let block = token.block().number;
        (outcome, block, token.drain_events())
    };
    timer.observe_duration();

    if let Err(e) = outcome {
        state.metrics.rejected_calls_total.inc();
        tracing::info!(reason = rejection_reason(&e), "call rejected: {}", e);
        return Err(e);
    }

    for event in &events {
        if matches!(event, TokenEvent::Transfer { .. }) {
            state.metrics.transfers_total.inc();
        }
        let _ = state.event_tx.send(event.clone().into());
    }
    Ok(CallResponse { block, events })
}

async fn apply_permit(state: &AppState, request: PermitRequest) -> Result<CallResponse, TokenError> {
    let result = apply(state, |token| token.submit_permit(&request)).await;
    match &result {
        Ok(_) => state.metrics.permits_accepted_total.inc(),
        Err(_) => state.metrics.permits_rejected_total.inc(),
    }
    result
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health`: returns 200 if the node is alive.
///
/// This is the liveness probe for orchestrators (k8s, systemd, etc.).
/// It intentionally does not touch the ledger lock.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status`: token metadata plus the current block.
async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    let token = state.token.read().await;
    let block = token.block();

    Json(StatusResponse {
        version: state.version.clone(),
        network: state.network.clone(),
        name: token.name().to_string(),
        symbol: token.symbol().to_string(),
        decimals: token.decimals(),
        revision: token.revision(),
        total_supply: token.total_supply(),
        chain_id: token.chain_id(),
        contract: token.address(),
        governance: token.governance(),
        block_number: block.number,
        block_timestamp: block.timestamp,
        domain_separator: token.domain_separator(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// `GET /accounts/:address`
///
/// Unknown accounts are not an error: they hold zero and have no history.
async fn account_handler(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<AccountResponse>, ApiError> {
    let address = parse_address(&address)?;
    let token = state.token.read().await;

    Ok(Json(AccountResponse {
        address,
        balance: token.balance_of(&address),
        nonce: token.nonce_of(&address),
        snapshot_count: token.snapshot_count(&address),
    }))
}

/// `GET /accounts/:address/snapshots`
async fn snapshots_handler(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<Vec<Snapshot>>, ApiError> {
    let address = parse_address(&address)?;
    let token = state.token.read().await;
    Ok(Json(token.snapshots(&address).to_vec()))
}

/// `GET /accounts/:address/snapshots/:index`
async fn snapshot_handler(
    State(state): State<AppState>,
    Path((address, index)): Path<(String, usize)>,
) -> Result<Json<Snapshot>, ApiError> {
    let address = parse_address(&address)?;
    let token = state.token.read().await;
    token.snapshot(&address, index).map(Json).ok_or_else(|| {
        ApiError::NotFound(format!("no snapshot {} for {}", index, address))
    })
}

/// `GET /accounts/:address/balance/:version`
async fn balance_at_handler(
    State(state): State<AppState>,
    Path((address, version)): Path<(String, Version)>,
) -> Result<Json<HistoricalBalanceResponse>, ApiError> {
    let address = parse_address(&address)?;
    let token = state.token.read().await;

    Ok(Json(HistoricalBalanceResponse {
        address,
        version,
        balance: token.balance_at(&address, version),
    }))
}

/// `GET /allowances/:owner/:spender`
async fn allowance_handler(
    State(state): State<AppState>,
    Path((owner, spender)): Path<(String, String)>,
) -> Result<Json<AllowanceResponse>, ApiError> {
    let owner = parse_address(&owner)?;
    let spender = parse_address(&spender)?;
    let token = state.token.read().await;

    Ok(Json(AllowanceResponse {
        owner,
        spender,
        allowance: token.allowance(&owner, &spender),
    }))
}

/// `POST /transfer`
async fn transfer_handler(
    State(state): State<AppState>,
    Json(body): Json<TransferBody>,
) -> Result<Json<CallResponse>, ApiError> {
    apply(&state, |token| token.transfer(body.from, body.to, body.amount))
        .await
        .map(Json)
        .map_err(ApiError::Rejected)
}

/// `POST /approve`
async fn approve_handler(
    State(state): State<AppState>,
    Json(body): Json<AllowanceBody>,
) -> Result<Json<CallResponse>, ApiError> {
    apply(&state, |token| token.approve(body.owner, body.spender, body.amount))
        .await
        .map(Json)
        .map_err(ApiError::Rejected)
}

/// `POST /transfer_from`
async fn transfer_from_handler(
    State(state): State<AppState>,
    Json(body): Json<TransferFromBody>,
) -> Result<Json<CallResponse>, ApiError> {
    apply(&state, |token| {
        token.transfer_from(body.spender, body.from, body.to, body.amount)
    })
    .await
    .map(Json)
    .map_err(ApiError::Rejected)
}

/// `POST /increase_allowance`
async fn increase_allowance_handler(
    State(state): State<AppState>,
    Json(body): Json<AllowanceBody>,
) -> Result<Json<CallResponse>, ApiError> {
    apply(&state, |token| {
        token.increase_allowance(body.owner, body.spender, body.amount)
    })
    .await
    .map(Json)
    .map_err(ApiError::Rejected)
}

/// `POST /decrease_allowance`
async fn decrease_allowance_handler(
    State(state): State<AppState>,
    Json(body): Json<AllowanceBody>,
) -> Result<Json<CallResponse>, ApiError> {
    apply(&state, |token| {
        token.decrease_allowance(body.owner, body.spender, body.amount)
    })
    .await
    .map(Json)
    .map_err(ApiError::Rejected)
}

/// `POST /permit`: applies a signed permit on behalf of its owner.
async fn permit_handler(
    State(state): State<AppState>,
    Json(body): Json<PermitBody>,
) -> Result<Json<CallResponse>, ApiError> {
    let request = body.into_request().map_err(ApiError::BadRequest)?;
    apply_permit(&state, request)
        .await
        .map(Json)
        .map_err(ApiError::Rejected)
}

/// `POST /rpc`: JSON-RPC 2.0 gateway.
///
/// Read methods take positional parameters. `aset_sendPermit` takes a single
/// [`PermitBody`] object. Unknown methods return error code -32601 (Method
/// not found); ledger rejections return -32000 with the rejection reason in
/// `data`.
async fn rpc_handler(
    State(state): State<AppState>,
    Json(req): Json<JsonRpcRequest>,
) -> Json<JsonRpcResponse> {
    let outcome = if req.jsonrpc != "2.0" {
        Err(JsonRpcError::new(
            INVALID_REQUEST,
            "Invalid Request: jsonrpc must be \"2.0\"",
        ))
    } else {
        match req.params {
            None => Ok(Vec::new()),
            Some(Value::Array(params)) => Ok(params),
            Some(_) => Err(JsonRpcError::invalid_params("expected a positional array")),
        }
    };

    let outcome = match outcome {
        Ok(params) if req.method == "aset_sendPermit" => send_permit(&state, params).await,
        Ok(params) => {
            let token = state.token.read().await;
            dispatch_query(&token, &req.method, &params)
        }
        Err(e) => Err(e),
    };

    let (result, error) = match outcome {
        Ok(value) => (Some(value), None),
        Err(e) => (None, Some(e)),
    };
    Json(JsonRpcResponse {
        jsonrpc: "2.0".into(),
        result,
        error,
        id: req.id,
    })
}

/// Answers the read-only JSON-RPC methods.
fn dispatch_query(token: &AsetToken, method: &str, params: &[Value]) -> Result<Value, JsonRpcError> {
    use serde_json::json;

    let value = match method {
        "aset_name" => json!(token.name()),
        "aset_symbol" => json!(token.symbol()),
        "aset_decimals" => json!(token.decimals()),
        "aset_totalSupply" => json!(token.total_supply()),
        "aset_chainId" => json!(token.chain_id()),
        "aset_blockNumber" => json!(token.block().number),
        "aset_domainSeparator" => json!(token.domain_separator()),
        "aset_balanceOf" => json!(token.balance_of(&param_address(params, 0)?)),
        "aset_balanceAt" => {
            let account = param_address(params, 0)?;
            json!(token.balance_at(&account, param_u64(params, 1)?))
        }
        "aset_snapshotCount" => json!(token.snapshot_count(&param_address(params, 0)?)),
        "aset_nonceOf" => json!(token.nonce_of(&param_address(params, 0)?)),
        "aset_allowance" => {
            let owner = param_address(params, 0)?;
            json!(token.allowance(&owner, &param_address(params, 1)?))
        }
        _ => {
            return Err(JsonRpcError::new(
                METHOD_NOT_FOUND,
                format!("Method not found: {}", method),
            ))
        }
    };
    Ok(value)
}

async fn send_permit(state: &AppState, params: Vec<Value>) -> Result<Value, JsonRpcError> {
    let body = params
        .into_iter()
        .next()
        .ok_or_else(|| JsonRpcError::invalid_params("expected [permit]"))?;
    let body: PermitBody =
        serde_json::from_value(body).map_err(|e| JsonRpcError::invalid_params(e.to_string()))?;
    let request = body.into_request().map_err(JsonRpcError::invalid_params)?;

    let response = apply_permit(state, request)
        .await
        .map_err(|e| JsonRpcError::rejected(&e))?;
    serde_json::to_value(response)
        .map_err(|e| JsonRpcError::new(-32603, format!("Internal error: {}", e)))
}

fn param_address(params: &[Value], index: usize) -> Result<Address, JsonRpcError> {
    params
        .get(index)
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| JsonRpcError::invalid_params(format!("expected address at position {}", index)))
}

/// Accepts a JSON number or a `0x`-prefixed hex quantity.
fn param_u64(params: &[Value], index: usize) -> Result<u64, JsonRpcError> {
    let value = params.get(index);
    value
        .and_then(Value::as_u64)
        .or_else(|| {
            value
                .and_then(Value::as_str)
                .and_then(|s| s.strip_prefix("0x"))
                .and_then(|hex| u64::from_str_radix(hex, 16).ok())
        })
        .ok_or_else(|| JsonRpcError::invalid_params(format!("expected quantity at position {}", index)))
}

/// `GET /ws`: WebSocket upgrade for live event streaming.
///
/// Clients receive JSON-encoded [`NodeEvent`] messages for each new block
/// and each token event. The connection is read-only from the server's
/// perspective; client messages are ignored.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

/// Drives a single WebSocket connection, forwarding broadcast events
/// until the client disconnects or the channel is closed.
async fn handle_ws_connection(mut socket: WebSocket, state: AppState) {
    let mut rx = state.event_tx.subscribe();

    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Ok(ev) => {
                        let payload = match serde_json::to_string(&ev) {
                            Ok(s) => s,
                            Err(e) => {
                                tracing::warn!("failed to serialize ws event: {}", e);
                                continue;
                            }
                        };
                        if socket.send(Message::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("ws subscriber lagged by {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(_)) => {}
                    _ => break,
                }
            }
        }
    }
}
