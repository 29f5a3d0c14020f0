//! In-process WebSocket node for integration tests.
//!
//! Speaks the same request/response protocol as a real node: requests
//! carry `id` and `command`, responses echo the `id` with a `status` and
//! either a `result` payload or an `error` code. State is a flat map of
//! accounts plus a log of validated transactions, enough to exercise the
//! full submit/poll/refresh pipeline without a ledger.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::Message};

use mptw_client::SessionConfig;
use mptw_crypto::hash_transaction;

#[derive(Default)]
pub struct NodeState {
    /// address -> (balance in drops, sequence)
    pub accounts: HashMap<String, (u128, u32)>,
    /// tx hash -> final result code
    pub txs: HashMap<String, String>,
    pub ledger_index: u64,
    /// When set, every submitted transaction validates with this code.
    pub reject_code: Option<String>,
    /// The last transaction JSON decoded from a submitted blob.
    pub last_submitted: Option<Value>,
}

pub struct MockNode {
    pub url: String,
    pub state: Arc<Mutex<NodeState>>,
}

impl MockNode {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        let state = Arc::new(Mutex::new(NodeState {
            ledger_index: 1,
            ..NodeState::default()
        }));

        let accept_state = state.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve_connection(stream, accept_state.clone()));
            }
        });

        Self { url, state }
    }

    /// Seed an account directly into ledger state.
    pub fn credit(&self, address: &str, balance: u128, sequence: u32) {
        self.state
            .lock()
            .unwrap()
            .accounts
            .insert(address.to_string(), (balance, sequence));
    }

    pub fn balance(&self, address: &str) -> Option<u128> {
        self.state
            .lock()
            .unwrap()
            .accounts
            .get(address)
            .map(|(b, _)| *b)
    }

    pub fn reject_with(&self, code: &str) {
        self.state.lock().unwrap().reject_code = Some(code.to_string());
    }

    pub fn last_submitted(&self) -> Option<Value> {
        self.state.lock().unwrap().last_submitted.clone()
    }

    /// A session config pointed at this node with test-friendly timings.
    pub fn config(&self) -> SessionConfig {
        SessionConfig {
            endpoint: self.url.clone(),
            request_timeout_secs: 5,
            finality_attempts: 10,
            finality_interval_ms: 10,
            settle_attempts: 3,
            settle_interval_ms: 10,
            ..SessionConfig::default()
        }
    }
}

async fn serve_connection(stream: TcpStream, state: Arc<Mutex<NodeState>>) {
    let Ok(mut ws) = accept_async(stream).await else {
        return;
    };

    while let Some(Ok(msg)) = ws.next().await {
        let Message::Text(text) = msg else {
            continue;
        };
        let Ok(request) = serde_json::from_str::<Value>(&text) else {
            continue;
        };
        let response = dispatch(&request, &state);
        if ws.send(Message::Text(response.to_string())).await.is_err() {
            return;
        }
    }
}

fn dispatch(request: &Value, state: &Arc<Mutex<NodeState>>) -> Value {
    let id = request.get("id").cloned().unwrap_or(Value::Null);
    let command = request.get("command").and_then(Value::as_str).unwrap_or("");
    let mut state = state.lock().unwrap();

    let outcome = match command {
        "account_info" => account_info(request, &state),
        "fee" => Ok(json!({ "drops": { "base_fee": "10" } })),
        "submit" => submit(request, &mut state),
        "tx" => tx_status(request, &state),
        "ledger" => Ok(json!({ "ledger": { "ledger_index": state.ledger_index } })),
        "ledger_accept" => {
            state.ledger_index += 1;
            Ok(json!({ "ledger_current_index": state.ledger_index }))
        }
        _ => Err("unknownCmd"),
    };

    match outcome {
        Ok(result) => json!({ "id": id, "status": "success", "result": result }),
        Err(code) => json!({ "id": id, "status": "error", "error": code }),
    }
}

fn account_info(request: &Value, state: &NodeState) -> Result<Value, &'static str> {
    let address = request
        .get("account")
        .and_then(Value::as_str)
        .ok_or("invalidParams")?;
    let (balance, sequence) = state.accounts.get(address).ok_or("actNotFound")?;
    Ok(json!({
        "account_data": {
            "Balance": balance.to_string(),
            "Sequence": sequence,
        }
    }))
}

fn submit(request: &Value, state: &mut NodeState) -> Result<Value, &'static str> {
    let blob = request
        .get("tx_blob")
        .and_then(Value::as_str)
        .ok_or("invalidParams")?;
    let tx: Value = serde_json::from_str(blob).map_err(|_| "invalidTransaction")?;
    let hash = hash_transaction(blob.as_bytes()).to_string();

    let code = state
        .reject_code
        .clone()
        .unwrap_or_else(|| "tesSUCCESS".to_string());

    if code == "tesSUCCESS" {
        apply_transaction(&tx, state);
    }
    state.txs.insert(hash, code.clone());
    state.last_submitted = Some(tx);
    Ok(json!({ "engine_result": code }))
}

/// Bump the sender's sequence; for native payments also move the drops.
fn apply_transaction(tx: &Value, state: &mut NodeState) {
    if let Some(sender) = tx.get("Account").and_then(Value::as_str) {
        if let Some(entry) = state.accounts.get_mut(sender) {
            entry.1 += 1;
        }
    }

    let native_drops = tx
        .get("Amount")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<u128>().ok());
    if let (Some(drops), Some(dest)) = (native_drops, tx.get("Destination").and_then(Value::as_str))
    {
        if let Some(sender) = tx.get("Account").and_then(Value::as_str) {
            if let Some(entry) = state.accounts.get_mut(sender) {
                entry.0 = entry.0.saturating_sub(drops);
            }
        }
        let dest_entry = state.accounts.entry(dest.to_string()).or_insert((0, 1));
        dest_entry.0 += drops;
    }
}

fn tx_status(request: &Value, state: &NodeState) -> Result<Value, &'static str> {
    let hash = request
        .get("transaction")
        .and_then(Value::as_str)
        .ok_or("invalidParams")?;
    let code = state.txs.get(hash).ok_or("txnNotFound")?;
    Ok(json!({
        "validated": true,
        "meta": { "TransactionResult": code }
    }))
}
