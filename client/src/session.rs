//! Caller-owned wallet session.
//!
//! A `Session` wires the connection manager, account cache, signer,
//! history ledger and configuration into the public operation surface.
//! There is no process-wide state: independent sessions coexist freely.
//!
//! Every operation that reaches the build/submit stage records exactly
//! one history entry, success or failure. Fail-fast precondition errors
//! (`NotReady`, strict-mode flag validation) record nothing because no
//! operation was meaningfully attempted.

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use mptw_crypto::{generate_keypair, keypair_from_mnemonic, keypair_from_seed, validate_mnemonic};
use mptw_types::{Address, Amount, KeyPair, TxHash};

use crate::account::Account;
use crate::config::SessionConfig;
use crate::connection::{ConnectionManager, ConnectionState, RpcError};
use crate::error::ClientError;
use crate::flags::encode_flags;
use crate::history::{HistoryLedger, RecordKind, TransactionRecord};
use crate::rpc::{AccountInfoResult, FeeResult, LedgerResult, SubmitResult, TxStatusResult, RESULT_SUCCESS};
use crate::signer::{LocalSigner, SignedTransaction, Signer};
use crate::transaction::{IssuanceCreate, IssuanceParams, Payment, PaymentAmount, TokenPaymentParams};

/// The definitive fate of a submitted transaction.
///
/// A ledger rejection is a normal outcome, not an error: `success` is
/// false and `result_code` carries the node's verdict verbatim.
#[derive(Clone, Debug)]
pub struct SubmitOutcome {
    pub hash: TxHash,
    pub result_code: String,
    pub success: bool,
}

/// One wallet session against one ledger node.
pub struct Session {
    config: SessionConfig,
    connection: ConnectionManager,
    account: Option<Account>,
    signer: Option<LocalSigner>,
    history: HistoryLedger,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        let connection = ConnectionManager::new(config.request_timeout());
        Self {
            config,
            connection,
            account: None,
            signer: None,
            history: HistoryLedger::new(),
        }
    }

    // ── Observable state ────────────────────────────────────────────────

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub fn account(&self) -> Option<&Account> {
        self.account.as_ref()
    }

    pub fn is_account_loaded(&self) -> bool {
        self.signer.is_some()
    }

    pub fn history(&self) -> &HistoryLedger {
        &self.history
    }

    pub fn recent(&self, n: usize) -> Vec<&TransactionRecord> {
        self.history.recent(n).collect()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn export_history(&self, path: &std::path::Path) -> Result<(), ClientError> {
        self.history.export_to_file(path)
    }

    // ── Connection lifecycle ────────────────────────────────────────────

    /// Connect to the configured endpoint.
    pub async fn connect(&mut self) -> Result<(), ClientError> {
        let endpoint = self.config.endpoint.clone();
        self.connect_to(&endpoint).await
    }

    /// Connect to an explicit endpoint, replacing any existing handle.
    pub async fn connect_to(&mut self, endpoint: &str) -> Result<(), ClientError> {
        match self.connection.connect(endpoint).await {
            Ok(()) => {
                info!(endpoint, "connected to node");
                self.history.record(TransactionRecord::success(
                    RecordKind::Connection,
                    json!({ "server": endpoint }),
                ));
                Ok(())
            }
            Err(e) => {
                warn!(endpoint, "connection failed: {e}");
                self.history.record(TransactionRecord::error(
                    RecordKind::Connection,
                    json!({ "server": endpoint, "error": e.to_string() }),
                ));
                Err(e)
            }
        }
    }

    /// Release the connection and clear the session's account and key
    /// material. Idempotent.
    pub async fn disconnect(&mut self) {
        self.connection.disconnect().await;
        self.reset_account();
    }

    /// Drop the active account and its signing capability.
    pub fn reset_account(&mut self) {
        self.account = None;
        self.signer = None;
    }

    // ── Account state cache ─────────────────────────────────────────────

    /// Create a fresh account locally. No network dependency; the account
    /// starts unfunded (balance 0, sequence 0).
    pub fn generate_account(&mut self) -> Address {
        let signer = LocalSigner::new(generate_keypair());
        let account = Account::new(signer.address().clone(), signer.public_key().clone());
        let address = account.address.clone();

        info!(%address, "generated account");
        self.history.record(TransactionRecord::success(
            RecordKind::AccountGenerated,
            json!({ "address": address.as_str() }),
        ));
        self.account = Some(account);
        self.signer = Some(signer);
        address
    }

    /// Load an account from a secret: a 64-character hex seed or a BIP39
    /// mnemonic. Syncs balance/sequence immediately when connected.
    pub async fn load_account(&mut self, secret: &str) -> Result<Address, ClientError> {
        let keypair = match derive_keypair(secret) {
            Ok(kp) => kp,
            Err(e) => {
                self.history.record(TransactionRecord::error(
                    RecordKind::AccountLoaded,
                    json!({ "error": e.to_string() }),
                ));
                return Err(e);
            }
        };

        let signer = LocalSigner::new(keypair);
        let account = Account::new(signer.address().clone(), signer.public_key().clone());
        let address = account.address.clone();
        self.account = Some(account);
        self.signer = Some(signer);

        if self.connection.is_connected() {
            self.refresh().await;
        }

        info!(%address, "loaded account");
        self.history.record(TransactionRecord::success(
            RecordKind::AccountLoaded,
            json!({ "address": address.as_str() }),
        ));
        Ok(address)
    }

    /// Synchronize the active account's balance and sequence from the node.
    ///
    /// No-op when disconnected or without an account. A failed lookup —
    /// typical for a freshly generated, not-yet-funded address — resets
    /// the cache to the unfunded default instead of erroring.
    pub async fn refresh(&mut self) {
        if !self.connection.is_connected() {
            return;
        }
        let Some(account) = self.account.as_mut() else {
            return;
        };
        let Ok(handle) = self.connection.handle_mut() else {
            return;
        };

        let params = json!({ "account": account.address.as_str() });
        match handle.request("account_info", params).await {
            Ok(raw) => match serde_json::from_value::<AccountInfoResult>(raw) {
                Ok(info) => account.apply_info(&info.account_data),
                Err(e) => {
                    debug!("malformed account_info response: {e}");
                    account.reset_unfunded();
                }
            },
            Err(e) => {
                debug!(address = %account.address, "account lookup failed: {e}");
                account.reset_unfunded();
            }
        }
    }

    /// Native balance of an arbitrary address. `Amount::ZERO` when
    /// disconnected or when the lookup fails; never an error.
    pub async fn balance_of(&mut self, address: &Address) -> Amount {
        match self.fetch_account_info(address).await {
            Some(info) => Amount::parse_drops(&info.account_data.balance).unwrap_or(Amount::ZERO),
            None => Amount::ZERO,
        }
    }

    /// Whether an address is known to the ledger. `false` when
    /// disconnected or when the lookup fails; never an error.
    pub async fn account_exists(&mut self, address: &Address) -> bool {
        self.fetch_account_info(address).await.is_some()
    }

    async fn fetch_account_info(&mut self, address: &Address) -> Option<AccountInfoResult> {
        if !self.connection.is_connected() {
            return None;
        }
        let handle = self.connection.handle_mut().ok()?;
        let raw = handle
            .request("account_info", json!({ "account": address.as_str() }))
            .await
            .ok()?;
        serde_json::from_value(raw).ok()
    }

    // ── Transaction orchestration ───────────────────────────────────────

    /// Transfer native funds from the configured funding account.
    ///
    /// The funding source's balance is checked first; the check is
    /// advisory — a raced real-ledger rejection still flows through the
    /// normal result-code path.
    pub async fn fund_account(
        &mut self,
        destination: &Address,
        amount: Amount,
    ) -> Result<SubmitOutcome, ClientError> {
        if !self.connection.is_connected() {
            return Err(ClientError::NotReady("not connected to a node"));
        }

        match self.fund_inner(destination, amount).await {
            Ok((outcome, funding_address)) => {
                info!(%destination, code = %outcome.result_code, "funding settled");
                self.history.record(TransactionRecord::new(
                    RecordKind::AccountFunded,
                    outcome.hash.to_string(),
                    outcome.result_code.clone(),
                    json!({
                        "destination": destination.as_str(),
                        "amount": format!("{} MPX", amount.to_display()),
                        "funding_account": funding_address.as_str(),
                    }),
                ));
                if outcome.success && self.account.as_ref().map(|a| &a.address) == Some(destination)
                {
                    self.settle_refresh().await;
                }
                Ok(outcome)
            }
            Err(e) => {
                self.history.record(TransactionRecord::error(
                    RecordKind::AccountFunded,
                    json!({ "destination": destination.as_str(), "error": e.to_string() }),
                ));
                Err(e)
            }
        }
    }

    async fn fund_inner(
        &mut self,
        destination: &Address,
        amount: Amount,
    ) -> Result<(SubmitOutcome, Address), ClientError> {
        let funding = LocalSigner::from_seed_hex(&self.config.funding_seed)?;
        let funding_address = funding.address().clone();

        let available = self.balance_of(&funding_address).await;
        if available < amount {
            return Err(ClientError::InsufficientFunding {
                needed: amount,
                available,
            });
        }

        let mut tx = Payment::new(&funding_address, destination, PaymentAmount::native(amount))
            .to_value()?;
        self.autofill(&mut tx, &funding_address).await?;
        let signed = funding.sign_transaction(&tx)?;
        let outcome = self.submit_and_wait(&signed).await?;
        Ok((outcome, funding_address))
    }

    /// Create a token issuance from the active account.
    pub async fn create_issuance(
        &mut self,
        params: &IssuanceParams,
    ) -> Result<SubmitOutcome, ClientError> {
        self.require_signing_ready()?;
        // Strict-mode validation is fail-fast: a typo'd capability name
        // aborts before anything is built or recorded.
        let flags = encode_flags(&params.flags, self.config.flag_mode)?;

        match self.issue_inner(params, flags).await {
            Ok((prepared, outcome)) => {
                info!(code = %outcome.result_code, "issuance settled");
                self.history.record(TransactionRecord::new(
                    RecordKind::IssuanceCreate,
                    outcome.hash.to_string(),
                    outcome.result_code.clone(),
                    json!({ "transaction": prepared }),
                ));
                if outcome.success {
                    self.settle_refresh().await;
                }
                Ok(outcome)
            }
            Err(e) => {
                self.history.record(TransactionRecord::error(
                    RecordKind::IssuanceCreate,
                    json!({ "error": e.to_string() }),
                ));
                Err(e)
            }
        }
    }

    async fn issue_inner(
        &mut self,
        params: &IssuanceParams,
        flags: u32,
    ) -> Result<(Value, SubmitOutcome), ClientError> {
        let address = self.signing_address()?;
        let mut tx = IssuanceCreate::new(&address, params, flags).to_value()?;
        self.autofill(&mut tx, &address).await?;
        let signed = self.sign_with_session_key(&tx)?;
        let outcome = self.submit_and_wait(&signed).await?;
        Ok((tx, outcome))
    }

    /// Send issued tokens from the active account.
    pub async fn send_token_payment(
        &mut self,
        params: &TokenPaymentParams,
    ) -> Result<SubmitOutcome, ClientError> {
        self.require_signing_ready()?;

        match self.pay_inner(params).await {
            Ok((prepared, outcome)) => {
                info!(destination = %params.destination, code = %outcome.result_code, "token payment settled");
                self.history.record(TransactionRecord::new(
                    RecordKind::TokenPayment,
                    outcome.hash.to_string(),
                    outcome.result_code.clone(),
                    json!({ "transaction": prepared }),
                ));
                if outcome.success {
                    self.settle_refresh().await;
                }
                Ok(outcome)
            }
            Err(e) => {
                self.history.record(TransactionRecord::error(
                    RecordKind::TokenPayment,
                    json!({ "error": e.to_string() }),
                ));
                Err(e)
            }
        }
    }

    async fn pay_inner(
        &mut self,
        params: &TokenPaymentParams,
    ) -> Result<(Value, SubmitOutcome), ClientError> {
        let address = self.signing_address()?;
        let mut payment = Payment::new(
            &address,
            &params.destination,
            PaymentAmount::token(&params.amount, &params.issuance_id),
        );
        if let Some(memo) = &params.memo {
            payment = payment.with_memo(memo);
        }
        let mut tx = payment.to_value()?;
        self.autofill(&mut tx, &address).await?;
        let signed = self.sign_with_session_key(&tx)?;
        let outcome = self.submit_and_wait(&signed).await?;
        Ok((tx, outcome))
    }

    // ── Ledger queries and standalone tooling ───────────────────────────

    /// Index of the latest validated ledger.
    pub async fn validated_ledger_index(&mut self) -> Result<u64, ClientError> {
        let handle = self.connection.handle_mut()?;
        let raw = handle
            .request("ledger", json!({ "ledger_index": "validated" }))
            .await
            .map_err(|e| ClientError::Node(e.to_string()))?;
        let ledger: LedgerResult =
            serde_json::from_value(raw).map_err(|e| ClientError::Node(e.to_string()))?;
        Ok(ledger.ledger.ledger_index)
    }

    /// Ask a standalone node to close the current ledger. Auxiliary
    /// tooling only; a consensus network closes ledgers by itself.
    pub async fn advance_ledger(&mut self) -> Result<(), ClientError> {
        let handle = self.connection.handle_mut()?;
        handle
            .request("ledger_accept", json!({}))
            .await
            .map_err(|e| ClientError::Node(e.to_string()))?;
        Ok(())
    }

    // ── Pipeline stages ─────────────────────────────────────────────────

    fn require_signing_ready(&self) -> Result<(), ClientError> {
        if !self.connection.is_connected() {
            return Err(ClientError::NotReady("not connected to a node"));
        }
        if self.signer.is_none() {
            return Err(ClientError::NotReady("no account loaded"));
        }
        Ok(())
    }

    fn signing_address(&self) -> Result<Address, ClientError> {
        self.signer
            .as_ref()
            .map(|s| s.address().clone())
            .ok_or(ClientError::NotReady("no account loaded"))
    }

    fn sign_with_session_key(&self, tx: &Value) -> Result<SignedTransaction, ClientError> {
        let signer = self
            .signer
            .as_ref()
            .ok_or(ClientError::NotReady("no account loaded"))?;
        signer.sign_transaction(tx)
    }

    /// Fill ledger-determined fields (`Fee`, `Sequence`) by querying the
    /// node. Any failure here means the transaction never existed as far
    /// as the ledger is concerned.
    async fn autofill(&mut self, tx: &mut Value, account: &Address) -> Result<(), ClientError> {
        let handle = self.connection.handle_mut()?;

        let fee_raw = handle
            .request("fee", json!({}))
            .await
            .map_err(|e| ClientError::Autofill(e.to_string()))?;
        let fee: FeeResult =
            serde_json::from_value(fee_raw).map_err(|e| ClientError::Autofill(e.to_string()))?;

        let info_raw = handle
            .request("account_info", json!({ "account": account.as_str() }))
            .await
            .map_err(|e| ClientError::Autofill(e.to_string()))?;
        let info: AccountInfoResult =
            serde_json::from_value(info_raw).map_err(|e| ClientError::Autofill(e.to_string()))?;

        let obj = tx
            .as_object_mut()
            .ok_or_else(|| ClientError::Build("transaction must be a JSON object".to_string()))?;
        obj.insert("Fee".to_string(), json!(fee.drops.base_fee));
        obj.insert("Sequence".to_string(), json!(info.account_data.sequence));
        Ok(())
    }

    /// Submit a signed blob and block until the ledger reports a final
    /// result: poll `tx` until the transaction is validated or the
    /// attempt budget runs out.
    async fn submit_and_wait(
        &mut self,
        signed: &SignedTransaction,
    ) -> Result<SubmitOutcome, ClientError> {
        let handle = self.connection.handle_mut()?;
        let raw = handle
            .request("submit", json!({ "tx_blob": signed.blob }))
            .await
            .map_err(|e| ClientError::Submission(e.to_string()))?;
        let submit: SubmitResult =
            serde_json::from_value(raw).map_err(|e| ClientError::Submission(e.to_string()))?;
        debug!(hash = %signed.hash, provisional = %submit.engine_result, "submitted");

        let hash_str = signed.hash.to_string();
        for attempt in 0..self.config.finality_attempts {
            let handle = self.connection.handle_mut()?;
            match handle.request("tx", json!({ "transaction": hash_str })).await {
                Ok(raw) => {
                    if let Ok(status) = serde_json::from_value::<TxStatusResult>(raw) {
                        if status.validated {
                            let result_code = status.meta.transaction_result;
                            return Ok(SubmitOutcome {
                                hash: signed.hash,
                                success: result_code == RESULT_SUCCESS,
                                result_code,
                            });
                        }
                    }
                }
                // Not yet known to the ledger; keep polling.
                Err(RpcError::Node(_)) => {}
                Err(RpcError::Transport(msg)) => return Err(ClientError::Submission(msg)),
            }
            debug!(hash = %hash_str, attempt, "awaiting validation");
            tokio::time::sleep(self.config.finality_interval()).await;
        }

        Err(ClientError::Submission(format!(
            "transaction {hash_str} not validated after {} attempts",
            self.config.finality_attempts
        )))
    }

    /// Post-success cache refresh: poll until the account's balance or
    /// sequence visibly changed, bounded by the configured budget. Gives
    /// up silently; the next explicit refresh will catch up.
    async fn settle_refresh(&mut self) {
        let Some(account) = self.account.as_ref() else {
            return;
        };
        let before = (account.balance, account.sequence);

        for _ in 0..self.config.settle_attempts {
            tokio::time::sleep(self.config.settle_interval()).await;
            self.refresh().await;
            if let Some(account) = self.account.as_ref() {
                if (account.balance, account.sequence) != before {
                    return;
                }
            }
        }
        debug!("settlement not observed within attempt budget");
    }
}

/// Derive a keypair from a caller-supplied secret: a BIP39 mnemonic or a
/// 64-character hex seed.
fn derive_keypair(secret: &str) -> Result<KeyPair, ClientError> {
    let secret = secret.trim();
    if validate_mnemonic(secret) {
        return keypair_from_mnemonic(secret).map_err(|e| ClientError::Key(e.to_string()));
    }

    let bytes = hex::decode(secret)
        .map_err(|_| ClientError::Key("secret must be a 64-char hex seed or BIP39 mnemonic".to_string()))?;
    let seed: [u8; 32] = bytes
        .try_into()
        .map_err(|_| ClientError::Key("hex seed must be 32 bytes".to_string()))?;
    Ok(keypair_from_seed(&seed))
}
