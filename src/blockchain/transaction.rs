//! Transaction building, signing and submission.
//!
//! # Responsibilities
//! - Fetch the wallet's current nonce
//! - Assemble the contract-call transaction and sign its canonical blob
//! - Produce the submission payload with the signed nonce and timestamp
//! - Submit once and extract the transaction hash

use std::sync::Arc;

use serde::Serialize;

use crate::blockchain::client::RpcClient;
use crate::blockchain::encoding::{encode, SignableTransaction, Timestamp};
use crate::blockchain::signer::signature_base64;
use crate::blockchain::types::{ClientError, ClientResult};
use crate::blockchain::wallet::Wallet;
use crate::observability::metrics;

/// Source of transaction timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock, rounded to microseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

/// Body of `POST /call-contract`.
///
/// The signed fields are embedded as-is, so the submitted `nonce` and
/// `timestamp` are the exact values inside the signed blob.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionPayload {
    pub contract: String,
    pub method: String,
    pub params: Vec<String>,
    pub caller: String,
    #[serde(flatten)]
    pub transaction: SignableTransaction,
    /// Base64 Ed25519 signature over the canonical blob.
    pub signature: String,
    /// Base64 Ed25519 public key of the caller.
    pub public_key: String,
}

impl SubmissionPayload {
    /// The blob the signature covers.
    pub fn signed_blob(&self) -> Vec<u8> {
        encode(&self.transaction)
    }
}

/// Builds signed contract-call transactions.
#[derive(Clone)]
pub struct TxBuilder {
    client: RpcClient,
    clock: Arc<dyn Clock>,
}

impl TxBuilder {
    pub fn new(client: RpcClient) -> Self {
        Self::with_clock(client, Arc::new(SystemClock))
    }

    pub fn with_clock(client: RpcClient, clock: Arc<dyn Clock>) -> Self {
        Self { client, clock }
    }

    /// Fetch the wallet's nonce and build a signed payload for the next one.
    ///
    /// Performs no retry of its own; the nonce read is retried by the client.
    pub async fn build(
        &self,
        wallet: &Wallet,
        contract: &str,
        method: &str,
        params: &[String],
    ) -> ClientResult<SubmissionPayload> {
        let observed = self.client.nonce(wallet.address()).await?;
        tracing::debug!(address = %wallet.address(), observed_nonce = observed, "Nonce fetched");

        if let Some(last) = wallet.last_submitted_nonce() {
            if observed < last {
                tracing::warn!(
                    address = %wallet.address(),
                    observed_nonce = observed,
                    last_submitted = last,
                    "Ledger has not applied the previous transaction; nonce may be reused"
                );
            }
        }

        self.build_with_nonce(wallet, contract, method, params, observed)
    }

    /// Build and sign a payload from an already observed nonce.
    ///
    /// Fails with `MalformedResponse` when the observed nonce has no successor.
    pub fn build_with_nonce(
        &self,
        wallet: &Wallet,
        contract: &str,
        method: &str,
        params: &[String],
        observed_nonce: u64,
    ) -> ClientResult<SubmissionPayload> {
        let nonce = observed_nonce
            .checked_add(1)
            .ok_or_else(|| ClientError::MalformedResponse {
                url: self.client.url(&format!("/balance/{}", wallet.address())),
                reason: format!("nonce {} cannot be incremented", observed_nonce),
            })?;
        let transaction =
            SignableTransaction::contract_call(wallet.address(), contract, nonce, self.clock.now());

        let blob = encode(&transaction);
        let signature = wallet.keys().sign(&blob);

        Ok(SubmissionPayload {
            contract: contract.to_string(),
            method: method.to_string(),
            params: params.to_vec(),
            caller: wallet.address().to_string(),
            transaction,
            signature: signature_base64(&signature),
            public_key: wallet.keys().public_key_base64(),
        })
    }

    /// Submit a payload once and return the transaction hash.
    pub async fn submit(&self, payload: &SubmissionPayload) -> ClientResult<String> {
        let path = "/call-contract";
        let response = match self.client.submit(path, payload).await {
            Ok(response) => response,
            Err(e) => {
                metrics::record_submission("failed");
                return Err(e);
            }
        };

        match response.get("tx_hash").and_then(|v| v.as_str()) {
            Some(hash) if !hash.is_empty() => {
                metrics::record_submission("accepted");
                Ok(hash.to_string())
            }
            _ => {
                metrics::record_submission("rejected");
                Err(ClientError::MalformedResponse {
                    url: self.client.url(path),
                    reason: format!("no 'tx_hash' in response: {}", response),
                })
            }
        }
    }

    pub fn client(&self) -> &RpcClient {
        &self.client
    }
}
