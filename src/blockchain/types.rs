//! Ledger-facing types and error definitions.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while building, submitting or tracking transactions.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Private key bytes are not a valid Ed25519 secret.
    #[error("Invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// The ledger does not know this address.
    #[error("Wallet {address} not found on ledger")]
    WalletNotFound { address: String },

    /// Network failure, timeout or non-2xx status after the retry budget.
    #[error("RPC unavailable at {url} after {attempts} attempt(s): {last_error}")]
    RpcUnavailable {
        url: String,
        attempts: u32,
        /// Last HTTP status seen, if the server answered.
        status: Option<u16>,
        last_error: String,
    },

    /// 2xx response whose body does not have the expected shape.
    #[error("Malformed response from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },

    /// Submission of a signed transaction failed for this wallet.
    #[error("Submission failed for wallet {address}: {source}")]
    Submission {
        address: String,
        #[source]
        source: Box<ClientError>,
    },

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Http(String),
}

impl ClientError {
    /// HTTP status of the last failed attempt, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ClientError::RpcUnavailable { status, .. } => *status,
            ClientError::Submission { source, .. } => source.http_status(),
            _ => None,
        }
    }
}

/// Result type for ledger client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Transaction status as reported by the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxStatus {
    /// Accepted but not yet included.
    Pending,
    /// Included in the ledger.
    Confirmed,
    /// The ledger has no record of the hash.
    NotFound,
    /// Any other status marker.
    Unknown(String),
}

impl TxStatus {
    /// Map the `status` field of a `/tx/{hash}` response.
    pub fn from_marker(marker: &str) -> Self {
        match marker {
            "pending" => TxStatus::Pending,
            "confirmed" => TxStatus::Confirmed,
            other => TxStatus::Unknown(other.to_string()),
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, TxStatus::Confirmed)
    }
}

/// Account state returned by `/balance/{address}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Balance {
    /// Nonce of the last transaction the ledger applied for this address.
    pub nonce: u64,
    /// Balance in raw (micro) units.
    pub raw: u128,
}

impl Balance {
    /// Raw units per whole token.
    pub const UNITS_PER_TOKEN: u128 = 1_000_000;

    /// Balance in whole tokens.
    pub fn amount(&self) -> f64 {
        self.raw as f64 / Self::UNITS_PER_TOKEN as f64
    }

    /// The nonce the next transaction from this address must carry.
    pub fn next_nonce(&self) -> Option<u64> {
        self.nonce.checked_add(1)
    }
}

/// Result of waiting for a transaction to confirm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Confirmed,
    /// Deadline elapsed; the transaction may still confirm later.
    TimedOut(Duration),
    /// The caller stopped waiting; the submitted transaction is unaffected.
    Cancelled,
}

impl WaitOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, WaitOutcome::Confirmed)
    }
}
