//! Wallet management.
//!
//! # Security
//! - Keys are never logged or serialized
//! - Key files are read once; nothing is written back

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use crate::blockchain::signer::KeyMaterial;
use crate::blockchain::types::ClientError;

/// A ledger address with its signing keys.
///
/// Clones share the submission lock and the last-submitted nonce, so a
/// wallet handed to several tasks still submits one transaction at a time.
#[derive(Debug, Clone)]
pub struct Wallet {
    address: String,
    keys: Arc<KeyMaterial>,
    /// Held from nonce fetch through submission.
    submit_lock: Arc<Mutex<()>>,
    /// Last nonce submitted from this process. 0 = none yet.
    last_submitted_nonce: Arc<AtomicU64>,
}

impl Wallet {
    pub fn new(address: impl Into<String>, keys: KeyMaterial) -> Self {
        Self {
            address: address.into(),
            keys: Arc::new(keys),
            submit_lock: Arc::new(Mutex::new(())),
            last_submitted_nonce: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Create a wallet from an address and a base64 private key.
    pub fn from_base64_key(address: &str, private_key_b64: &str) -> Result<Self, ClientError> {
        let keys = KeyMaterial::from_base64(private_key_b64)?;
        Ok(Self::new(address.trim(), keys))
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn keys(&self) -> &KeyMaterial {
        &self.keys
    }

    /// Shortened address for log lines (`oct12345...abcdef`).
    pub fn short_address(&self) -> String {
        let chars: Vec<char> = self.address.chars().collect();
        if chars.len() <= 14 {
            return self.address.clone();
        }
        let head: String = chars[..8].iter().collect();
        let tail: String = chars[chars.len() - 6..].iter().collect();
        format!("{}...{}", head, tail)
    }

    /// Acquire exclusive submission rights for this wallet.
    pub async fn lock_submissions(&self) -> MutexGuard<'_, ()> {
        self.submit_lock.lock().await
    }

    pub fn last_submitted_nonce(&self) -> Option<u64> {
        match self.last_submitted_nonce.load(Ordering::SeqCst) {
            0 => None,
            n => Some(n),
        }
    }

    pub fn record_submitted_nonce(&self, nonce: u64) {
        self.last_submitted_nonce.fetch_max(nonce, Ordering::SeqCst);
    }
}

/// Errors loading the wallet list.
#[derive(Debug, thiserror::Error)]
pub enum WalletFileError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Mismatch between number of addresses ({addresses}) and private keys ({keys})")]
    CountMismatch { addresses: usize, keys: usize },

    #[error("Private key on line {line}: {source}")]
    InvalidKey {
        line: usize,
        #[source]
        source: ClientError,
    },

    #[error("No wallets found")]
    Empty,
}

/// Load wallets from an address list and an order-matched base64 key list.
///
/// Blank lines are ignored in both files.
pub fn load_wallets(address_file: &Path, key_file: &Path) -> Result<Vec<Wallet>, WalletFileError> {
    let addresses = read_lines(address_file)?;
    let keys = read_lines(key_file)?;
    wallets_from_lines(&addresses, &keys)
}

/// Pair already-read address and key lines.
pub fn wallets_from_lines(addresses: &[String], keys: &[String]) -> Result<Vec<Wallet>, WalletFileError> {
    if addresses.len() != keys.len() {
        return Err(WalletFileError::CountMismatch {
            addresses: addresses.len(),
            keys: keys.len(),
        });
    }
    if addresses.is_empty() {
        return Err(WalletFileError::Empty);
    }

    addresses
        .iter()
        .zip(keys)
        .enumerate()
        .map(|(i, (address, key))| {
            Wallet::from_base64_key(address, key)
                .map_err(|source| WalletFileError::InvalidKey { line: i + 1, source })
        })
        .collect()
}

fn read_lines(path: &Path) -> Result<Vec<String>, WalletFileError> {
    let content = std::fs::read_to_string(path).map_err(|source| WalletFileError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
