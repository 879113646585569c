//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the contract caller.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Remote ledger RPC endpoint and request timeout.
    pub rpc: RpcConfig,

    /// Retry policy for idempotent RPC reads.
    pub retries: RetryConfig,

    /// Confirmation polling settings.
    pub confirmation: ConfirmationConfig,

    /// Wallet list files.
    pub wallets: WalletFilesConfig,

    /// Contract descriptor file.
    pub contract: ContractConfig,

    /// Multi-wallet execution settings.
    pub execution: ExecutionConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// RPC endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Base URL of the ledger RPC (e.g., "https://octra.network").
    pub endpoint: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://octra.network".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Delay growth between retry attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffStrategy {
    /// Same delay (`base_delay_ms`) before every retry.
    Fixed,
    /// Doubling delay with jitter, capped at `max_delay_ms`.
    Exponential,
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts, the first one included.
    pub max_attempts: u32,

    /// Delay before a retry in milliseconds.
    pub base_delay_ms: u64,

    /// Upper bound for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// Backoff strategy.
    pub strategy: BackoffStrategy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 2000,
            max_delay_ms: 2000,
            strategy: BackoffStrategy::Fixed,
        }
    }
}

/// Confirmation polling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfirmationConfig {
    /// Interval between status polls in seconds.
    pub poll_interval_secs: u64,

    /// Give up waiting after this many seconds.
    pub timeout_secs: u64,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            timeout_secs: 100,
        }
    }
}

/// Wallet list locations. Both files hold one entry per line, order-matched.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WalletFilesConfig {
    pub address_file: String,
    pub key_file: String,
}

impl Default for WalletFilesConfig {
    fn default() -> Self {
        Self {
            address_file: "address.txt".to_string(),
            key_file: "pvt.txt".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContractConfig {
    /// Path to the contract interface descriptor (JSON).
    pub interface_file: String,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            interface_file: "exec_interface.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Wallets processed at once. 1 keeps execution strictly sequential.
    pub max_concurrent_wallets: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_concurrent_wallets: 1,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
