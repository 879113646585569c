//! Contract-call client for a JSON-RPC ledger.
//!
//! Builds contract-call transactions, signs their canonical encoding with
//! Ed25519, submits them and optionally polls for confirmation.

pub mod blockchain;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use blockchain::{ContractExecutor, RpcClient, Wallet};
pub use config::schema::ClientConfig;
pub use lifecycle::Shutdown;
