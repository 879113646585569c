//! Ledger integration subsystem.
//!
//! # Data Flow
//! ```text
//! address.txt + pvt.txt → wallet.rs (key loading)
//! exec_interface.json   → contract.rs (method descriptors)
//!
//! executor.rs
//!     → transaction.rs  (nonce via client.rs, assemble)
//!     → encoding.rs     (canonical blob)
//!     → signer.rs       (Ed25519 signature)
//!     → client.rs       (submit once)
//!     → confirmation.rs (poll /tx/{hash} until confirmed or deadline)
//!     → view.rs         (unsigned view calls)
//! ```
//!
//! # Security Constraints
//! - Never log private keys or signatures
//! - All RPC calls have configurable timeouts
//! - Submissions are never replayed; a failed call is rebuilt with a fresh nonce

pub mod client;
pub mod confirmation;
pub mod contract;
pub mod encoding;
pub mod executor;
pub mod signer;
pub mod transaction;
pub mod types;
pub mod view;
pub mod wallet;

pub use client::RpcClient;
pub use confirmation::ConfirmationWaiter;
pub use contract::{ContractInterface, ContractMethod, DescriptorError, MethodKind, ParamSpec};
pub use encoding::{SignableTransaction, Timestamp};
pub use executor::{ConfirmMode, ContractExecutor, WalletOutcome, WalletReport};
pub use signer::KeyMaterial;
pub use transaction::{Clock, FixedClock, SubmissionPayload, SystemClock, TxBuilder};
pub use types::{Balance, ClientError, ClientResult, TxStatus, WaitOutcome};
pub use view::ViewCaller;
pub use wallet::{load_wallets, Wallet, WalletFileError};
