//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGINT/SIGTERM → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → every subscribed confirmation wait returns Cancelled
//!             → in-flight submissions complete, no new wallet is started
//! ```
//!
//! # Design Decisions
//! - Cancelling a wait never retracts a submitted transaction
//! - A second signal exits immediately

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
