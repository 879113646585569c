//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Idempotent read (nonce, status, view call):
//!     → reqwest client timeout bounds every attempt
//!     → On network failure or non-2xx: retries.rs (retry with backoff.rs delay)
//!     → After max_attempts: RpcUnavailable surfaced to the caller
//!
//! Submission:
//!     → single attempt, never replayed
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Retries only for idempotent requests
//! - A stale nonce means rebuilding, not resending

pub mod backoff;
pub mod retries;

pub use retries::{run_with_retries, Attempt, RetryFailure, RetryPolicy};
