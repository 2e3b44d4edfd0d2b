//! Email triage inbox synchronization.
//!
//! Modules:
//! - client: `InboxTransport` seam and the reqwest-backed HTTP transport
//! - gate: at-most-one-in-flight plus minimum interval
//! - retry: bounded fixed-delay retry with cache-aware fallback
//! - store: item collection and per-status counters
//! - sync: the state machine and its triggers (mount, refresh, focus, timer)
//! - poller: background refresh timer

pub mod client;
pub mod gate;
pub mod poller;
pub mod retry;
pub mod store;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{HttpTransport, InboxTransport};
pub use gate::{FetchGate, GateRejection};
pub use retry::{RetryOutcome, RetryPolicy};
pub use store::ReconciliationStore;
pub use sync::{FetchOutcome, InboxSync, Lifecycle};
