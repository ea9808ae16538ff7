//! Cooperative cancellation for query execution.
//!
//! Compilation is pure and non-blocking, so a token is only checked at I/O
//! boundaries: before issuing a compiled query to the driver, and again once
//! the driver call returns, in [`crate::executor::ExecutorBridge::execute`].
//! The [`storage::Driver`] port returns a fully materialized [`storage::Rows`]
//! rather than a true streaming cursor (see that type's doc comment), so
//! there is no "between rows" point to check at: a query already in flight
//! runs to completion and only the next boundary sees the cancellation.
//! Built on `std::sync::atomic` rather than `tokio`, matching this
//! workspace's existing preference for `parking_lot`/`std::sync` primitives
//! in synchronous crates over pulling in an async runtime.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cloneable, shareable flag that signals "stop what you're doing".
///
/// Cloning a token shares the same underlying flag: setting it via any
/// clone is observed by every other clone and the original.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Build a token that has not been cancelled.
    pub fn new() -> Self {
        CancellationToken {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Signal cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// True once [`CancellationToken::cancel`] has been called on this
    /// token or any of its clones.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
