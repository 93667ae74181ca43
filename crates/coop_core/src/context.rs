//! Per-call cancellation and deadline propagation.
//!
//! # Responsibility
//! - Carry a shared cancel flag and an optional deadline into registry calls.
//! - Abort a running SQLite statement once the context is done.
//!
//! # Invariants
//! - Clones share the same cancel flag; cancelling any clone cancels all.
//! - A done context never reaches storage: calls fail before preparing SQL.

use rusqlite::Connection;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Number of SQLite VM instructions between cancellation checks.
const PROGRESS_CHECK_OPS: i32 = 1_000;

/// Caller-owned cancellation scope for one logical request.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Context {
    /// Context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derives a context that additionally expires after `timeout`.
    ///
    /// The derived context shares the cancel flag of `self`.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derives a context that expires at `deadline` (or earlier, if `self`
    /// already carries an earlier deadline).
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        };
        Self {
            cancelled: Arc::clone(&self.cancelled),
            deadline: Some(deadline),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns whether the context was cancelled or its deadline has passed.
    pub fn is_done(&self) -> bool {
        self.is_cancelled()
            || self
                .deadline
                .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Installs a progress handler that interrupts statements on `conn` while
    /// the returned guard is alive.
    ///
    /// Only one guard may be active per connection; the registry installs it
    /// once at the public operation boundary.
    pub(crate) fn interrupt_on<'conn>(&self, conn: &'conn Connection) -> InterruptGuard<'conn> {
        let scope = self.clone();
        conn.progress_handler(PROGRESS_CHECK_OPS, Some(move || scope.is_done()));
        InterruptGuard { conn }
    }
}

/// Removes the progress handler installed by [`Context::interrupt_on`].
pub(crate) struct InterruptGuard<'conn> {
    conn: &'conn Connection,
}

impl Drop for InterruptGuard<'_> {
    fn drop(&mut self) {
        self.conn.progress_handler(0, None::<fn() -> bool>);
    }
}
