// SPDX-License-Identifier: GPL-3.0-only

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;

/// Write-once stop signal shared by the loops, pending completions and the
/// result sink. The first `set` wins; waiters are woken immediately.
#[derive(Debug, Clone, Default)]
pub struct StopLatch {
    inner: Arc<LatchInner>,
}

#[derive(Debug, Default)]
struct LatchInner {
    set: AtomicBool,
    token: CancellationToken,
}

impl StopLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the latch. Returns `true` only for the first caller.
    pub fn set(&self) -> bool {
        let first = !self.inner.set.swap(true, Ordering::SeqCst);
        self.inner.token.cancel();
        first
    }

    pub fn is_set(&self) -> bool {
        self.inner.set.load(Ordering::SeqCst)
    }

    /// Resolves once the latch is set
    pub async fn stopped(&self) {
        self.inner.token.cancelled().await
    }
}
