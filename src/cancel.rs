//! Cooperative cancellation checked at per-sample checkpoints.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{DictError, Phase, Result};

/// Cloneable flag a caller can raise to abort training or validation.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation; every clone observes it.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Returns `true` once [`CancelToken::cancel`] has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Fails with [`DictError::Cancelled`] when cancellation was requested.
    pub fn checkpoint(&self, phase: Phase) -> Result<()> {
        if self.is_cancelled() {
            Err(DictError::Cancelled { phase })
        } else {
            Ok(())
        }
    }
}
