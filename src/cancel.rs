// src/cancel.rs

//! Cooperative cancellation for blocking calls.
//!
//! The original design this crate descends from tied interruptible sleeps to
//! OS signal delivery. Here that is a caller-supplied token: a blocking
//! read/write checks it before suspending and on every wake, and `cancel()`
//! wakes any pipe the token is attached to so the check happens promptly.

use crate::pipe::shared::PipeShared;

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

#[derive(Debug, Default)]
struct CancelInner {
  cancelled: AtomicBool,
  // Pipes with a call currently (or recently) blocked against this token.
  // Weak: a token must never extend a pipe's lifetime past pool teardown.
  attached: Mutex<Vec<Weak<PipeShared>>>,
}

/// A cloneable cancellation token for blocking pipe operations.
///
/// All clones observe the same state; cancelling any clone cancels them all.
/// Cancellation is sticky: once cancelled, every subsequent interruptible
/// call fails with [`PipeError::Interrupted`](crate::PipeError::Interrupted)
/// until the caller makes a new token.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
  inner: Arc<CancelInner>,
}

impl CancelToken {
  pub fn new() -> Self {
    Self::default()
  }

  /// Flags the token as cancelled and wakes every attached pipe's wait sets
  /// so suspended callers re-check and return `Interrupted`.
  pub fn cancel(&self) {
    self.inner.cancelled.store(true, Ordering::Release);
    let attached = std::mem::take(&mut *self.inner.attached.lock());
    for weak in attached {
      if let Some(shared) = weak.upgrade() {
        shared.interrupt_waiters();
      }
    }
  }

  pub fn is_cancelled(&self) -> bool {
    self.inner.cancelled.load(Ordering::Acquire)
  }

  /// Records `shared` as a wake target for `cancel()`. Called by the pipe
  /// before it takes the pipe lock, so the token registry lock and the pipe
  /// lock are never held together from this side.
  pub(crate) fn attach(&self, shared: &Arc<PipeShared>) {
    let mut attached = self.inner.attached.lock();
    let target = Arc::downgrade(shared);
    if !attached.iter().any(|w| w.ptr_eq(&target)) {
      attached.push(target);
    }
  }
}
