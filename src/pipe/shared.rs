// src/pipe/shared.rs

//! The shared core of a single pipe.
//!
//! One `parking_lot::Mutex` guards the ring and everything that hangs off it;
//! no cursor or storage mutation ever happens outside it. Two condition
//! variables are the wait sets: `data_available` for blocked readers,
//! `space_available` for blocked writers. Readiness pollers register plain
//! `Waker`s alongside the condvars, mirroring the split between synchronous
//! and asynchronous waiters in the channel designs this crate grew out of.
//! Wakes happen after the lock is dropped wherever possible.

use crate::error::PipeError;
use crate::ring::RingBuffer;
use crate::trace::TraceSink;

use core::fmt;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::task::Waker;

pub(crate) struct PipeState {
  pub(crate) ring: RingBuffer,
  /// Set exactly once, at teardown. Checked before any ring access.
  pub(crate) shutdown: bool,
  /// Readiness pollers awaiting data. Drained (and woken) on every commit of
  /// new bytes and on teardown.
  pub(crate) data_wakers: Vec<Waker>,
  /// Readiness pollers awaiting space. Symmetric to `data_wakers`.
  pub(crate) space_wakers: Vec<Waker>,
}

pub(crate) struct PipeShared {
  pub(crate) state: Mutex<PipeState>,
  pub(crate) data_available: Condvar,
  pub(crate) space_available: Condvar,
  /// Total backing-store length, immutable; survives teardown for reporting.
  pub(crate) capacity: usize,
  /// Stable per-instance label, diagnostics only.
  pub(crate) label: String,
  sink: Option<Arc<dyn TraceSink>>,
}

impl fmt::Debug for PipeShared {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let state = self.state.lock();
    f.debug_struct("PipeShared")
      .field("label", &self.label)
      .field("shutdown", &state.shutdown)
      .field("readable", &if state.shutdown { 0 } else { state.ring.readable() })
      .finish()
  }
}

impl PipeShared {
  pub(crate) fn new(
    capacity: usize,
    label: String,
    sink: Option<Arc<dyn TraceSink>>,
  ) -> Result<Arc<Self>, PipeError> {
    let ring = RingBuffer::with_capacity(capacity)?;
    let capacity = ring.capacity();
    Ok(Arc::new(PipeShared {
      state: Mutex::new(PipeState {
        ring,
        shutdown: false,
        data_wakers: Vec::new(),
        space_wakers: Vec::new(),
      }),
      data_available: Condvar::new(),
      space_available: Condvar::new(),
      capacity,
      label,
      sink,
    }))
  }

  pub(crate) fn emit(&self, line: fmt::Arguments<'_>) {
    if let Some(sink) = &self.sink {
      sink.trace(line);
    }
  }

  /// Broadcasts both wait sets so suspended callers re-check their
  /// predicates. Used by cancellation; the waiters themselves decide whether
  /// they are the cancelled party.
  pub(crate) fn interrupt_waiters(&self) {
    // Notify under the lock: a waiter between its predicate check and its
    // suspend holds the mutex, so this cannot slip into that window.
    let _state = self.state.lock();
    self.data_available.notify_all();
    self.space_available.notify_all();
  }

  /// Terminates the pipe: releases storage, then wakes everything so blocked
  /// callers and pollers observe `Unavailable`. Idempotent.
  pub(crate) fn shutdown(&self) {
    let wakers = {
      let mut state = self.state.lock();
      if state.shutdown {
        return;
      }
      state.shutdown = true;
      state.ring.release();
      let mut wakers = std::mem::take(&mut state.data_wakers);
      wakers.append(&mut state.space_wakers);
      self.data_available.notify_all();
      self.space_available.notify_all();
      wakers
    };
    for waker in wakers {
      waker.wake();
    }
    self.emit(format_args!("{}: removed", self.label));
  }

  pub(crate) fn is_shutdown(&self) -> bool {
    self.state.lock().shutdown
  }
}
