// src/pipe/ready.rs

//! Readiness polling.
//!
//! [`PipeHandle::poll_readiness`] is the event-notification hook: it snapshots
//! both predicates under the lock and registers the caller's waker on both
//! wait sets, so the next commit of data or space (or teardown) notifies the
//! poller asynchronously. [`ReadReady`]/[`WriteReady`] wrap the same
//! registration as plain futures. None of this ever suspends.

use super::PipeHandle;
use crate::error::PipeError;

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};

/// A snapshot of a pipe's read/write availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Readiness {
  /// `true` iff at least one committed byte is readable.
  pub readable: bool,
  /// `true` iff at least one free slot is writable.
  pub writable: bool,
}

fn register(set: &mut Vec<Waker>, waker: &Waker) {
  if !set.iter().any(|w| w.will_wake(waker)) {
    set.push(waker.clone());
  }
}

impl PipeHandle {
  /// Snapshots current readiness without registering for notification.
  pub fn readiness(&self) -> Result<Readiness, PipeError> {
    let state = self.shared.state.lock();
    if state.shutdown {
      return Err(PipeError::Unavailable);
    }
    Ok(Readiness {
      readable: state.ring.readable() > 0,
      writable: state.ring.writable() > 0,
    })
  }

  /// Snapshots current readiness and registers `waker` on both wait sets, so
  /// a later state change on either side notifies the caller. Wakers are
  /// deduplicated by [`Waker::will_wake`]; registration is one-shot and is
  /// consumed by the wake.
  pub fn poll_readiness(&self, waker: &Waker) -> Result<Readiness, PipeError> {
    let mut state = self.shared.state.lock();
    if state.shutdown {
      return Err(PipeError::Unavailable);
    }
    register(&mut state.data_wakers, waker);
    register(&mut state.space_wakers, waker);
    Ok(Readiness {
      readable: state.ring.readable() > 0,
      writable: state.ring.writable() > 0,
    })
  }

  /// Resolves once at least one byte is readable, or with `Unavailable` if
  /// the pipe is torn down first.
  pub fn readable(&self) -> ReadReady<'_> {
    ReadReady { handle: self }
  }

  /// Resolves once at least one slot is writable, or with `Unavailable` if
  /// the pipe is torn down first.
  pub fn writable(&self) -> WriteReady<'_> {
    WriteReady { handle: self }
  }
}

/// Future returned by [`PipeHandle::readable`].
#[derive(Debug)]
#[must_use = "futures do nothing unless polled"]
pub struct ReadReady<'a> {
  handle: &'a PipeHandle,
}

impl Future for ReadReady<'_> {
  type Output = Result<(), PipeError>;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let mut state = self.handle.shared.state.lock();
    if state.shutdown {
      return Poll::Ready(Err(PipeError::Unavailable));
    }
    if state.ring.readable() > 0 {
      return Poll::Ready(Ok(()));
    }
    register(&mut state.data_wakers, cx.waker());
    Poll::Pending
  }
}

/// Future returned by [`PipeHandle::writable`].
#[derive(Debug)]
#[must_use = "futures do nothing unless polled"]
pub struct WriteReady<'a> {
  handle: &'a PipeHandle,
}

impl Future for WriteReady<'_> {
  type Output = Result<(), PipeError>;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let mut state = self.handle.shared.state.lock();
    if state.shutdown {
      return Poll::Ready(Err(PipeError::Unavailable));
    }
    if state.ring.writable() > 0 {
      return Poll::Ready(Ok(()));
    }
    register(&mut state.space_wakers, cx.waker());
    Poll::Pending
  }
}
