// src/pipe/mod.rs

//! A single byte pipe and the handles that drive it.
//!
//! Each pipe is one bounded circular buffer behind one mutex. Any number of
//! concurrent producers and consumers may operate on the same pipe through
//! cloned [`PipeHandle`]s; the lock serializes cursor movement, and two
//! condition-variable wait sets (data-available, space-available) implement
//! the blocking protocol: release the lock, suspend, re-check the predicate
//! on every wake.
//!
//! Transfers are deliberately pipe-like: a read or write may return fewer
//! bytes than requested when the transfer would otherwise wrap past the end
//! of the backing store. Callers loop (or use [`PipeHandle::read_exact`] /
//! [`PipeHandle::write_all`]) to move the remainder.

pub(crate) mod shared;

mod ready;
pub use ready::{ReadReady, Readiness, WriteReady};

use crate::cancel::CancelToken;
use crate::error::PipeError;
use shared::PipeShared;

use std::io;
use std::sync::Arc;

/// Per-call behavior when the operation's predicate (data for reads, space
/// for writes) is currently unmet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
  /// Suspend until the predicate holds (or the call is cancelled).
  Blocking,
  /// Fail immediately with [`PipeError::WouldBlock`].
  NonBlocking,
}

/// A handle onto one pipe in a [`PipePool`](crate::PipePool).
///
/// Handles are cheap to clone and may be used from any thread. They stay
/// valid after the pool is torn down, but every operation on them fails with
/// [`PipeError::Unavailable`] from that point on.
#[derive(Debug, Clone)]
pub struct PipeHandle {
  pub(crate) shared: Arc<PipeShared>,
}

impl PipeHandle {
  pub(crate) fn new(shared: Arc<PipeShared>) -> Self {
    shared.emit(format_args!("open({})", shared.label));
    PipeHandle { shared }
  }

  /// Reads up to `dst.len()` bytes into `dst`, returning the count moved.
  ///
  /// Returns fewer bytes than requested when the committed data wraps past
  /// the end of the backing store; call again for the remainder.
  ///
  /// # Errors
  ///
  /// - `WouldBlock`: `NonBlocking` and the pipe is empty.
  /// - `Unavailable`: the pipe has been torn down.
  /// - `InvalidArgument`: `dst` is empty.
  pub fn read(&self, dst: &mut [u8], mode: Mode) -> Result<usize, PipeError> {
    let max = dst.len();
    self.read_commit(max, mode, None, |chunk| {
      dst[..chunk.len()].copy_from_slice(chunk);
      Ok(())
    })
  }

  /// [`read`](Self::read) with a cancellation token. The token is checked
  /// before the pipe lock is taken, before every suspension, and on every
  /// wake; a cancelled wait fails with `Interrupted` and moves no bytes.
  pub fn read_interruptible(
    &self,
    dst: &mut [u8],
    mode: Mode,
    cancel: &CancelToken,
  ) -> Result<usize, PipeError> {
    let max = dst.len();
    self.read_commit(max, mode, Some(cancel), |chunk| {
      dst[..chunk.len()].copy_from_slice(chunk);
      Ok(())
    })
  }

  /// Reads up to `max` bytes into a fallible writer.
  ///
  /// If the writer fails mid-transfer the call returns `BadAddress` and the
  /// read cursor does not move, so the bytes remain readable.
  pub fn read_to<W: io::Write>(
    &self,
    dst: &mut W,
    max: usize,
    mode: Mode,
  ) -> Result<usize, PipeError> {
    self.read_commit(max, mode, None, |chunk| dst.write_all(chunk))
  }

  /// Reads exactly `dst.len()` bytes, blocking and looping across wrap-point
  /// short reads as needed.
  pub fn read_exact(&self, dst: &mut [u8]) -> Result<(), PipeError> {
    let mut filled = 0;
    while filled < dst.len() {
      filled += self.read(&mut dst[filled..], Mode::Blocking)?;
    }
    Ok(())
  }

  /// Writes up to `src.len()` bytes, returning the count accepted.
  ///
  /// Like [`read`](Self::read), the count may be short of the request when
  /// the free space wraps past the end of the backing store.
  ///
  /// # Errors
  ///
  /// - `WouldBlock`: `NonBlocking` and the pipe has no free space.
  /// - `Unavailable`: the pipe has been torn down.
  /// - `InvalidArgument`: `src` is empty.
  pub fn write(&self, src: &[u8], mode: Mode) -> Result<usize, PipeError> {
    self.write_commit(src.len(), mode, None, |slot| {
      slot.copy_from_slice(&src[..slot.len()]);
      Ok(())
    })
  }

  /// [`write`](Self::write) with a cancellation token; see
  /// [`read_interruptible`](Self::read_interruptible) for the checking
  /// contract.
  pub fn write_interruptible(
    &self,
    src: &[u8],
    mode: Mode,
    cancel: &CancelToken,
  ) -> Result<usize, PipeError> {
    self.write_commit(src.len(), mode, Some(cancel), |slot| {
      slot.copy_from_slice(&src[..slot.len()]);
      Ok(())
    })
  }

  /// Writes up to `max` bytes pulled from a fallible reader.
  ///
  /// The reader must fill the offered slot completely; a failure (including
  /// a short source) returns `BadAddress` with no cursor movement.
  pub fn write_from<R: io::Read>(
    &self,
    src: &mut R,
    max: usize,
    mode: Mode,
  ) -> Result<usize, PipeError> {
    self.write_commit(max, mode, None, |slot| src.read_exact(slot))
  }

  /// Writes all of `src`, blocking and looping across wrap-point short
  /// writes as needed.
  pub fn write_all(&self, src: &[u8]) -> Result<(), PipeError> {
    let mut sent = 0;
    while sent < src.len() {
      sent += self.write(&src[sent..], Mode::Blocking)?;
    }
    Ok(())
  }

  /// Committed, unread bytes currently in the pipe. Zero after teardown.
  pub fn len(&self) -> usize {
    let state = self.shared.state.lock();
    if state.shutdown {
      0
    } else {
      state.ring.readable()
    }
  }

  /// Free byte slots currently available to writers, always
  /// `<= capacity() - 1`. Zero after teardown.
  pub fn space(&self) -> usize {
    let state = self.shared.state.lock();
    if state.shutdown {
      0
    } else {
      state.ring.writable()
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn is_full(&self) -> bool {
    let state = self.shared.state.lock();
    !state.shutdown && state.ring.writable() == 0
  }

  /// Total backing-store length, fixed at pool construction.
  pub fn capacity(&self) -> usize {
    self.shared.capacity
  }

  /// The stable per-instance label, e.g. `"pipe2"`. Diagnostics only.
  pub fn name(&self) -> &str {
    &self.shared.label
  }

  pub fn is_shutdown(&self) -> bool {
    self.shared.is_shutdown()
  }

  fn read_commit<F>(
    &self,
    max: usize,
    mode: Mode,
    cancel: Option<&CancelToken>,
    sink: F,
  ) -> Result<usize, PipeError>
  where
    F: FnOnce(&[u8]) -> io::Result<()>,
  {
    if max == 0 {
      return Err(PipeError::InvalidArgument);
    }
    if let Some(token) = cancel {
      token.attach(&self.shared);
      // Covers a cancellation delivered while contending for the lock:
      // observed here, before any buffer access.
      if token.is_cancelled() {
        return Err(PipeError::Interrupted);
      }
    }

    let mut state = self.shared.state.lock();
    loop {
      if state.shutdown {
        return Err(PipeError::Unavailable);
      }
      if state.ring.readable() > 0 {
        break;
      }
      if mode == Mode::NonBlocking {
        return Err(PipeError::WouldBlock);
      }
      if let Some(token) = cancel {
        if token.is_cancelled() {
          return Err(PipeError::Interrupted);
        }
      }
      // Releases the lock while suspended; the predicate is re-checked on
      // every wake, so a stale or stolen wake just loops.
      self.shared.data_available.wait(&mut state);
    }

    let n = max.min(state.ring.read_run());
    sink(state.ring.read_slice(n)).map_err(PipeError::BadAddress)?;
    state.ring.advance_read(n);

    let wakers = std::mem::take(&mut state.space_wakers);
    self.shared.space_available.notify_one();
    drop(state);
    for waker in wakers {
      waker.wake();
    }
    Ok(n)
  }

  fn write_commit<F>(
    &self,
    max: usize,
    mode: Mode,
    cancel: Option<&CancelToken>,
    fill: F,
  ) -> Result<usize, PipeError>
  where
    F: FnOnce(&mut [u8]) -> io::Result<()>,
  {
    if max == 0 {
      return Err(PipeError::InvalidArgument);
    }
    if let Some(token) = cancel {
      token.attach(&self.shared);
      if token.is_cancelled() {
        return Err(PipeError::Interrupted);
      }
    }

    let mut state = self.shared.state.lock();
    loop {
      if state.shutdown {
        return Err(PipeError::Unavailable);
      }
      if state.ring.writable() > 0 {
        break;
      }
      if mode == Mode::NonBlocking {
        return Err(PipeError::WouldBlock);
      }
      if let Some(token) = cancel {
        if token.is_cancelled() {
          return Err(PipeError::Interrupted);
        }
      }
      self.shared.space_available.wait(&mut state);
    }

    let n = max.min(state.ring.write_run());
    fill(state.ring.write_slice(n)).map_err(PipeError::BadAddress)?;
    state.ring.advance_write(n);

    let wakers = std::mem::take(&mut state.data_wakers);
    self.shared.data_available.notify_one();
    drop(state);
    for waker in wakers {
      waker.wake();
    }
    Ok(n)
  }
}

impl Drop for PipeHandle {
  fn drop(&mut self) {
    self.shared.emit(format_args!("release({})", self.shared.label));
  }
}
