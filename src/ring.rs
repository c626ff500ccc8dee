// src/ring.rs

//! The circular byte store underneath every pipe.
//!
//! `RingBuffer` is pure cursor arithmetic over a fixed allocation. It never
//! blocks and never fails; it is only ever touched while the owning pipe's
//! mutex is held. One slot is kept permanently unusable so that
//! `read_at == write_at` unambiguously means "empty" without a separate
//! length counter, which caps the usable capacity at `capacity - 1`.

use crate::error::PipeError;

#[derive(Debug)]
pub(crate) struct RingBuffer {
  storage: Box<[u8]>,
  read_at: usize,
  write_at: usize,
}

impl RingBuffer {
  /// Allocates a ring with `capacity` total slots (`capacity - 1` usable).
  ///
  /// Allocation is fallible and surfaces as `OutOfMemory` so that pool
  /// construction can roll back instead of aborting.
  pub(crate) fn with_capacity(capacity: usize) -> Result<Self, PipeError> {
    if capacity < 2 {
      return Err(PipeError::InvalidArgument);
    }
    let mut storage = Vec::new();
    storage
      .try_reserve_exact(capacity)
      .map_err(|_| PipeError::OutOfMemory)?;
    storage.resize(capacity, 0);
    Ok(RingBuffer {
      storage: storage.into_boxed_slice(),
      read_at: 0,
      write_at: 0,
    })
  }

  #[inline]
  pub(crate) fn capacity(&self) -> usize {
    self.storage.len()
  }

  /// Committed, unread bytes.
  #[inline]
  pub(crate) fn readable(&self) -> usize {
    let cap = self.storage.len();
    (self.write_at + cap - self.read_at) % cap
  }

  /// Free slots available to a writer, always `<= capacity - 1`.
  #[inline]
  pub(crate) fn writable(&self) -> usize {
    self.storage.len() - 1 - self.readable()
  }

  /// Longest transfer a single read may take without crossing the end of the
  /// storage. When the data wraps, this is shorter than `readable()` and the
  /// caller is expected to come back for the remainder.
  #[inline]
  pub(crate) fn read_run(&self) -> usize {
    if self.read_at > self.write_at {
      self.storage.len() - self.read_at
    } else {
      self.readable()
    }
  }

  /// Longest transfer a single write may take without crossing the end of
  /// the storage. Symmetric to [`read_run`](Self::read_run).
  #[inline]
  pub(crate) fn write_run(&self) -> usize {
    if self.write_at >= self.read_at {
      (self.storage.len() - self.write_at).min(self.writable())
    } else {
      self.writable()
    }
  }

  /// The next `n` committed bytes, contiguous. `n` must not exceed the
  /// `read_run()` just reported.
  #[inline]
  pub(crate) fn read_slice(&self, n: usize) -> &[u8] {
    &self.storage[self.read_at..self.read_at + n]
  }

  /// The next `n` free slots, contiguous. `n` must not exceed the
  /// `write_run()` just reported.
  #[inline]
  pub(crate) fn write_slice(&mut self, n: usize) -> &mut [u8] {
    &mut self.storage[self.write_at..self.write_at + n]
  }

  /// Commits `n` consumed bytes. Requesting more than the reported run is a
  /// coordination bug, not a runtime error, and aborts.
  pub(crate) fn advance_read(&mut self, n: usize) {
    assert!(n <= self.read_run(), "read advance exceeds reported run");
    self.read_at += n;
    if self.read_at == self.storage.len() {
      self.read_at = 0;
    }
  }

  /// Commits `n` produced bytes. Same contract as `advance_read`.
  pub(crate) fn advance_write(&mut self, n: usize) {
    assert!(n <= self.write_run(), "write advance exceeds reported run");
    self.write_at += n;
    if self.write_at == self.storage.len() {
      self.write_at = 0;
    }
  }

  /// Releases the backing store at teardown. The owning pipe flags itself as
  /// shut down before calling this, so no arithmetic runs afterwards.
  pub(crate) fn release(&mut self) {
    self.storage = Box::default();
    self.read_at = 0;
    self.write_at = 0;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn filled(cap: usize, bytes: &[u8]) -> RingBuffer {
    let mut ring = RingBuffer::with_capacity(cap).unwrap();
    let n = bytes.len();
    assert!(n <= ring.write_run());
    ring.write_slice(n).copy_from_slice(bytes);
    ring.advance_write(n);
    ring
  }

  #[test]
  fn rejects_degenerate_capacity() {
    assert_eq!(
      RingBuffer::with_capacity(0).unwrap_err(),
      PipeError::InvalidArgument
    );
    assert_eq!(
      RingBuffer::with_capacity(1).unwrap_err(),
      PipeError::InvalidArgument
    );
  }

  #[test]
  fn empty_ring_accounting() {
    let ring = RingBuffer::with_capacity(8).unwrap();
    assert_eq!(ring.capacity(), 8);
    assert_eq!(ring.readable(), 0);
    assert_eq!(ring.writable(), 7);
    assert_eq!(ring.read_run(), 0);
    assert_eq!(ring.write_run(), 7);
  }

  #[test]
  fn readable_plus_writable_is_invariant() {
    let mut ring = RingBuffer::with_capacity(8).unwrap();
    // Walk the cursors through every relative position.
    for step in 0..64 {
      let n = 1 + step % 3;
      if ring.writable() >= n {
        let n = n.min(ring.write_run());
        ring.write_slice(n).fill(b'x');
        ring.advance_write(n);
      }
      assert_eq!(ring.readable() + ring.writable(), 7);
      if ring.readable() > 0 {
        let n = ring.read_run().min(2);
        ring.advance_read(n);
      }
      assert_eq!(ring.readable() + ring.writable(), 7);
    }
  }

  #[test]
  fn fills_to_capacity_minus_one() {
    let ring = filled(8, b"ABCDEFG");
    assert_eq!(ring.readable(), 7);
    assert_eq!(ring.writable(), 0);
    assert_eq!(ring.write_run(), 0);
  }

  #[test]
  fn wrapped_data_splits_the_read_run() {
    // Cursors at read_at = 6, write_at = 2: bytes live at 6, 7, 0, 1.
    let mut ring = RingBuffer::with_capacity(8).unwrap();
    ring.write_slice(6).fill(0);
    ring.advance_write(6);
    ring.advance_read(6);

    let n = ring.write_run();
    assert_eq!(n, 2);
    ring.write_slice(n).copy_from_slice(b"WX");
    ring.advance_write(n);
    let n = ring.write_run();
    assert_eq!(n, 2);
    ring.write_slice(n).copy_from_slice(b"YZ");
    ring.advance_write(n);

    assert_eq!(ring.readable(), 4);
    assert_eq!(ring.read_run(), 2);
    assert_eq!(ring.read_slice(2), b"WX");
    ring.advance_read(2);
    assert_eq!(ring.read_run(), 2);
    assert_eq!(ring.read_slice(2), b"YZ");
    ring.advance_read(2);
    assert_eq!(ring.readable(), 0);
  }

  #[test]
  fn advance_wraps_exactly_at_capacity() {
    let mut ring = filled(8, b"ABCDEFG");
    ring.advance_read(7);
    // read_at is now 7; one more byte through the wrap point lands it on 0.
    ring.write_slice(1).copy_from_slice(b"h");
    ring.advance_write(1);
    assert_eq!(ring.read_run(), 1);
    ring.advance_read(1);
    assert_eq!(ring.readable(), 0);
    assert_eq!(ring.writable(), 7);
    assert_eq!(ring.write_run(), 7);
  }

  #[test]
  #[should_panic(expected = "read advance exceeds reported run")]
  fn overlong_advance_aborts() {
    let mut ring = filled(8, b"AB");
    ring.advance_read(3);
  }
}
