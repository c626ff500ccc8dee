// src/pool.rs

//! The pool: a fixed collection of independent pipes with one lifetime.
//!
//! Construction is all-or-nothing. Slots are built in index order; if slot
//! `k` fails, slots `0..k` are torn down and the whole build fails, so a
//! partially-initialized pool is never observable. Teardown is the mirror
//! image: every slot is terminated (idempotently), waking any suspended
//! callers so they fail with `Unavailable` rather than hanging.

use crate::error::PipeError;
use crate::pipe::shared::PipeShared;
use crate::pipe::PipeHandle;
use crate::trace::TraceSink;

use core::fmt;
use std::sync::Arc;

/// Number of pipes a default pool carries.
pub const DEFAULT_INSTANCES: usize = 4;
/// Default per-pipe backing-store size in bytes.
pub const DEFAULT_CAPACITY: usize = 4096;
/// Default per-instance label prefix; slot `i` is named `"{prefix}{i}"`.
pub const DEFAULT_PREFIX: &str = "pipe";

/// Configures and builds a [`PipePool`].
pub struct PoolBuilder {
  instances: usize,
  capacity: usize,
  prefix: String,
  sink: Option<Arc<dyn TraceSink>>,
}

impl PoolBuilder {
  fn new() -> Self {
    PoolBuilder {
      instances: DEFAULT_INSTANCES,
      capacity: DEFAULT_CAPACITY,
      prefix: DEFAULT_PREFIX.to_string(),
      sink: None,
    }
  }

  /// Number of independent pipes. Must be at least 1.
  pub fn instances(mut self, instances: usize) -> Self {
    self.instances = instances;
    self
  }

  /// Per-pipe backing-store size in bytes, fixed for the pool's lifetime.
  /// Must be at least 2; usable capacity is one byte less.
  pub fn capacity(mut self, capacity: usize) -> Self {
    self.capacity = capacity;
    self
  }

  /// Label prefix for diagnostics; slot `i` is named `"{prefix}{i}"`.
  pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
    self.prefix = prefix.into();
    self
  }

  /// Injects a diagnostic sink. Without one the pool emits nothing.
  pub fn trace_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
    self.sink = Some(sink);
    self
  }

  /// Builds the pool, allocating every slot's storage up front.
  ///
  /// # Errors
  ///
  /// - `InvalidArgument`: zero instances or a capacity below 2.
  /// - `OutOfMemory`: a slot's allocation failed; previously built slots
  ///   have already been torn down.
  pub fn build(self) -> Result<PipePool, PipeError> {
    if self.instances == 0 {
      return Err(PipeError::InvalidArgument);
    }
    let PoolBuilder {
      instances,
      capacity,
      prefix,
      sink,
    } = self;
    let slots = build_slots(instances, |index| {
      let label = format!("{}{}", prefix, index);
      let shared = PipeShared::new(capacity, label, sink.clone())?;
      shared.emit(format_args!("{}: added", shared.label));
      Ok(shared)
    })?;
    Ok(PipePool { slots, sink })
  }
}

impl fmt::Debug for PoolBuilder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PoolBuilder")
      .field("instances", &self.instances)
      .field("capacity", &self.capacity)
      .field("prefix", &self.prefix)
      .field("trace", &self.sink.is_some())
      .finish()
  }
}

/// Builds slots in order, unwinding every already-built slot on failure.
fn build_slots<F>(instances: usize, mut construct: F) -> Result<Vec<Arc<PipeShared>>, PipeError>
where
  F: FnMut(usize) -> Result<Arc<PipeShared>, PipeError>,
{
  let mut slots = Vec::with_capacity(instances);
  for index in 0..instances {
    match construct(index) {
      Ok(shared) => slots.push(shared),
      Err(err) => {
        for shared in &slots {
          shared.shutdown();
        }
        return Err(err);
      }
    }
  }
  Ok(slots)
}

/// A fixed-size pool of independent byte pipes.
///
/// Each slot has its own lock, storage and cursors; no ordering is implied
/// across slots. The pool exclusively owns its pipes' lifetimes: dropping it
/// (or calling [`shutdown`](Self::shutdown)) terminates every slot, and
/// handles that outlive it fail with `Unavailable`.
pub struct PipePool {
  slots: Vec<Arc<PipeShared>>,
  sink: Option<Arc<dyn TraceSink>>,
}

impl PipePool {
  pub fn builder() -> PoolBuilder {
    PoolBuilder::new()
  }

  /// Builds a pool of `instances` pipes of `capacity` bytes each, with the
  /// default prefix and no trace sink.
  pub fn new(instances: usize, capacity: usize) -> Result<PipePool, PipeError> {
    PipePool::builder()
      .instances(instances)
      .capacity(capacity)
      .build()
  }

  /// Opens a handle onto slot `index`.
  ///
  /// # Errors
  ///
  /// - `InvalidArgument`: `index` is out of range.
  /// - `Unavailable`: the slot has been torn down.
  pub fn open(&self, index: usize) -> Result<PipeHandle, PipeError> {
    let shared = self.slots.get(index).ok_or(PipeError::InvalidArgument)?;
    if shared.is_shutdown() {
      return Err(PipeError::Unavailable);
    }
    Ok(PipeHandle::new(Arc::clone(shared)))
  }

  /// Number of slots in the pool.
  pub fn len(&self) -> usize {
    self.slots.len()
  }

  pub fn is_empty(&self) -> bool {
    self.slots.is_empty()
  }

  /// Terminates every slot: releases storage and wakes all suspended callers
  /// and registered pollers. Idempotent per slot; safe to call more than
  /// once. Runs automatically on drop.
  pub fn shutdown(&self) {
    for shared in &self.slots {
      shared.shutdown();
    }
    if let Some(sink) = &self.sink {
      sink.trace(format_args!("pool: torn down"));
    }
  }
}

impl fmt::Debug for PipePool {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PipePool").field("slots", &self.slots).finish()
  }
}

impl Drop for PipePool {
  fn drop(&mut self) {
    self.shutdown();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rejects_zero_instances() {
    assert_eq!(
      PipePool::new(0, 64).unwrap_err(),
      PipeError::InvalidArgument
    );
  }

  #[test]
  fn rejects_degenerate_capacity() {
    assert_eq!(PipePool::new(2, 1).unwrap_err(), PipeError::InvalidArgument);
  }

  #[test]
  fn failed_slot_rolls_back_the_whole_pool() {
    let mut built: Vec<Arc<PipeShared>> = Vec::new();
    let err = build_slots(4, |index| {
      if index == 2 {
        return Err(PipeError::OutOfMemory);
      }
      let shared = PipeShared::new(8, format!("pipe{}", index), None)?;
      built.push(Arc::clone(&shared));
      Ok(shared)
    })
    .unwrap_err();

    assert_eq!(err, PipeError::OutOfMemory);
    assert_eq!(built.len(), 2);
    // No slot survives in the Active state.
    for shared in &built {
      assert!(shared.is_shutdown());
    }
  }

  #[test]
  fn builder_fills_in_defaults() {
    let pool = PipePool::builder().capacity(16).build().unwrap();
    assert_eq!(pool.len(), DEFAULT_INSTANCES);
    let handle = pool.open(3).unwrap();
    assert_eq!(handle.name(), "pipe3");
    assert_eq!(handle.capacity(), 16);
  }
}
