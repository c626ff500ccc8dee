// src/trace.rs

//! Injected diagnostics.
//!
//! The pool never talks to a global logger. Callers that want trace lines
//! hand the pool a [`TraceSink`]; everyone else pays nothing. [`LogSink`] is
//! the stock adapter onto the `log` facade, with a runtime-mutable enable
//! flag so tracing can be toggled on a live pool.

use core::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// A sink for one-line diagnostic trace records.
///
/// Lines are pre-formatted by the pipe layer; implementations decide where
/// they go. Implementations must be cheap when disabled, since the data path
/// calls into the sink on open/close and lifecycle transitions.
pub trait TraceSink: Send + Sync {
  fn trace(&self, line: fmt::Arguments<'_>);
}

/// A [`TraceSink`] that forwards to the [`log`] crate at debug level.
#[derive(Debug)]
pub struct LogSink {
  enabled: AtomicBool,
}

impl LogSink {
  pub fn new(enabled: bool) -> Self {
    LogSink {
      enabled: AtomicBool::new(enabled),
    }
  }

  /// Toggles emission at runtime. Takes effect for subsequent lines.
  pub fn set_enabled(&self, enabled: bool) {
    self.enabled.store(enabled, Ordering::Relaxed);
  }

  pub fn enabled(&self) -> bool {
    self.enabled.load(Ordering::Relaxed)
  }
}

impl Default for LogSink {
  fn default() -> Self {
    LogSink::new(true)
  }
}

impl TraceSink for LogSink {
  fn trace(&self, line: fmt::Arguments<'_>) {
    if self.enabled.load(Ordering::Relaxed) {
      log::debug!(target: "bytepipe", "{}", line);
    }
  }
}
