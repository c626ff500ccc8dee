// src/error.rs

use core::fmt;
use std::io;

/// Error returned by pipe and pool operations.
///
/// All variants are ordinary, recoverable result values; none of them leave a
/// pipe in a partially-committed state. A transfer that fails with
/// [`PipeError::BadAddress`] has moved no cursors.
pub enum PipeError {
  /// Non-blocking mode was requested and the operation could not proceed
  /// without waiting. Retry later (or after a readiness notification).
  WouldBlock,
  /// A blocking wait was cancelled through a [`CancelToken`](crate::CancelToken)
  /// before the operation could complete. No bytes were transferred.
  Interrupted,
  /// The pipe has been torn down, either explicitly or because its pool was
  /// dropped. Not retryable.
  Unavailable,
  /// The caller-supplied source or destination failed during the byte
  /// transfer step. The pipe's cursors are unchanged.
  BadAddress(io::Error),
  /// Backing-store allocation failed while building a pool.
  OutOfMemory,
  /// Zero-length or otherwise malformed request parameters.
  InvalidArgument,
}

impl PipeError {
  fn message(&self) -> &'static str {
    match self {
      PipeError::WouldBlock => "operation would block",
      PipeError::Interrupted => "blocking wait was cancelled",
      PipeError::Unavailable => "pipe has been torn down",
      PipeError::BadAddress(_) => "caller-supplied buffer was inaccessible",
      PipeError::OutOfMemory => "backing-store allocation failed",
      PipeError::InvalidArgument => "malformed request parameters",
    }
  }
}

impl fmt::Debug for PipeError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PipeError::WouldBlock => write!(f, "WouldBlock"),
      PipeError::Interrupted => write!(f, "Interrupted"),
      PipeError::Unavailable => write!(f, "Unavailable"),
      PipeError::BadAddress(e) => write!(f, "BadAddress({:?})", e),
      PipeError::OutOfMemory => write!(f, "OutOfMemory"),
      PipeError::InvalidArgument => write!(f, "InvalidArgument"),
    }
  }
}

impl fmt::Display for PipeError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PipeError::BadAddress(e) => write!(f, "{}: {}", self.message(), e),
      _ => f.write_str(self.message()),
    }
  }
}

impl std::error::Error for PipeError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      PipeError::BadAddress(e) => Some(e),
      _ => None,
    }
  }
}

// `io::Error` is not comparable, so `BadAddress` values compare equal by
// discriminant only. Tests match on the kind, not the payload.
impl PartialEq for PipeError {
  fn eq(&self, other: &Self) -> bool {
    core::mem::discriminant(self) == core::mem::discriminant(other)
  }
}
impl Eq for PipeError {}
