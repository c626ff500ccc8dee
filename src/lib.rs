//! Fixed-capacity, in-memory byte pipes for concurrent Rust applications.
//!
//! A [`PipePool`] owns a fixed set of independent bounded byte channels with
//! pipe-like semantics: writers deposit bytes, readers consume them in order,
//! and each call chooses blocking or non-blocking behavior. A single mutex
//! per pipe serializes cursor movement; two condition-variable wait sets
//! coordinate blocked readers and writers, and a waker-based readiness poll
//! drives external event loops. Blocking calls accept a cooperative
//! [`CancelToken`] in place of any OS signal mechanism.
//!
//! Transfers are pipe-like by contract: a read or write may move fewer bytes
//! than requested when the transfer would wrap past the end of the backing
//! store. Loop, or use the `read_exact`/`write_all` helpers.

pub mod error;
pub mod pipe;
pub mod pool;
pub mod trace;

mod cancel;
mod ring;

pub use cancel::CancelToken;
pub use error::PipeError;
pub use pipe::{Mode, PipeHandle, ReadReady, Readiness, WriteReady};
pub use pool::{PipePool, PoolBuilder};
pub use trace::{LogSink, TraceSink};
