use bytepipe::{Mode, PipeError, PipePool, TraceSink};

use std::fmt;
use std::sync::{Arc, Mutex};

#[test]
fn slots_are_independent() {
  let pool = PipePool::new(4, 16).unwrap();
  assert_eq!(pool.len(), 4);

  let a = pool.open(0).unwrap();
  let b = pool.open(1).unwrap();
  a.write_all(b"only in a").unwrap();

  assert_eq!(b.len(), 0);
  let mut buf = [0u8; 1];
  assert_eq!(
    b.read(&mut buf, Mode::NonBlocking).unwrap_err(),
    PipeError::WouldBlock
  );
  assert_eq!(a.len(), 9);
}

#[test]
fn open_out_of_range_is_invalid() {
  let pool = PipePool::new(2, 16).unwrap();
  assert_eq!(pool.open(2).unwrap_err(), PipeError::InvalidArgument);
}

#[test]
fn open_after_shutdown_is_unavailable() {
  let pool = PipePool::new(2, 16).unwrap();
  pool.shutdown();
  assert_eq!(pool.open(0).unwrap_err(), PipeError::Unavailable);
}

#[test]
fn shutdown_is_idempotent() {
  let pool = PipePool::new(2, 16).unwrap();
  let pipe = pool.open(0).unwrap();
  pool.shutdown();
  pool.shutdown();
  assert_eq!(
    pipe.write(b"x", Mode::NonBlocking).unwrap_err(),
    PipeError::Unavailable
  );
}

#[test]
fn storage_persists_across_opens() {
  // The buffer belongs to the slot, not to any single handle: bytes written
  // through one short-lived handle are still there for the next one.
  let pool = PipePool::new(1, 16).unwrap();
  {
    let writer = pool.open(0).unwrap();
    writer.write_all(b"durable").unwrap();
  }
  let reader = pool.open(0).unwrap();
  let mut buf = [0u8; 7];
  reader.read_exact(&mut buf).unwrap();
  assert_eq!(&buf, b"durable");
}

#[test]
fn handles_outliving_the_pool_fail_cleanly() {
  let pool = PipePool::new(1, 16).unwrap();
  let pipe = pool.open(0).unwrap();
  drop(pool);
  assert_eq!(
    pipe.write(b"x", Mode::Blocking).unwrap_err(),
    PipeError::Unavailable
  );
}

#[test]
fn custom_prefix_names_the_instances() {
  let pool = PipePool::builder()
    .instances(2)
    .capacity(16)
    .prefix("fifo")
    .build()
    .unwrap();
  assert_eq!(pool.open(0).unwrap().name(), "fifo0");
  assert_eq!(pool.open(1).unwrap().name(), "fifo1");
}

#[derive(Default)]
struct CaptureSink {
  lines: Mutex<Vec<String>>,
}

impl TraceSink for CaptureSink {
  fn trace(&self, line: fmt::Arguments<'_>) {
    self.lines.lock().unwrap().push(line.to_string());
  }
}

#[test]
fn lifecycle_is_traced_through_the_injected_sink() {
  let sink = Arc::new(CaptureSink::default());
  let pool = PipePool::builder()
    .instances(2)
    .capacity(16)
    .trace_sink(Arc::clone(&sink) as Arc<dyn TraceSink>)
    .build()
    .unwrap();

  {
    let _pipe = pool.open(1).unwrap();
  }
  pool.shutdown();

  let lines = sink.lines.lock().unwrap().clone();
  assert!(lines.iter().any(|l| l == "pipe0: added"));
  assert!(lines.iter().any(|l| l == "pipe1: added"));
  assert!(lines.iter().any(|l| l == "open(pipe1)"));
  assert!(lines.iter().any(|l| l == "release(pipe1)"));
  assert!(lines.iter().any(|l| l == "pipe0: removed"));
  assert!(lines.iter().any(|l| l == "pipe1: removed"));
}
