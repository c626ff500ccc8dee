#![allow(dead_code)]

use std::time::Duration;

pub const SHORT_TIMEOUT: Duration = Duration::from_millis(100);
pub const BYTES_MEDIUM: usize = 64 * 1024;
pub const BYTES_HIGH: usize = 256 * 1024;
