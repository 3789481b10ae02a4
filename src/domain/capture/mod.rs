//! Session capture storage

mod buffer;

pub use buffer::{AppendOutcome, CaptureBuffer};
