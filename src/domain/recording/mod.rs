//! Recording value objects

mod duration;
mod format;

pub use duration::{
    Duration, DEFAULT_MAX_DURATION_SECS, DEFAULT_POLL_INTERVAL_MS, MAX_SESSION_SECS,
};
pub use format::{
    AudioFormat, BITS_PER_SAMPLE, BYTES_PER_SAMPLE, DEFAULT_FRAME_SAMPLES, DEFAULT_SAMPLE_RATE,
    MAX_FRAME_SAMPLES, MAX_SAMPLE_RATE,
};
