//! Fixed-capacity PCM byte arena
//!
//! The buffer is allocated once at startup and never grows. A session
//! fills it front to back; once full, further appends are refused so the
//! uploaded artifact is always one contiguous recording.

/// Result of appending one frame to the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The whole frame was stored
    Accepted(usize),
    /// Only the first `n` bytes fit; the buffer is now full
    Truncated(usize),
    /// Nothing was stored because the buffer was already full
    Full,
}

impl AppendOutcome {
    /// Number of bytes actually copied
    pub fn bytes_written(&self) -> usize {
        match self {
            Self::Accepted(n) | Self::Truncated(n) => *n,
            Self::Full => 0,
        }
    }
}

/// Bounded byte region holding the current session's audio
#[derive(Debug)]
pub struct CaptureBuffer {
    data: Box<[u8]>,
    filled: usize,
}

impl CaptureBuffer {
    /// Allocate a zeroed buffer of `capacity` bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity].into_boxed_slice(),
            filled: 0,
        }
    }

    /// Logical reset; the allocation is kept
    pub fn reset(&mut self) {
        self.filled = 0;
    }

    /// Copy as much of `frame` as fits
    pub fn append(&mut self, frame: &[u8]) -> AppendOutcome {
        let remaining = self.remaining();
        if remaining == 0 {
            return AppendOutcome::Full;
        }

        let n = frame.len().min(remaining);
        self.data[self.filled..self.filled + n].copy_from_slice(&frame[..n]);
        self.filled += n;

        if n < frame.len() {
            AppendOutcome::Truncated(n)
        } else {
            AppendOutcome::Accepted(n)
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn bytes_filled(&self) -> usize {
        self.filled
    }

    pub fn remaining(&self) -> usize {
        self.capacity() - self.filled
    }

    pub fn is_full(&self) -> bool {
        self.filled == self.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    /// The recorded bytes, in append order
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.filled]
    }
}
