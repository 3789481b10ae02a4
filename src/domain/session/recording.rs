//! Recording session state machine

use std::fmt;
use thiserror::Error;

use crate::domain::capture::{AppendOutcome, CaptureBuffer};
use crate::domain::metrics::QualityMetrics;

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Recording,
    Uploading,
}

impl SessionState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Uploading => "uploading",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid state transition: cannot {action} while in {current_state} state")]
pub struct InvalidStateTransition {
    pub current_state: SessionState,
    pub action: String,
}

/// The single live capture episode: lifecycle state, audio buffer and
/// quality metrics.
///
/// State machine:
///   IDLE -> RECORDING (begin)
///   RECORDING -> UPLOADING (finish)
///   UPLOADING -> IDLE (complete)
///
/// The buffer is allocated once; every `begin` is a logical reset.
#[derive(Debug)]
pub struct RecordingSession {
    state: SessionState,
    buffer: CaptureBuffer,
    metrics: QualityMetrics,
}

impl RecordingSession {
    /// Create an idle session with a buffer of `capacity` bytes
    pub fn new(capacity: usize, silence_threshold_db: f64) -> Self {
        Self {
            state: SessionState::Idle,
            buffer: CaptureBuffer::with_capacity(capacity),
            metrics: QualityMetrics::new(silence_threshold_db),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == SessionState::Idle
    }

    pub fn is_recording(&self) -> bool {
        self.state == SessionState::Recording
    }

    pub fn is_uploading(&self) -> bool {
        self.state == SessionState::Uploading
    }

    pub fn buffer(&self) -> &CaptureBuffer {
        &self.buffer
    }

    pub fn metrics(&self) -> &QualityMetrics {
        &self.metrics
    }

    /// Clear buffer and metrics without changing state
    pub fn reset(&mut self) {
        self.buffer.reset();
        self.metrics.reset();
    }

    /// Transition from IDLE to RECORDING with a cleared buffer and metrics
    pub fn begin(&mut self) -> Result<(), InvalidStateTransition> {
        self.require(SessionState::Idle, "begin recording")?;
        self.reset();
        self.state = SessionState::Recording;
        Ok(())
    }

    /// Store one captured frame and fold the stored part into the metrics
    pub fn capture(&mut self, frame: &[u8]) -> Result<AppendOutcome, InvalidStateTransition> {
        self.require(SessionState::Recording, "capture audio")?;
        let outcome = self.buffer.append(frame);
        let written = outcome.bytes_written();
        if written > 0 {
            self.metrics.observe_pcm_le(&frame[..written]);
        }
        Ok(outcome)
    }

    /// Count a failed capture read
    pub fn record_capture_error(&mut self) -> Result<(), InvalidStateTransition> {
        self.require(SessionState::Recording, "record capture error")?;
        self.metrics.record_capture_error();
        Ok(())
    }

    /// Transition from RECORDING to UPLOADING; buffer and metrics freeze
    pub fn finish(&mut self) -> Result<(), InvalidStateTransition> {
        self.require(SessionState::Recording, "finish recording")?;
        self.state = SessionState::Uploading;
        Ok(())
    }

    /// Transition from UPLOADING to IDLE, discarding the session data
    pub fn complete(&mut self) -> Result<(), InvalidStateTransition> {
        self.require(SessionState::Uploading, "complete upload")?;
        self.reset();
        self.state = SessionState::Idle;
        Ok(())
    }

    fn require(&self, expected: SessionState, action: &str) -> Result<(), InvalidStateTransition> {
        if self.state != expected {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: action.to_string(),
            });
        }
        Ok(())
    }
}
