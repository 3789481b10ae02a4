//! Audio capture port interface

use thiserror::Error;

use crate::domain::recording::Duration;

/// Capture driver errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("No audio device available")]
    NoAudioDevice,

    #[error("Failed to start capture: {0}")]
    StartFailed(String),

    #[error("Timed out waiting for audio frame")]
    Timeout,

    #[error("Capture driver error: {0}")]
    Driver(String),
}

/// Port for the audio capture driver.
///
/// Frames are signed 16-bit little-endian PCM in the configured format.
pub trait CaptureSource {
    /// Block until a frame is available and copy it into `buf`.
    ///
    /// # Arguments
    /// * `buf` - Destination; its length is the maximum bytes to read
    /// * `timeout` - Upper bound on how long to wait for the driver
    ///
    /// # Returns
    /// The number of bytes written into `buf`
    fn read_frame(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, CaptureError>;

    /// Discard audio buffered before this call and clear pending driver
    /// errors. Called when a session starts.
    fn reset(&mut self);

    /// Get source name for logging
    fn name(&self) -> &str;
}
