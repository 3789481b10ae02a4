//! Synthetic tone capture source
//!
//! Produces a sine tone paced at the real sample rate, so the controller
//! can run end to end on machines without a microphone.

use std::f64::consts::TAU;
use std::time::{Duration as StdDuration, Instant};

use super::write_pcm_le;
use crate::application::ports::{CaptureError, CaptureSource};
use crate::domain::recording::{AudioFormat, Duration};

/// Default tone frequency
pub const DEFAULT_TONE_HZ: f64 = 440.0;

/// Default amplitude as a fraction of full scale (about -12 dBFS RMS)
pub const DEFAULT_AMPLITUDE: f64 = 0.35;

/// Sine generator honouring the frame cadence of a real device
pub struct SyntheticCaptureSource {
    format: AudioFormat,
    frequency_hz: f64,
    amplitude: f64,
    phase: f64,
    next_due: Option<Instant>,
    realtime: bool,
}

impl SyntheticCaptureSource {
    pub fn new(format: AudioFormat) -> Self {
        Self {
            format,
            frequency_hz: DEFAULT_TONE_HZ,
            amplitude: DEFAULT_AMPLITUDE,
            phase: 0.0,
            next_due: None,
            realtime: true,
        }
    }

    /// Set tone frequency and amplitude (0.0 to 1.0 of full scale)
    pub fn with_tone(mut self, frequency_hz: f64, amplitude: f64) -> Self {
        self.frequency_hz = frequency_hz;
        self.amplitude = amplitude.clamp(0.0, 1.0);
        self
    }

    /// Deliver frames immediately instead of at the sample rate
    pub fn unpaced(mut self) -> Self {
        self.realtime = false;
        self
    }

    fn frame_period(&self) -> StdDuration {
        let samples_per_sec = f64::from(self.format.sample_rate()) * f64::from(self.format.channels());
        StdDuration::from_secs_f64(self.format.frame_samples() as f64 / samples_per_sec)
    }

    /// Sleep until the next frame would have been produced
    fn pace(&mut self, timeout: Duration) -> Result<(), CaptureError> {
        let now = Instant::now();
        let period = self.frame_period();
        let due = match self.next_due {
            // After an idle gap, restart the cadence instead of bursting
            Some(due) if now.saturating_duration_since(due) <= period => due,
            _ => now,
        };

        let wait = due.saturating_duration_since(now);
        if wait > timeout.as_std() {
            return Err(CaptureError::Timeout);
        }
        if !wait.is_zero() {
            std::thread::sleep(wait);
        }
        self.next_due = Some(due + period);
        Ok(())
    }
}

impl CaptureSource for SyntheticCaptureSource {
    fn read_frame(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, CaptureError> {
        if self.realtime {
            self.pace(timeout)?;
        }

        let channels = usize::from(self.format.channels());
        let step = TAU * self.frequency_hz / f64::from(self.format.sample_rate());
        let scale = self.amplitude * f64::from(i16::MAX);
        let count = self.format.frame_samples().min(buf.len() / 2);

        let mut phase = self.phase;
        let samples = (0..count).map(|i| {
            let value = (phase.sin() * scale).round() as i16;
            if (i + 1) % channels == 0 {
                phase = (phase + step) % TAU;
            }
            value
        });
        let written = write_pcm_le(samples, buf);
        self.phase = phase;

        Ok(written)
    }

    fn reset(&mut self) {
        self.next_due = None;
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}
