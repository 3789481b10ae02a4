//! PCM audio format value object

use super::Duration;
use crate::domain::error::AudioFormatError;

/// Default capture sample rate (speech-optimized)
pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;

/// Default samples per capture frame
pub const DEFAULT_FRAME_SAMPLES: usize = 512;

/// Highest sample rate a capture device is asked for
pub const MAX_SAMPLE_RATE: u32 = 192_000;

/// Largest capture frame, in samples
pub const MAX_FRAME_SAMPLES: usize = 16_384;

/// Bits per sample; capture is always signed 16-bit little-endian
pub const BITS_PER_SAMPLE: u16 = 16;

/// Bytes per sample
pub const BYTES_PER_SAMPLE: usize = (BITS_PER_SAMPLE / 8) as usize;

/// Raw PCM format shared by the capture source, the buffer and the upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    sample_rate: u32,
    channels: u16,
    frame_samples: usize,
}

impl AudioFormat {
    /// Create a validated audio format
    pub fn new(
        sample_rate: u32,
        channels: u16,
        frame_samples: usize,
    ) -> Result<Self, AudioFormatError> {
        if sample_rate == 0 {
            return Err(AudioFormatError::ZeroSampleRate);
        }
        if sample_rate > MAX_SAMPLE_RATE {
            return Err(AudioFormatError::SampleRateTooHigh(sample_rate));
        }
        if !(1..=2).contains(&channels) {
            return Err(AudioFormatError::UnsupportedChannels(channels));
        }
        if frame_samples == 0 {
            return Err(AudioFormatError::EmptyFrame);
        }
        if frame_samples > MAX_FRAME_SAMPLES {
            return Err(AudioFormatError::FrameTooLarge(frame_samples));
        }
        Ok(Self {
            sample_rate,
            channels,
            frame_samples,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn bits_per_sample(&self) -> u16 {
        BITS_PER_SAMPLE
    }

    /// Samples (across all channels) delivered per capture read
    pub fn frame_samples(&self) -> usize {
        self.frame_samples
    }

    /// Bytes delivered per capture read
    pub fn frame_bytes(&self) -> usize {
        self.frame_samples * BYTES_PER_SAMPLE
    }

    /// Bytes per second of audio
    pub fn byte_rate(&self) -> usize {
        self.sample_rate as usize * self.channels as usize * BYTES_PER_SAMPLE
    }

    /// Session buffer capacity for the given maximum recording length
    pub fn capacity_for(&self, max_duration: Duration) -> Result<usize, AudioFormatError> {
        usize::try_from(max_duration.as_millis())
            .ok()
            .and_then(|ms| ms.checked_mul(self.byte_rate()))
            .map(|bytes| bytes / 1000)
            .ok_or(AudioFormatError::CapacityOverflow(max_duration.as_millis()))
    }

    /// Playback length of `bytes` of PCM in this format, in seconds
    pub fn seconds_for(&self, bytes: usize) -> f64 {
        bytes as f64 / self.byte_rate() as f64
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: 1,
            frame_samples: DEFAULT_FRAME_SAMPLES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_16k_mono() {
        let format = AudioFormat::default();
        assert_eq!(format.sample_rate(), 16_000);
        assert_eq!(format.channels(), 1);
        assert_eq!(format.bits_per_sample(), 16);
        assert_eq!(format.frame_bytes(), 1024);
    }

    #[test]
    fn capacity_is_duration_times_byte_rate() {
        let format = AudioFormat::default();
        assert_eq!(format.capacity_for(Duration::from_secs(30)), Ok(30 * 16_000 * 2));

        let stereo = AudioFormat::new(8_000, 2, 256).unwrap();
        assert_eq!(stereo.capacity_for(Duration::from_millis(500)), Ok(16_000));
    }

    #[test]
    fn capacity_overflow_is_an_error() {
        let huge: Duration = "9999999999999m".parse().unwrap();
        assert_eq!(
            AudioFormat::default().capacity_for(huge),
            Err(AudioFormatError::CapacityOverflow(huge.as_millis()))
        );
    }

    #[test]
    fn rejects_oversized_formats() {
        assert_eq!(
            AudioFormat::new(384_000, 1, 512),
            Err(AudioFormatError::SampleRateTooHigh(384_000))
        );
        assert_eq!(
            AudioFormat::new(16_000, 1, 1 << 20),
            Err(AudioFormatError::FrameTooLarge(1 << 20))
        );
        assert!(AudioFormat::new(MAX_SAMPLE_RATE, 2, MAX_FRAME_SAMPLES).is_ok());
    }

    #[test]
    fn seconds_for_bytes() {
        let format = AudioFormat::default();
        assert!((format.seconds_for(32_000) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_invalid_formats() {
        assert_eq!(AudioFormat::new(0, 1, 512), Err(AudioFormatError::ZeroSampleRate));
        assert_eq!(
            AudioFormat::new(16_000, 3, 512),
            Err(AudioFormatError::UnsupportedChannels(3))
        );
        assert_eq!(AudioFormat::new(16_000, 1, 0), Err(AudioFormatError::EmptyFrame));
    }
}
