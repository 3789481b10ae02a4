//! Domain error types

use thiserror::Error;

/// Error when parsing a duration string
#[derive(Debug, Clone, Error)]
#[error("Invalid duration format: \"{input}\". Expected format: <number>s, <number>m, or <number>m<number>s (e.g., 1s, 30s, 2m30s)")]
pub struct DurationParseError {
    pub input: String,
}

/// Error when an audio format cannot be used for capture
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioFormatError {
    #[error("Sample rate must be greater than zero")]
    ZeroSampleRate,

    #[error("Sample rate {0} Hz is above the supported maximum")]
    SampleRateTooHigh(u32),

    #[error("Channel count must be 1 or 2, got {0}")]
    UnsupportedChannels(u16),

    #[error("Frame must hold at least one sample")]
    EmptyFrame,

    #[error("Frame of {0} samples is above the supported maximum")]
    FrameTooLarge(usize),

    #[error("Buffer for {0} ms of audio does not fit in memory")]
    CapacityOverflow(u64),
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}

/// Error when a device identifier is unusable on the wire
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid device id: \"{input}\". Use letters, digits, '-', '_' or '.'")]
pub struct InvalidDeviceId {
    pub input: String,
}
