//! Application configuration value object

use serde::{Deserialize, Serialize};

use crate::domain::error::{AudioFormatError, ConfigError};
use crate::domain::metrics::DEFAULT_SILENCE_THRESHOLD_DB;
use crate::domain::poll::DEFAULT_FAILURE_CEILING;
use crate::domain::recording::{
    AudioFormat, Duration, DEFAULT_FRAME_SAMPLES, DEFAULT_SAMPLE_RATE,
};

/// Default control server
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";

const DEFAULT_STATUS_TIMEOUT_MS: u64 = 1000;
const DEFAULT_IDLE_INTERVAL_MS: u64 = 100;

/// Quietest accepted silence threshold; the loudest is 0 dBFS
pub const MIN_SILENCE_THRESHOLD_DB: f64 = -200.0;

/// Audio capture configuration (`[audio]` table).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
    pub frame_samples: Option<usize>,
    pub silence_threshold_db: Option<f64>,
}

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub server_url: Option<String>,
    pub device_id: Option<String>,
    pub max_duration: Option<String>,
    pub poll_interval: Option<String>,
    pub status_timeout_ms: Option<u64>,
    pub idle_interval_ms: Option<u64>,
    pub failure_ceiling: Option<u32>,
    pub audio: Option<AudioConfig>,
}

impl AppConfig {
    /// Create config with default values.
    /// `device_id` stays unset; it is derived at startup when not configured.
    pub fn defaults() -> Self {
        Self {
            server_url: Some(DEFAULT_SERVER_URL.to_string()),
            device_id: None,
            max_duration: Some(Duration::default_max_duration().to_string()),
            poll_interval: Some(Duration::default_poll_interval().to_string()),
            status_timeout_ms: Some(DEFAULT_STATUS_TIMEOUT_MS),
            idle_interval_ms: Some(DEFAULT_IDLE_INTERVAL_MS),
            failure_ceiling: Some(DEFAULT_FAILURE_CEILING),
            audio: Some(AudioConfig {
                sample_rate: Some(DEFAULT_SAMPLE_RATE),
                channels: Some(1),
                frame_samples: Some(DEFAULT_FRAME_SAMPLES),
                silence_threshold_db: Some(DEFAULT_SILENCE_THRESHOLD_DB),
            }),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            server_url: other.server_url.or(self.server_url),
            device_id: other.device_id.or(self.device_id),
            max_duration: other.max_duration.or(self.max_duration),
            poll_interval: other.poll_interval.or(self.poll_interval),
            status_timeout_ms: other.status_timeout_ms.or(self.status_timeout_ms),
            idle_interval_ms: other.idle_interval_ms.or(self.idle_interval_ms),
            failure_ceiling: other.failure_ceiling.or(self.failure_ceiling),
            audio: Self::merge_audio_config(self.audio, other.audio),
        }
    }

    fn merge_audio_config(
        base: Option<AudioConfig>,
        other: Option<AudioConfig>,
    ) -> Option<AudioConfig> {
        match (base, other) {
            (None, None) => None,
            (Some(b), None) => Some(b),
            (None, Some(o)) => Some(o),
            (Some(b), Some(o)) => Some(AudioConfig {
                sample_rate: o.sample_rate.or(b.sample_rate),
                channels: o.channels.or(b.channels),
                frame_samples: o.frame_samples.or(b.frame_samples),
                silence_threshold_db: o.silence_threshold_db.or(b.silence_threshold_db),
            }),
        }
    }

    /// Server base URL without a trailing slash
    pub fn server_url_or_default(&self) -> String {
        self.server_url
            .as_deref()
            .unwrap_or(DEFAULT_SERVER_URL)
            .trim_end_matches('/')
            .to_string()
    }

    pub fn status_timeout_or_default(&self) -> Duration {
        Duration::from_millis(self.status_timeout_ms.unwrap_or(DEFAULT_STATUS_TIMEOUT_MS))
    }

    pub fn idle_interval_or_default(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms.unwrap_or(DEFAULT_IDLE_INTERVAL_MS))
    }

    pub fn failure_ceiling_or_default(&self) -> u32 {
        self.failure_ceiling.unwrap_or(DEFAULT_FAILURE_CEILING)
    }

    /// Audio format from the `[audio]` table; unset fields take defaults
    pub fn audio_format(&self) -> Result<AudioFormat, AudioFormatError> {
        let audio = self.audio.clone().unwrap_or_default();
        AudioFormat::new(
            audio.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE),
            audio.channels.unwrap_or(1),
            audio.frame_samples.unwrap_or(DEFAULT_FRAME_SAMPLES),
        )
    }

    /// Silence threshold from the `[audio]` table, checked against the dBFS range
    pub fn silence_threshold_db(&self) -> Result<f64, ConfigError> {
        let Some(db) = self.audio.as_ref().and_then(|a| a.silence_threshold_db) else {
            return Ok(DEFAULT_SILENCE_THRESHOLD_DB);
        };
        if !(MIN_SILENCE_THRESHOLD_DB..=0.0).contains(&db) {
            return Err(ConfigError::ValidationError {
                key: "audio.silence_threshold_db".to_string(),
                message: format!("{} is outside {}..=0 dB", db, MIN_SILENCE_THRESHOLD_DB),
            });
        }
        Ok(db)
    }
}
