//! Configuration value objects

mod app_config;

pub use app_config::{AppConfig, AudioConfig, DEFAULT_SERVER_URL, MIN_SILENCE_THRESHOLD_DB};
