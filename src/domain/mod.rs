//! Domain layer - Core business logic
//!
//! Contains value objects, entities, and domain errors.
//! This layer has no dependencies on external systems.

pub mod capture;
pub mod config;
pub mod device;
pub mod error;
pub mod metrics;
pub mod poll;
pub mod recording;
pub mod session;

// Re-export common types
pub use capture::{AppendOutcome, CaptureBuffer};
pub use config::AppConfig;
pub use device::DeviceId;
pub use error::*;
pub use metrics::QualityMetrics;
pub use poll::{Intent, IntentSource, PollState};
pub use recording::{AudioFormat, Duration};
pub use session::{RecordingSession, SessionState};
