//! Application layer - Use cases and port interfaces
//!
//! Contains the core business operations and trait definitions
//! for external system interactions.

pub mod controller;
pub mod poller;
pub mod ports;
pub mod upload;

// Re-export use cases
pub use controller::{
    ControllerError, ControllerSettings, RecordingController, SessionReport, StopReason, TickEvent,
};
pub use poller::{PollError, PollerConfig, StatusPoller};
pub use upload::{upload_timeout, UploadOutcome, UploadPipeline};
