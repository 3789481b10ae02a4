//! Recording session entity and lifecycle

mod recording;

pub use recording::{InvalidStateTransition, RecordingSession, SessionState};
