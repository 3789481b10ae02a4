//! Remote recording-intent resilience state

mod state;

pub use state::{Intent, IntentSource, PollFailure, PollState, DEFAULT_FAILURE_CEILING};
