//! Sticky recording intent with a bounded failure window

use std::fmt;

/// Default number of consecutive failed polls before the safety stop
pub const DEFAULT_FAILURE_CEILING: u32 = 10;

/// Where an intent value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentSource {
    /// A successful poll reported this value
    Fresh,
    /// The poll failed; this is the last known value
    Stale,
}

impl IntentSource {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fresh => "fresh",
            Self::Stale => "stale",
        }
    }
}

impl fmt::Display for IntentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recording intent as seen by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intent {
    pub recording: bool,
    pub source: IntentSource,
}

impl Intent {
    pub const fn fresh(recording: bool) -> Self {
        Self {
            recording,
            source: IntentSource::Fresh,
        }
    }

    pub const fn stale(recording: bool) -> Self {
        Self {
            recording,
            source: IntentSource::Stale,
        }
    }

    pub fn is_fresh(&self) -> bool {
        self.source == IntentSource::Fresh
    }
}

/// What a failed poll did to the state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollFailure {
    /// The last known intent, after any safety latch
    pub intent: Intent,
    /// Failures in a row, including this one
    pub consecutive_failures: u32,
    /// True for the first failure and the one just before the ceiling
    pub notable: bool,
    /// True when this failure hit the ceiling while intent was "recording"
    pub safety_stop: bool,
}

/// Sticky intent plus a consecutive-failure counter.
///
/// Effective intent changes only on a successful poll or when the
/// failure counter reaches the ceiling while intent was "recording"
/// (the safety stop, which latches intent to "not recording").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollState {
    last_known_intent: bool,
    consecutive_failures: u32,
    ceiling: u32,
}

impl PollState {
    /// Create a state with the given failure ceiling (at least 1)
    pub fn new(ceiling: u32) -> Self {
        Self {
            last_known_intent: false,
            consecutive_failures: 0,
            ceiling: ceiling.max(1),
        }
    }

    /// Apply a successful poll
    pub fn record_success(&mut self, recording: bool) -> Intent {
        self.consecutive_failures = 0;
        self.last_known_intent = recording;
        Intent::fresh(recording)
    }

    /// Apply a failed poll
    pub fn record_failure(&mut self) -> PollFailure {
        let before = self.consecutive_failures;
        self.consecutive_failures = (before + 1).min(self.ceiling);

        let reached_ceiling = before < self.ceiling && self.consecutive_failures == self.ceiling;
        let safety_stop = reached_ceiling && self.last_known_intent;
        if safety_stop {
            self.last_known_intent = false;
        }

        let notable = before < self.ceiling
            && (self.consecutive_failures == 1 || self.consecutive_failures + 1 == self.ceiling);

        PollFailure {
            intent: Intent::stale(self.last_known_intent),
            consecutive_failures: self.consecutive_failures,
            notable,
            safety_stop,
        }
    }

    /// The intent the controller should act on
    pub fn effective_intent(&self) -> bool {
        self.last_known_intent
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn ceiling(&self) -> u32 {
        self.ceiling
    }

    pub fn ceiling_reached(&self) -> bool {
        self.consecutive_failures >= self.ceiling
    }
}

impl Default for PollState {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_CEILING)
    }
}
