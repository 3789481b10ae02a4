//! Status poller use case

use std::time::Instant;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::device::DeviceId;
use crate::domain::poll::{Intent, PollState};
use crate::domain::recording::Duration;

use super::ports::{HttpRequest, HttpTransport, TransportError};

/// Why a single status poll did not yield an intent
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    #[error("status request failed: {0}")]
    Transport(#[from] TransportError),

    #[error("status endpoint returned HTTP {0}")]
    Status(u16),

    #[error("malformed status body: {0}")]
    Body(String),
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    recording: bool,
}

/// Settings for the status poller
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Base server URL without trailing slash
    pub server_url: String,
    pub device_id: DeviceId,
    /// Minimum time between two polls
    pub interval: Duration,
    /// Timeout for a single status request
    pub timeout: Duration,
    /// Consecutive failures before the safety stop
    pub failure_ceiling: u32,
}

/// Rate-limited, failure-tolerant reader of the remote recording intent
pub struct StatusPoller<T: HttpTransport> {
    transport: T,
    status_url: String,
    device_id: DeviceId,
    interval: Duration,
    timeout: Duration,
    state: PollState,
    last_poll: Option<Instant>,
}

impl<T: HttpTransport> StatusPoller<T> {
    pub fn new(transport: T, config: PollerConfig) -> Self {
        let status_url = format!(
            "{}/status?device={}",
            config.server_url.trim_end_matches('/'),
            config.device_id
        );
        Self {
            transport,
            status_url,
            device_id: config.device_id,
            interval: config.interval,
            timeout: config.timeout,
            state: PollState::new(config.failure_ceiling),
            last_poll: None,
        }
    }

    /// Full URL of the status endpoint
    pub fn status_url(&self) -> &str {
        &self.status_url
    }

    pub fn state(&self) -> &PollState {
        &self.state
    }

    /// Whether the minimum interval has elapsed since the last poll
    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_poll {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval.as_std(),
        }
    }

    /// Poll only if the interval has elapsed
    pub fn poll_if_due(&mut self, now: Instant) -> Option<Intent> {
        if !self.is_due(now) {
            return None;
        }
        self.last_poll = Some(now);
        Some(self.poll())
    }

    /// Query the status endpoint once and fold the result into the state.
    ///
    /// Never fails: a failed query yields the last known intent marked
    /// stale.
    pub fn poll(&mut self) -> Intent {
        match self.fetch() {
            Ok(recording) => {
                let failures = self.state.consecutive_failures();
                if failures > 0 {
                    info!(
                        device = %self.device_id,
                        failures,
                        "Status poll recovered"
                    );
                }
                debug!(device = %self.device_id, recording, "Status poll");
                self.state.record_success(recording)
            }
            Err(e) => {
                let failure = self.state.record_failure();
                if failure.notable {
                    warn!(
                        device = %self.device_id,
                        failures = failure.consecutive_failures,
                        ceiling = self.state.ceiling(),
                        error = %e,
                        "Status poll failed; holding last known intent"
                    );
                }
                if failure.safety_stop {
                    warn!(
                        device = %self.device_id,
                        failures = failure.consecutive_failures,
                        "Status unreachable; forcing recording stop"
                    );
                }
                failure.intent
            }
        }
    }

    fn fetch(&self) -> Result<bool, PollError> {
        let request = HttpRequest::get(self.status_url.as_str(), self.timeout);
        let response = self.transport.send(&request)?;
        if response.status != 200 {
            return Err(PollError::Status(response.status));
        }
        let body: StatusBody =
            serde_json::from_str(&response.body).map_err(|e| PollError::Body(e.to_string()))?;
        Ok(body.recording)
    }
}
