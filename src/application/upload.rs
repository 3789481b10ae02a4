//! Upload pipeline use case

use std::fmt;
use std::time::Instant;

use tracing::{error, info};

use crate::domain::device::DeviceId;
use crate::domain::metrics::QualityMetrics;
use crate::domain::recording::{AudioFormat, Duration};

use super::ports::{HttpRequest, HttpTransport};

/// Lower bound on the upload timeout
pub const MIN_UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout budget per KiB of payload (assumes at least ~10 KiB/s)
pub const TIMEOUT_PER_KIB_MS: u64 = 100;

/// Result of one upload attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Server accepted the payload (HTTP 200 or 204)
    Success { status: u16 },
    /// Transport failure (negative code) or rejected by the server (HTTP status)
    Failed { code: i32, description: String },
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

impl fmt::Display for UploadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { status } => write!(f, "uploaded (HTTP {})", status),
            Self::Failed { code, description } => {
                write!(f, "failed ({}): {}", code, description)
            }
        }
    }
}

/// Adaptive timeout: `max(30s, size_kib × 100ms)`
pub fn upload_timeout(payload_bytes: usize) -> Duration {
    let kib = (payload_bytes / 1024) as u64;
    let scaled = Duration::from_millis(kib.saturating_mul(TIMEOUT_PER_KIB_MS));
    scaled.max(MIN_UPLOAD_TIMEOUT)
}

/// Packages a finished session and delivers it to the audio endpoint
pub struct UploadPipeline<T: HttpTransport> {
    transport: T,
    server_url: String,
    device_id: DeviceId,
    format: AudioFormat,
}

impl<T: HttpTransport> UploadPipeline<T> {
    pub fn new(
        transport: T,
        server_url: impl Into<String>,
        device_id: DeviceId,
        format: AudioFormat,
    ) -> Self {
        let server_url: String = server_url.into();
        Self {
            transport,
            server_url: server_url.trim_end_matches('/').to_string(),
            device_id,
            format,
        }
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Full URL of the audio endpoint, format parameters included
    pub fn audio_url(&self) -> String {
        format!(
            "{}/audio?device={}&rate={}&bits={}&channels={}",
            self.server_url,
            self.device_id,
            self.format.sample_rate(),
            self.format.bits_per_sample(),
            self.format.channels()
        )
    }

    /// Build the outbound request for one session
    pub fn build_request<'a>(
        &self,
        payload: &'a [u8],
        metrics: &QualityMetrics,
    ) -> HttpRequest<'a> {
        let duration_secs = self.format.seconds_for(payload.len());

        let mut request = HttpRequest::post(self.audio_url(), payload, upload_timeout(payload.len()))
            .header("Content-Type", "application/octet-stream")
            .header("X-Audio-Format", "pcm")
            .header("X-Sample-Rate", self.format.sample_rate())
            .header("X-Bits-Per-Sample", self.format.bits_per_sample())
            .header("X-Channels", self.format.channels())
            .header("X-Audio-Duration-Sec", format!("{:.2}", duration_secs))
            .header("X-Audio-Clip-Count", metrics.clip_count())
            .header("X-Audio-Silence-Count", metrics.silence_count())
            .header("X-Audio-Error-Count", metrics.error_count())
            .header("X-Audio-Total-Chunks", metrics.total_chunks());

        let levels = [
            ("X-Audio-Avg-Db", metrics.avg_db()),
            ("X-Audio-Max-Db", metrics.max_db()),
            ("X-Audio-Min-Db", metrics.min_db()),
        ];
        for (name, value) in levels {
            if let Some(db) = value {
                request = request.header(name, format!("{:.2}", db));
            }
        }

        request
    }

    /// Send the session and classify the result. Never retries.
    pub fn upload(&self, payload: &[u8], metrics: &QualityMetrics) -> UploadOutcome {
        let request = self.build_request(payload, metrics);
        let duration_secs = self.format.seconds_for(payload.len());
        let started = Instant::now();

        let outcome = match self.transport.send(&request) {
            Ok(response) if matches!(response.status, 200 | 204) => UploadOutcome::Success {
                status: response.status,
            },
            Ok(response) => UploadOutcome::Failed {
                code: i32::from(response.status),
                description: describe_rejection(response.status, &response.body),
            },
            Err(e) => UploadOutcome::Failed {
                code: e.code(),
                description: e.to_string(),
            },
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            UploadOutcome::Success { status } => info!(
                device = %self.device_id,
                status,
                payload_bytes = payload.len(),
                duration_secs,
                elapsed_ms,
                "Upload complete"
            ),
            UploadOutcome::Failed { code, description } => error!(
                device = %self.device_id,
                code,
                payload_bytes = payload.len(),
                duration_secs,
                elapsed_ms,
                timeout_ms = request.timeout.as_millis(),
                "Upload failed: {}",
                description
            ),
        }

        outcome
    }
}

fn describe_rejection(status: u16, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return format!("HTTP {}", status);
    }
    let snippet: String = body.chars().take(200).collect();
    format!("HTTP {}: {}", status, snippet)
}
