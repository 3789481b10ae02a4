//! Recording controller use case
//!
//! Binds the status poller, the session buffer and metrics, the capture
//! source and the upload pipeline into one cooperative state machine.
//! The caller drives it by calling [`RecordingController::tick`] in a loop
//! and sleeping for [`RecordingController::next_tick_delay`] in between.

use std::fmt;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::capture::AppendOutcome;
use crate::domain::error::AudioFormatError;
use crate::domain::metrics::QualityMetrics;
use crate::domain::recording::{AudioFormat, Duration};
use crate::domain::session::{InvalidStateTransition, RecordingSession, SessionState};

use super::poller::StatusPoller;
use super::ports::{CaptureError, CaptureSource, HttpTransport};
use super::upload::{UploadOutcome, UploadPipeline};

/// Shortest wait for one capture frame
const MIN_CAPTURE_TIMEOUT_MS: u64 = 100;

/// Errors from the controller
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    InvalidState(#[from] InvalidStateTransition),

    #[error("Cannot size session buffer: {0}")]
    Format(#[from] AudioFormatError),
}

/// Why a recording ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The server reported "not recording"
    Explicit,
    /// Status unreachable for the whole failure window
    SafetyStop,
    /// The session buffer filled up
    CapacityReached,
    /// The process is shutting down
    Shutdown,
}

impl StopReason {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Explicit => "stop requested",
            Self::SafetyStop => "safety stop",
            Self::CapacityReached => "buffer full",
            Self::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Summary of one finished Recording -> Uploading -> Idle cycle
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub reason: StopReason,
    pub bytes: usize,
    pub duration_secs: f64,
    pub metrics: QualityMetrics,
    /// None when the session held no audio and was not uploaded
    pub outcome: Option<UploadOutcome>,
}

/// What one tick did
#[derive(Debug, Clone, PartialEq)]
pub enum TickEvent {
    /// Nothing to do
    Idle,
    /// A new session started
    Started,
    /// One frame was stored
    Captured(AppendOutcome),
    /// The capture source failed for this frame; the session continues
    CaptureFailed(CaptureError),
    /// Recording ended; the upload runs on the next tick
    Stopped(StopReason),
    /// The session was uploaded (or skipped) and the controller is idle again
    Completed(SessionReport),
}

/// Tunables for the controller loop
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub format: AudioFormat,
    /// Maximum length of one session; sizes the buffer
    pub max_duration: Duration,
    /// Sleep between ticks while idle
    pub idle_interval: Duration,
    pub silence_threshold_db: f64,
}

/// Recording lifecycle controller.
///
/// State machine:
///   IDLE -> RECORDING (intent "recording", fresh or sticky)
///   RECORDING -> UPLOADING (fresh stop, safety stop, buffer full, shutdown)
///   UPLOADING -> IDLE (after any upload outcome)
pub struct RecordingController<C, S, U>
where
    C: CaptureSource,
    S: HttpTransport,
    U: HttpTransport,
{
    capture: C,
    poller: StatusPoller<S>,
    pipeline: UploadPipeline<U>,
    session: RecordingSession,
    frame: Box<[u8]>,
    capture_timeout: Duration,
    idle_interval: Duration,
    stop_reason: Option<StopReason>,
}

impl<C, S, U> RecordingController<C, S, U>
where
    C: CaptureSource,
    S: HttpTransport,
    U: HttpTransport,
{
    /// Create an idle controller. The session buffer and the frame scratch
    /// space are allocated here, once.
    pub fn new(
        capture: C,
        poller: StatusPoller<S>,
        pipeline: UploadPipeline<U>,
        settings: ControllerSettings,
    ) -> Result<Self, ControllerError> {
        let format = settings.format;
        let capacity = format.capacity_for(settings.max_duration)?;
        let samples_per_sec = u64::from(format.sample_rate()) * u64::from(format.channels());
        let frame_ms = (format.frame_samples() as u64 * 1000) / samples_per_sec;

        Ok(Self {
            capture,
            poller,
            pipeline,
            session: RecordingSession::new(capacity, settings.silence_threshold_db),
            frame: vec![0u8; format.frame_bytes()].into_boxed_slice(),
            capture_timeout: Duration::from_millis((frame_ms * 4).max(MIN_CAPTURE_TIMEOUT_MS)),
            idle_interval: settings.idle_interval,
            stop_reason: None,
        })
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn session(&self) -> &RecordingSession {
        &self.session
    }

    pub fn poller(&self) -> &StatusPoller<S> {
        &self.poller
    }

    /// How long the caller should wait before the next tick
    pub fn next_tick_delay(&self) -> Duration {
        match self.session.state() {
            SessionState::Idle => self.idle_interval,
            SessionState::Recording | SessionState::Uploading => Duration::from_millis(0),
        }
    }

    /// Run one cooperative step.
    ///
    /// While recording this pulls exactly one frame unless the tick ends
    /// the session. An upload happens on the tick after the stop.
    pub fn tick(&mut self, now: Instant) -> Result<TickEvent, ControllerError> {
        match self.session.state() {
            SessionState::Uploading => {
                let report = self.upload_and_complete()?;
                Ok(TickEvent::Completed(report))
            }
            SessionState::Idle => match self.poller.poll_if_due(now) {
                Some(intent) if intent.recording => {
                    self.session.begin()?;
                    // Audio queued while idle belongs to no session
                    self.capture.reset();
                    info!(source = %intent.source, "Recording started");
                    Ok(TickEvent::Started)
                }
                _ => Ok(TickEvent::Idle),
            },
            SessionState::Recording => {
                if let Some(intent) = self.poller.poll_if_due(now) {
                    if !intent.recording {
                        let reason = if intent.is_fresh() {
                            StopReason::Explicit
                        } else {
                            StopReason::SafetyStop
                        };
                        self.stop(reason)?;
                        return Ok(TickEvent::Stopped(reason));
                    }
                }
                self.capture_frame()
            }
        }
    }

    /// Finish any in-progress session through the upload path
    pub fn shutdown(&mut self) -> Result<Option<SessionReport>, ControllerError> {
        if self.session.is_recording() {
            self.stop(StopReason::Shutdown)?;
        }
        if self.session.is_uploading() {
            return self.upload_and_complete().map(Some);
        }
        Ok(None)
    }

    fn capture_frame(&mut self) -> Result<TickEvent, ControllerError> {
        match self.capture.read_frame(&mut self.frame, self.capture_timeout) {
            Ok(n) => {
                let outcome = self.session.capture(&self.frame[..n])?;
                if outcome == AppendOutcome::Full || self.session.buffer().is_full() {
                    self.stop(StopReason::CapacityReached)?;
                    return Ok(TickEvent::Stopped(StopReason::CapacityReached));
                }
                Ok(TickEvent::Captured(outcome))
            }
            Err(e) => {
                self.session.record_capture_error()?;
                debug!(
                    source = self.capture.name(),
                    errors = self.session.metrics().error_count(),
                    error = %e,
                    "Capture read failed"
                );
                Ok(TickEvent::CaptureFailed(e))
            }
        }
    }

    fn stop(&mut self, reason: StopReason) -> Result<(), ControllerError> {
        self.session.finish()?;
        self.stop_reason = Some(reason);
        info!(
            reason = %reason,
            bytes = self.session.buffer().bytes_filled(),
            frames = self.session.metrics().total_chunks(),
            "Recording stopped"
        );
        Ok(())
    }

    fn upload_and_complete(&mut self) -> Result<SessionReport, ControllerError> {
        let reason = self.stop_reason.take().unwrap_or(StopReason::Explicit);
        let payload = self.session.buffer().as_bytes();
        let metrics = self.session.metrics();

        let outcome = if payload.is_empty() {
            warn!(reason = %reason, "Session captured no audio; skipping upload");
            None
        } else {
            Some(self.pipeline.upload(payload, metrics))
        };

        let report = SessionReport {
            reason,
            bytes: payload.len(),
            duration_secs: self.pipeline.format().seconds_for(payload.len()),
            metrics: metrics.clone(),
            outcome,
        };

        self.session.complete()?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::poller::PollerConfig;
    use crate::application::ports::{HttpRequest, HttpResponse, TransportError};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;
    use std::time::Duration as StdDuration;

    /// Scripted status endpoint; an exhausted script means "unreachable"
    struct MockStatus {
        replies: RefCell<VecDeque<Result<HttpResponse, TransportError>>>,
    }

    impl HttpTransport for MockStatus {
        fn send(&self, _request: &HttpRequest<'_>) -> Result<HttpResponse, TransportError> {
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or(Err(TransportError::ConnectionRefused))
        }
    }

    /// Audio endpoint that records every body it receives
    struct MockAudio {
        status: u16,
        bodies: Rc<RefCell<Vec<Vec<u8>>>>,
    }

    impl HttpTransport for MockAudio {
        fn send(&self, request: &HttpRequest<'_>) -> Result<HttpResponse, TransportError> {
            self.bodies.borrow_mut().push(request.body.to_vec());
            Ok(HttpResponse::new(self.status, ""))
        }
    }

    /// Capture source replaying scripted frames, then a fallback frame.
    /// `backlog` stands for audio queued before the last reset.
    struct MockCapture {
        backlog: VecDeque<Result<Vec<u8>, CaptureError>>,
        frames: VecDeque<Result<Vec<u8>, CaptureError>>,
        fallback: Option<Vec<u8>>,
        resets: u32,
    }

    impl CaptureSource for MockCapture {
        fn read_frame(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize, CaptureError> {
            let next = self.backlog.pop_front().or_else(|| self.frames.pop_front());
            let frame = match next {
                Some(frame) => frame?,
                None => self.fallback.clone().ok_or(CaptureError::Timeout)?,
            };
            let n = frame.len().min(buf.len());
            buf[..n].copy_from_slice(&frame[..n]);
            Ok(n)
        }

        fn reset(&mut self) {
            self.backlog.clear();
            self.resets += 1;
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    fn ok(recording: bool) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse::new(200, format!("{{\"recording\":{}}}", recording)))
    }

    fn unreachable() -> Result<HttpResponse, TransportError> {
        Err(TransportError::ReadTimeout)
    }

    /// 1 kHz mono, 4 samples (8 bytes) per frame
    fn format() -> AudioFormat {
        AudioFormat::new(1000, 1, 4).unwrap()
    }

    fn frame(seed: u8) -> Vec<u8> {
        (0..8).map(|i| seed.wrapping_add(i)).collect()
    }

    struct Harness {
        controller: RecordingController<MockCapture, MockStatus, MockAudio>,
        bodies: Rc<RefCell<Vec<Vec<u8>>>>,
        t0: Instant,
    }

    impl Harness {
        fn at(&mut self, ms: u64) -> TickEvent {
            self.controller
                .tick(self.t0 + StdDuration::from_millis(ms))
                .unwrap()
        }
    }

    fn harness(
        polls: Vec<Result<HttpResponse, TransportError>>,
        frames: Vec<Result<Vec<u8>, CaptureError>>,
        fallback: Option<Vec<u8>>,
        max_duration: Duration,
        ceiling: u32,
        upload_status: u16,
    ) -> Harness {
        let bodies = Rc::new(RefCell::new(Vec::new()));
        let poller = StatusPoller::new(
            MockStatus {
                replies: RefCell::new(polls.into()),
            },
            PollerConfig {
                server_url: "http://server".to_string(),
                device_id: "memo-test".parse().unwrap(),
                interval: Duration::from_secs(1),
                timeout: Duration::from_secs(1),
                failure_ceiling: ceiling,
            },
        );
        let pipeline = UploadPipeline::new(
            MockAudio {
                status: upload_status,
                bodies: Rc::clone(&bodies),
            },
            "http://server",
            "memo-test".parse().unwrap(),
            format(),
        );
        let controller = RecordingController::new(
            MockCapture {
                backlog: VecDeque::new(),
                frames: frames.into(),
                fallback,
                resets: 0,
            },
            poller,
            pipeline,
            ControllerSettings {
                format: format(),
                max_duration,
                idle_interval: Duration::from_millis(100),
                silence_threshold_db: -40.0,
            },
        )
        .unwrap();
        Harness {
            controller,
            bodies,
            t0: Instant::now(),
        }
    }

    #[test]
    fn records_three_frames_and_uploads_them_in_order() {
        let mut h = harness(
            vec![ok(true), ok(true), ok(false)],
            vec![Ok(frame(1)), Ok(frame(20)), Ok(frame(40))],
            None,
            Duration::from_secs(1),
            10,
            200,
        );

        assert_eq!(h.at(0), TickEvent::Started);
        assert_eq!(h.controller.state(), SessionState::Recording);
        assert_eq!(h.at(100), TickEvent::Captured(AppendOutcome::Accepted(8)));
        assert_eq!(h.at(1000), TickEvent::Captured(AppendOutcome::Accepted(8)));
        assert_eq!(h.at(1500), TickEvent::Captured(AppendOutcome::Accepted(8)));
        assert_eq!(h.at(2000), TickEvent::Stopped(StopReason::Explicit));
        assert_eq!(h.controller.state(), SessionState::Uploading);

        let report = match h.at(2001) {
            TickEvent::Completed(report) => report,
            other => panic!("expected completion, got {:?}", other),
        };
        assert_eq!(h.controller.state(), SessionState::Idle);
        assert_eq!(report.reason, StopReason::Explicit);
        assert_eq!(report.bytes, 24);
        assert_eq!(report.metrics.total_chunks(), 3);
        assert_eq!(report.outcome, Some(UploadOutcome::Success { status: 200 }));

        let expected: Vec<u8> = [frame(1), frame(20), frame(40)].concat();
        assert_eq!(*h.bodies.borrow(), vec![expected]);
    }

    #[test]
    fn full_buffer_forces_stop_while_still_recording() {
        // 8ms at 2000 B/s: exactly two frames
        let mut h = harness(
            vec![ok(true)],
            vec![],
            Some(frame(7)),
            Duration::from_millis(8),
            10,
            204,
        );

        assert_eq!(h.at(0), TickEvent::Started);
        assert_eq!(h.at(10), TickEvent::Captured(AppendOutcome::Accepted(8)));
        assert_eq!(h.at(20), TickEvent::Stopped(StopReason::CapacityReached));
        assert!(h.controller.poller().state().effective_intent());

        match h.at(30) {
            TickEvent::Completed(report) => {
                assert_eq!(report.bytes, 16);
                assert_eq!(report.reason, StopReason::CapacityReached);
            }
            other => panic!("expected completion, got {:?}", other),
        }
        assert_eq!(h.bodies.borrow()[0].len(), 16);
    }

    #[test]
    fn sticky_intent_restarts_after_forced_stop() {
        let mut h = harness(
            vec![ok(true), unreachable()],
            vec![],
            Some(frame(3)),
            Duration::from_millis(8),
            10,
            200,
        );

        h.at(0);
        h.at(10);
        h.at(20);
        assert!(matches!(h.at(30), TickEvent::Completed(_)));
        assert_eq!(h.at(500), TickEvent::Idle);
        assert_eq!(h.at(1000), TickEvent::Started);
        assert_eq!(h.controller.capture.resets, 2);
    }

    #[test]
    fn audio_queued_while_idle_is_discarded_at_start() {
        let mut h = harness(
            vec![ok(true), ok(false)],
            vec![],
            Some(frame(9)),
            Duration::from_secs(1),
            10,
            200,
        );
        h.controller.capture.backlog.extend([
            Err(CaptureError::Driver("overrun: 36 samples dropped".to_string())),
            Ok(frame(111)),
        ]);

        assert_eq!(h.at(0), TickEvent::Started);
        assert_eq!(h.controller.capture.resets, 1);
        assert_eq!(h.at(10), TickEvent::Captured(AppendOutcome::Accepted(8)));
        assert_eq!(h.at(1000), TickEvent::Stopped(StopReason::Explicit));

        let report = match h.at(1001) {
            TickEvent::Completed(report) => report,
            other => panic!("expected completion, got {:?}", other),
        };
        assert_eq!(report.metrics.error_count(), 0);
        assert_eq!(*h.bodies.borrow(), vec![frame(9)]);
    }

    #[test]
    fn oversized_buffer_is_rejected_at_construction() {
        let poller = StatusPoller::new(
            MockStatus {
                replies: RefCell::new(VecDeque::new()),
            },
            PollerConfig {
                server_url: "http://server".to_string(),
                device_id: "memo-test".parse().unwrap(),
                interval: Duration::from_secs(1),
                timeout: Duration::from_secs(1),
                failure_ceiling: 10,
            },
        );
        let pipeline = UploadPipeline::new(
            MockAudio {
                status: 200,
                bodies: Rc::new(RefCell::new(Vec::new())),
            },
            "http://server",
            "memo-test".parse().unwrap(),
            AudioFormat::default(),
        );
        let result = RecordingController::new(
            MockCapture {
                backlog: VecDeque::new(),
                frames: VecDeque::new(),
                fallback: None,
                resets: 0,
            },
            poller,
            pipeline,
            ControllerSettings {
                format: AudioFormat::default(),
                max_duration: Duration::from_millis(u64::MAX),
                idle_interval: Duration::from_millis(100),
                silence_threshold_db: -40.0,
            },
        );
        assert!(matches!(result, Err(ControllerError::Format(_))));
    }

    #[test]
    fn transient_failure_holds_recording() {
        let mut h = harness(
            vec![ok(true), unreachable(), ok(false)],
            vec![],
            Some(frame(5)),
            Duration::from_secs(10),
            10,
            200,
        );

        assert_eq!(h.at(0), TickEvent::Started);
        assert_eq!(h.at(1000), TickEvent::Captured(AppendOutcome::Accepted(8)));
        assert_eq!(h.controller.state(), SessionState::Recording);
        assert_eq!(h.at(2000), TickEvent::Stopped(StopReason::Explicit));
    }

    #[test]
    fn failure_ceiling_triggers_safety_stop() {
        let mut h = harness(
            vec![ok(true)],
            vec![],
            Some(frame(9)),
            Duration::from_secs(10),
            3,
            200,
        );

        assert_eq!(h.at(0), TickEvent::Started);
        assert!(matches!(h.at(1000), TickEvent::Captured(_)));
        assert!(matches!(h.at(2000), TickEvent::Captured(_)));
        assert_eq!(h.at(3000), TickEvent::Stopped(StopReason::SafetyStop));
        assert!(matches!(h.at(3001), TickEvent::Completed(_)));

        // Latched off: stale reads do not restart
        assert_eq!(h.at(4000), TickEvent::Idle);
        assert_eq!(h.at(5000), TickEvent::Idle);
    }

    #[test]
    fn capture_errors_are_counted_and_session_continues() {
        let mut h = harness(
            vec![ok(true), ok(false)],
            vec![
                Ok(frame(1)),
                Err(CaptureError::Driver("overrun".to_string())),
                Ok(frame(2)),
            ],
            None,
            Duration::from_secs(1),
            10,
            200,
        );

        h.at(0);
        h.at(10);
        assert_eq!(
            h.at(20),
            TickEvent::CaptureFailed(CaptureError::Driver("overrun".to_string()))
        );
        assert_eq!(h.controller.state(), SessionState::Recording);
        h.at(30);
        h.at(1000);

        match h.at(1001) {
            TickEvent::Completed(report) => {
                assert_eq!(report.metrics.error_count(), 1);
                assert_eq!(report.metrics.total_chunks(), 2);
                assert_eq!(report.bytes, 16);
            }
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[test]
    fn empty_session_is_not_uploaded() {
        let mut h = harness(
            vec![ok(true), ok(false)],
            vec![],
            None,
            Duration::from_secs(1),
            10,
            200,
        );

        h.at(0);
        assert_eq!(h.at(1000), TickEvent::Stopped(StopReason::Explicit));
        match h.at(1001) {
            TickEvent::Completed(report) => {
                assert_eq!(report.bytes, 0);
                assert_eq!(report.outcome, None);
            }
            other => panic!("expected completion, got {:?}", other),
        }
        assert!(h.bodies.borrow().is_empty());
    }

    #[test]
    fn failed_upload_still_returns_to_idle() {
        let mut h = harness(
            vec![ok(true), ok(false)],
            vec![Ok(frame(1))],
            None,
            Duration::from_secs(1),
            10,
            500,
        );

        h.at(0);
        h.at(10);
        h.at(1000);
        match h.at(1001) {
            TickEvent::Completed(report) => {
                assert_eq!(
                    report.outcome,
                    Some(UploadOutcome::Failed {
                        code: 500,
                        description: "HTTP 500".to_string(),
                    })
                );
            }
            other => panic!("expected completion, got {:?}", other),
        }
        assert_eq!(h.controller.state(), SessionState::Idle);
        assert_eq!(h.controller.session().buffer().bytes_filled(), 0);
    }

    #[test]
    fn shutdown_uploads_in_progress_session() {
        let mut h = harness(
            vec![ok(true)],
            vec![],
            Some(frame(4)),
            Duration::from_secs(1),
            10,
            200,
        );

        h.at(0);
        h.at(10);
        h.at(20);
        let report = h.controller.shutdown().unwrap().unwrap();
        assert_eq!(report.reason, StopReason::Shutdown);
        assert_eq!(report.bytes, 16);
        assert_eq!(h.bodies.borrow().len(), 1);
        assert_eq!(h.controller.state(), SessionState::Idle);
    }

    #[test]
    fn shutdown_while_idle_does_nothing() {
        let mut h = harness(vec![], vec![], None, Duration::from_secs(1), 10, 200);
        assert!(h.controller.shutdown().unwrap().is_none());
    }

    #[test]
    fn idle_ticks_are_slow_and_recording_ticks_immediate() {
        let mut h = harness(
            vec![ok(true)],
            vec![],
            Some(frame(0)),
            Duration::from_secs(1),
            10,
            200,
        );

        assert_eq!(h.controller.next_tick_delay(), Duration::from_millis(100));
        h.at(0);
        assert_eq!(h.controller.next_tick_delay(), Duration::from_millis(0));
    }

    #[test]
    fn stop_reason_labels() {
        assert_eq!(StopReason::Explicit.to_string(), "stop requested");
        assert_eq!(StopReason::SafetyStop.to_string(), "safety stop");
        assert_eq!(StopReason::CapacityReached.to_string(), "buffer full");
        assert_eq!(StopReason::Shutdown.to_string(), "shutdown");
    }
}
