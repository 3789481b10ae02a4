//! Node runner: builds the controller and drives the cooperative loop

use std::env;
use std::process::ExitCode;
use std::thread;
use std::time::Instant;

use tracing::{error, info, warn};

use crate::application::ports::{CaptureSource, ConfigStore};
use crate::application::{
    ControllerError, ControllerSettings, PollerConfig, RecordingController, StatusPoller, TickEvent,
    UploadPipeline,
};
use crate::domain::config::AppConfig;
use crate::domain::device::DeviceId;
use crate::domain::recording::{AudioFormat, Duration};
use crate::infrastructure::{
    resolve_device_id, CpalCaptureSource, ReqwestTransport, SyntheticCaptureSource,
    XdgConfigStore,
};

use super::presenter::Presenter;
use super::signals::ShutdownSignal;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Environment overrides
pub const ENV_SERVER_URL: &str = "MEMO_SERVER_URL";
pub const ENV_DEVICE_ID: &str = "MEMO_DEVICE_ID";

/// Fully resolved settings for one run of the node
#[derive(Debug, Clone)]
pub struct NodeSettings {
    pub server_url: String,
    pub device_id: DeviceId,
    pub format: AudioFormat,
    pub max_duration: Duration,
    pub poll_interval: Duration,
    pub status_timeout: Duration,
    pub idle_interval: Duration,
    pub failure_ceiling: u32,
    pub silence_threshold_db: f64,
    /// Session buffer size in bytes
    pub capacity: usize,
}

impl NodeSettings {
    /// Resolve a merged config. Explicitly set but invalid values are errors.
    pub fn from_config(config: &AppConfig) -> Result<Self, String> {
        let max_duration = parse_duration(config.max_duration.as_deref(), "max-duration")?
            .unwrap_or_else(Duration::default_max_duration);
        if max_duration > Duration::max_session() {
            return Err(format!(
                "Invalid max-duration: {} is longer than the {} limit",
                max_duration,
                Duration::max_session()
            ));
        }
        let poll_interval = parse_duration(config.poll_interval.as_deref(), "poll-interval")?
            .unwrap_or_else(Duration::default_poll_interval);
        let device_id = resolve_device_id(config.device_id.as_deref()).map_err(|e| e.to_string())?;
        let format = config
            .audio_format()
            .map_err(|e| format!("Invalid audio config: {}", e))?;
        let capacity = format
            .capacity_for(max_duration)
            .map_err(|e| format!("Invalid max-duration: {}", e))?;
        let silence_threshold_db = config.silence_threshold_db().map_err(|e| e.to_string())?;

        Ok(Self {
            server_url: config.server_url_or_default(),
            device_id,
            format,
            max_duration,
            poll_interval,
            status_timeout: config.status_timeout_or_default(),
            idle_interval: config.idle_interval_or_default(),
            failure_ceiling: config.failure_ceiling_or_default(),
            silence_threshold_db,
            capacity,
        })
    }
}

fn parse_duration(value: Option<&str>, name: &str) -> Result<Option<Duration>, String> {
    value
        .map(|s| {
            s.parse::<Duration>()
                .map_err(|e| format!("Invalid {}: {}", name, e))
        })
        .transpose()
}

/// Run the node until SIGINT/SIGTERM
pub fn run_node(settings: NodeSettings, simulate: bool) -> ExitCode {
    let presenter = Presenter::new();

    let shutdown = ShutdownSignal::new();
    if let Err(e) = shutdown.setup() {
        presenter.error(&format!("Failed to setup signal handler: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }

    presenter.info(&format!(
        "Node {} polling {} every {} ({} Hz, {} ch, up to {} per session)",
        settings.device_id,
        settings.server_url,
        settings.poll_interval,
        settings.format.sample_rate(),
        settings.format.channels(),
        settings.max_duration
    ));

    if simulate {
        presenter.warn("Simulation mode: capturing a synthetic tone");
        let source = SyntheticCaptureSource::new(settings.format);
        return start(source, &settings, &shutdown, &presenter);
    }

    // A status poll blocks the loop for up to its timeout while audio keeps arriving
    match CpalCaptureSource::open(settings.format, settings.status_timeout) {
        Ok(source) => start(source, &settings, &shutdown, &presenter),
        Err(e) => {
            presenter.error(&format!("Audio capture unavailable: {}", e));
            presenter.info("Use --simulate to run without a microphone");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn start<C: CaptureSource>(
    capture: C,
    settings: &NodeSettings,
    shutdown: &ShutdownSignal,
    presenter: &Presenter,
) -> ExitCode {
    match build_controller(capture, settings) {
        Ok(controller) => drive(controller, shutdown, presenter),
        Err(e) => {
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Wire the controller to the HTTP transport
pub fn build_controller<C: CaptureSource>(
    capture: C,
    settings: &NodeSettings,
) -> Result<RecordingController<C, ReqwestTransport, ReqwestTransport>, ControllerError> {
    let transport = ReqwestTransport::new();
    let poller = StatusPoller::new(
        transport.clone(),
        PollerConfig {
            server_url: settings.server_url.clone(),
            device_id: settings.device_id.clone(),
            interval: settings.poll_interval,
            timeout: settings.status_timeout,
            failure_ceiling: settings.failure_ceiling,
        },
    );
    let pipeline = UploadPipeline::new(
        transport,
        settings.server_url.clone(),
        settings.device_id.clone(),
        settings.format,
    );

    info!(
        capacity_bytes = settings.capacity,
        capture = capture.name(),
        "Session buffer allocated"
    );

    RecordingController::new(
        capture,
        poller,
        pipeline,
        ControllerSettings {
            format: settings.format,
            max_duration: settings.max_duration,
            idle_interval: settings.idle_interval,
            silence_threshold_db: settings.silence_threshold_db,
        },
    )
}

fn drive<C: CaptureSource>(
    mut controller: RecordingController<C, ReqwestTransport, ReqwestTransport>,
    shutdown: &ShutdownSignal,
    presenter: &Presenter,
) -> ExitCode {
    presenter.node_status("idle");

    while !shutdown.is_shutdown() {
        match controller.tick(Instant::now()) {
            Ok(TickEvent::Started) => presenter.node_status("recording"),
            Ok(TickEvent::Stopped(reason)) => {
                presenter.node_status(&format!("uploading ({})", reason))
            }
            Ok(TickEvent::Completed(report)) => {
                presenter.session_report(&report);
                presenter.node_status("idle");
            }
            Ok(_) => {}
            Err(e) => error!(error = %e, "Controller tick failed"),
        }

        let delay = controller.next_tick_delay().as_std();
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }

    presenter.info("Shutting down");
    match controller.shutdown() {
        Ok(Some(report)) => presenter.session_report(&report),
        Ok(None) => {}
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    }
    ExitCode::from(EXIT_SUCCESS)
}

/// Overrides taken from the environment
pub fn env_config() -> AppConfig {
    let var = |name: &str| env::var(name).ok().filter(|s| !s.trim().is_empty());
    AppConfig {
        server_url: var(ENV_SERVER_URL),
        device_id: var(ENV_DEVICE_ID),
        ..Default::default()
    }
}

/// Load and merge configuration from file, env, and CLI
pub fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = store.load().unwrap_or_else(|e| {
        warn!(path = %store.path().display(), error = %e, "Ignoring unreadable config file");
        AppConfig::empty()
    });

    // Merge: defaults < file < env < cli
    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config())
        .merge(cli_config)
}
