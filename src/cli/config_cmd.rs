//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::config::{AppConfig, AudioConfig, MIN_SILENCE_THRESHOLD_DB};
use crate::domain::device::DeviceId;
use crate::domain::error::ConfigError;
use crate::domain::recording::{AudioFormat, Duration};

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter),
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value),
        ConfigAction::Get { key } => handle_get(store, presenter, &key),
        ConfigAction::List => handle_list(store, presenter),
        ConfigAction::Path => handle_path(store, presenter),
    }
}

fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init()?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    require_known_key(key)?;
    let mut config = store.load()?;
    apply_value(&mut config, key, value)?;
    store.save(&config)?;
    presenter.success(&format!("{} = {}", key, value));
    Ok(())
}

fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    require_known_key(key)?;
    let config = store.load()?;
    presenter.output(read_value(&config, key).as_deref().unwrap_or(NOT_SET));
    Ok(())
}

fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load()?;
    for key in VALID_CONFIG_KEYS {
        presenter.key_value(key, read_value(&config, key).as_deref().unwrap_or(NOT_SET));
    }
    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

fn require_known_key(key: &str) -> Result<(), ConfigError> {
    if !is_valid_config_key(key) {
        return Err(ConfigError::ValidationError {
            key: key.to_string(),
            message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
        });
    }
    Ok(())
}

fn invalid(key: &str, message: impl ToString) -> ConfigError {
    ConfigError::ValidationError {
        key: key.to_string(),
        message: message.to_string(),
    }
}

/// Parse a number, mapping failures to a validation error
fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(key, format!("'{}' is not a valid number", value)))
}

/// Validate `value` for `key` and store it in `config`
fn apply_value(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
        "server_url" => {
            let url = value.trim();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(invalid(key, "URL must start with http:// or https://"));
            }
            config.server_url = Some(url.trim_end_matches('/').to_string());
        }
        "device_id" => {
            let id: DeviceId = value.parse().map_err(|e| invalid(key, e))?;
            config.device_id = Some(id.to_string());
        }
        "max_duration" | "poll_interval" => {
            let duration: Duration = value.parse().map_err(|e| invalid(key, e))?;
            if key == "max_duration" && duration > Duration::max_session() {
                return Err(invalid(
                    key,
                    format!("Sessions are limited to {}", Duration::max_session()),
                ));
            }
            if key == "max_duration" {
                config.max_duration = Some(duration.to_string());
            } else {
                config.poll_interval = Some(duration.to_string());
            }
        }
        "status_timeout_ms" | "idle_interval_ms" => {
            let ms: u64 = parse_number(key, value)?;
            if ms == 0 {
                return Err(invalid(key, "Value must be greater than zero"));
            }
            if key == "status_timeout_ms" {
                config.status_timeout_ms = Some(ms);
            } else {
                config.idle_interval_ms = Some(ms);
            }
        }
        "failure_ceiling" => {
            let ceiling: u32 = parse_number(key, value)?;
            if ceiling == 0 {
                return Err(invalid(key, "Value must be at least 1"));
            }
            config.failure_ceiling = Some(ceiling);
        }
        "audio.sample_rate" | "audio.channels" | "audio.frame_samples" => {
            let audio = config.audio.get_or_insert_with(AudioConfig::default);
            match key {
                "audio.sample_rate" => audio.sample_rate = Some(parse_number(key, value)?),
                "audio.channels" => audio.channels = Some(parse_number(key, value)?),
                _ => audio.frame_samples = Some(parse_number(key, value)?),
            }
            // Reject combinations the capture path cannot use
            let default = AudioFormat::default();
            AudioFormat::new(
                audio.sample_rate.unwrap_or(default.sample_rate()),
                audio.channels.unwrap_or(default.channels()),
                audio.frame_samples.unwrap_or(default.frame_samples()),
            )
            .map_err(|e| invalid(key, e))?;
        }
        "audio.silence_threshold_db" => {
            let db: f64 = parse_number(key, value)?;
            if !(MIN_SILENCE_THRESHOLD_DB..=0.0).contains(&db) {
                return Err(invalid(key, "Value must be between -200 and 0 dB"));
            }
            config
                .audio
                .get_or_insert_with(AudioConfig::default)
                .silence_threshold_db = Some(db);
        }
        _ => return Err(invalid(key, "Unknown key")),
    }
    Ok(())
}

/// Current value for `key` as display text
fn read_value(config: &AppConfig, key: &str) -> Option<String> {
    let audio = config.audio.as_ref();
    match key {
        "server_url" => config.server_url.clone(),
        "device_id" => config.device_id.clone(),
        "max_duration" => config.max_duration.clone(),
        "poll_interval" => config.poll_interval.clone(),
        "status_timeout_ms" => config.status_timeout_ms.map(|v| v.to_string()),
        "idle_interval_ms" => config.idle_interval_ms.map(|v| v.to_string()),
        "failure_ceiling" => config.failure_ceiling.map(|v| v.to_string()),
        "audio.sample_rate" => audio.and_then(|a| a.sample_rate).map(|v| v.to_string()),
        "audio.channels" => audio.and_then(|a| a.channels).map(|v| v.to_string()),
        "audio.frame_samples" => audio.and_then(|a| a.frame_samples).map(|v| v.to_string()),
        "audio.silence_threshold_db" => audio
            .and_then(|a| a.silence_threshold_db)
            .map(|v| v.to_string()),
        _ => None,
    }
}
