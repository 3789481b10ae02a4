//! CLI argument definitions using Clap

use clap::{Parser, Subcommand};

/// memo-node - remote-controlled audio capture node
#[derive(Parser, Debug)]
#[command(name = "memo-node")]
#[command(version)]
#[command(about = "Records audio when the control server asks for it and uploads each session as raw PCM")]
#[command(long_about = None)]
pub struct Cli {
    /// Control server base URL (e.g., http://10.0.0.5:8000)
    #[arg(short = 's', long, value_name = "URL")]
    pub server: Option<String>,

    /// Device id sent with every poll and upload
    #[arg(long, value_name = "ID")]
    pub device: Option<String>,

    /// Maximum length of one recording (e.g., 30s, 1m, 2m30s)
    #[arg(short = 'm', long, value_name = "TIME")]
    pub max_duration: Option<String>,

    /// Minimum time between status polls (e.g., 500ms, 1s)
    #[arg(long, value_name = "TIME")]
    pub poll_interval: Option<String>,

    /// Capture a synthetic tone instead of the microphone
    #[arg(long)]
    pub simulate: bool,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Manage known networks
    Network {
        #[command(subcommand)]
        action: NetworkAction,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Network action subcommands
#[derive(Subcommand, Debug)]
pub enum NetworkAction {
    /// Add a network, or replace the password of a known one
    Add {
        /// Network name (SSID)
        ssid: String,
        /// Network password
        #[arg(short = 'p', long, default_value = "")]
        password: String,
    },
    /// List known networks in connection order
    List,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "server_url",
    "device_id",
    "max_duration",
    "poll_interval",
    "status_timeout_ms",
    "idle_interval_ms",
    "failure_ceiling",
    "audio.sample_rate",
    "audio.channels",
    "audio.frame_samples",
    "audio.silence_threshold_db",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_defaults() {
        let cli = Cli::parse_from(["memo-node"]);
        assert!(cli.server.is_none());
        assert!(cli.device.is_none());
        assert!(cli.max_duration.is_none());
        assert!(cli.poll_interval.is_none());
        assert!(!cli.simulate);
        assert!(!cli.verbose);
        assert!(cli.command.is_none());
    }

    #[test]
    fn cli_parses_run_options() {
        let cli = Cli::parse_from([
            "memo-node",
            "-s",
            "http://10.0.0.5:8000",
            "--device",
            "memo-porch",
            "-m",
            "1m",
            "--poll-interval",
            "500ms",
            "--simulate",
            "-v",
        ]);
        assert_eq!(cli.server.as_deref(), Some("http://10.0.0.5:8000"));
        assert_eq!(cli.device.as_deref(), Some("memo-porch"));
        assert_eq!(cli.max_duration.as_deref(), Some("1m"));
        assert_eq!(cli.poll_interval.as_deref(), Some("500ms"));
        assert!(cli.simulate);
        assert!(cli.verbose);
    }

    #[test]
    fn cli_parses_config_init() {
        let cli = Cli::parse_from(["memo-node", "config", "init"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigAction::Init
            })
        ));
    }

    #[test]
    fn cli_parses_config_set() {
        let cli = Cli::parse_from(["memo-node", "config", "set", "server_url", "http://x"]);
        if let Some(Commands::Config {
            action: ConfigAction::Set { key, value },
        }) = cli.command
        {
            assert_eq!(key, "server_url");
            assert_eq!(value, "http://x");
        } else {
            panic!("Expected Config Set command");
        }
    }

    #[test]
    fn cli_parses_network_add() {
        let cli = Cli::parse_from(["memo-node", "network", "add", "home", "-p", "hunter2"]);
        if let Some(Commands::Network {
            action: NetworkAction::Add { ssid, password },
        }) = cli.command
        {
            assert_eq!(ssid, "home");
            assert_eq!(password, "hunter2");
        } else {
            panic!("Expected Network Add command");
        }
    }

    #[test]
    fn network_password_defaults_to_open() {
        let cli = Cli::parse_from(["memo-node", "network", "add", "cafe"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Network {
                action: NetworkAction::Add { ref password, .. }
            }) if password.is_empty()
        ));
    }

    #[test]
    fn valid_config_keys() {
        assert!(is_valid_config_key("server_url"));
        assert!(is_valid_config_key("audio.sample_rate"));
        assert!(!is_valid_config_key("sample_rate"));
        assert!(!is_valid_config_key("api_key"));
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }
}
