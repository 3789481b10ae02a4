//! CLI layer - Command-line interface
//!
//! Contains argument parsing, output formatting, signal handling,
//! logging setup and the node runner.

pub mod app;
pub mod args;
pub mod config_cmd;
pub mod logging;
pub mod network_cmd;
pub mod presenter;
pub mod signals;

// Re-export commonly used types
pub use app::{run_node, NodeSettings, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
pub use args::{Cli, Commands, ConfigAction, NetworkAction};
pub use presenter::Presenter;
