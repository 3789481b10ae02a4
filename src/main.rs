//! memo-node CLI entry point

use std::process::ExitCode;

use clap::Parser;

use memo_node::cli::{
    app::{load_merged_config, run_node, NodeSettings, EXIT_ERROR, EXIT_USAGE_ERROR},
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    logging::init_logging,
    network_cmd::handle_network_command,
    presenter::Presenter,
};
use memo_node::domain::config::AppConfig;
use memo_node::infrastructure::{TomlCredentialStore, XdgConfigStore};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let presenter = Presenter::new();
    init_logging(cli.verbose);

    // Handle subcommands
    match cli.command {
        Some(Commands::Config { action }) => {
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter) {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            return ExitCode::SUCCESS;
        }
        Some(Commands::Network { action }) => {
            let store = TomlCredentialStore::new();
            if let Err(e) = handle_network_command(action, &store, &presenter) {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            return ExitCode::SUCCESS;
        }
        None => {}
    }

    // Build CLI config from args
    let cli_config = AppConfig {
        server_url: cli.server.clone(),
        device_id: cli.device.clone(),
        max_duration: cli.max_duration.clone(),
        poll_interval: cli.poll_interval.clone(),
        ..Default::default()
    };

    // Merge config
    let config = load_merged_config(cli_config);

    let settings = match NodeSettings::from_config(&config) {
        Ok(settings) => settings,
        Err(e) => {
            presenter.error(&e);
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    run_node(settings, cli.simulate)
}
