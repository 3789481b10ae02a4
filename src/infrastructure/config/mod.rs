//! Configuration adapters

mod xdg;

pub use xdg::{app_config_dir, XdgConfigStore, APP_DIR};
