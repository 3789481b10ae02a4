//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with external systems like cpal, reqwest and the filesystem.

pub mod capture;
pub mod config;
pub mod credentials;
pub mod http;
pub mod identity;

// Re-export adapters
pub use capture::{CpalCaptureSource, SyntheticCaptureSource};
pub use config::XdgConfigStore;
pub use credentials::TomlCredentialStore;
pub use http::ReqwestTransport;
pub use identity::resolve_device_id;
