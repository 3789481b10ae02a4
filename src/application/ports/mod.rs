//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod capture;
pub mod config;
pub mod credentials;
pub mod transport;

// Re-export common types
pub use capture::{CaptureError, CaptureSource};
pub use config::ConfigStore;
pub use credentials::{Credential, CredentialError, CredentialStore};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Method, TransportError};
