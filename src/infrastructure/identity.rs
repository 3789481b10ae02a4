//! Device identity resolution

use tracing::debug;

use crate::domain::device::DeviceId;
use crate::domain::error::InvalidDeviceId;

/// Resolve the identity once at startup.
///
/// A configured id wins (and must be valid); otherwise `memo-<hostname>`,
/// falling back to `memo-node` when the host name is unavailable.
pub fn resolve_device_id(configured: Option<&str>) -> Result<DeviceId, InvalidDeviceId> {
    if let Some(id) = configured {
        return id.parse();
    }

    match hostname() {
        Some(name) => Ok(DeviceId::from_hostname(&name)),
        None => {
            debug!("Host name unavailable; using default device id");
            Ok(DeviceId::default())
        }
    }
}

#[cfg(unix)]
fn hostname() -> Option<String> {
    nix::unistd::gethostname()
        .ok()
        .and_then(|name| name.into_string().ok())
}

#[cfg(not(unix))]
fn hostname() -> Option<String> {
    std::env::var("COMPUTERNAME").ok()
}
