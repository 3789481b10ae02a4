//! Device identity value object

use std::fmt;
use std::str::FromStr;

use crate::domain::error::InvalidDeviceId;

/// Fallback identity when nothing better is known
pub const DEFAULT_DEVICE_ID: &str = "memo-node";

/// Stable device identifier sent with every status poll and upload.
/// Restricted to characters that need no escaping in a query string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceId(String);

impl DeviceId {
    /// Derive an identity from a host name, e.g. `memo-kitchen-pi`
    pub fn from_hostname(hostname: &str) -> Self {
        let sanitized: String = hostname
            .trim()
            .chars()
            .map(|c| if is_allowed(c) { c.to_ascii_lowercase() } else { '-' })
            .collect();
        let sanitized = sanitized.trim_matches('-');

        if sanitized.is_empty() {
            Self::default()
        } else {
            Self(format!("memo-{}", sanitized))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

impl FromStr for DeviceId {
    type Err = InvalidDeviceId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.chars().all(is_allowed) {
            return Err(InvalidDeviceId {
                input: s.to_string(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl Default for DeviceId {
    fn default() -> Self {
        Self(DEFAULT_DEVICE_ID.to_string())
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
