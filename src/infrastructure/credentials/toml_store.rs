//! TOML-file network credential store

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::application::ports::{Credential, CredentialError, CredentialStore};
use crate::infrastructure::config::app_config_dir;

#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialFile {
    #[serde(default, rename = "network")]
    networks: Vec<NetworkEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct NetworkEntry {
    ssid: String,
    password: String,
}

/// Ordered network list kept in `networks.toml` as `[[network]]` tables.
///
/// Every call reads the file afresh; the list is small and rarely changes.
pub struct TomlCredentialStore {
    path: PathBuf,
}

impl TomlCredentialStore {
    /// Store next to the config file
    pub fn new() -> Self {
        Self {
            path: app_config_dir().join("networks.toml"),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.path.clone()
    }

    fn read(&self) -> Result<CredentialFile, CredentialError> {
        if !self.path.exists() {
            return Ok(CredentialFile::default());
        }
        let content = fs::read_to_string(&self.path)
            .map_err(|e| CredentialError::ReadError(e.to_string()))?;
        toml::from_str(&content).map_err(|e| CredentialError::ParseError(e.to_string()))
    }

    fn write(&self, file: &CredentialFile) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| CredentialError::WriteError(e.to_string()))?;
        }
        let content = toml::to_string_pretty(file)
            .map_err(|e| CredentialError::WriteError(e.to_string()))?;
        fs::write(&self.path, content).map_err(|e| CredentialError::WriteError(e.to_string()))
    }
}

impl Default for TomlCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for TomlCredentialStore {
    fn len(&self) -> Result<usize, CredentialError> {
        Ok(self.read()?.networks.len())
    }

    fn get(&self, index: usize) -> Result<Option<Credential>, CredentialError> {
        Ok(self.read()?.networks.get(index).map(|entry| Credential {
            identifier: entry.ssid.clone(),
            secret: entry.password.clone(),
        }))
    }

    fn upsert(&self, identifier: &str, secret: &str) -> Result<bool, CredentialError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(CredentialError::EmptyIdentifier);
        }

        let mut file = self.read()?;
        let inserted = match file.networks.iter_mut().find(|n| n.ssid == identifier) {
            Some(existing) => {
                existing.password = secret.to_string();
                false
            }
            None => {
                file.networks.push(NetworkEntry {
                    ssid: identifier.to_string(),
                    password: secret.to_string(),
                });
                true
            }
        };

        self.write(&file)?;
        Ok(inserted)
    }
}
