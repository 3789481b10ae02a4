//! Network credential store port interface

use thiserror::Error;

/// Credential store errors
#[derive(Debug, Clone, Error)]
pub enum CredentialError {
    #[error("Failed to read credential store: {0}")]
    ReadError(String),

    #[error("Failed to parse credential store: {0}")]
    ParseError(String),

    #[error("Failed to write credential store: {0}")]
    WriteError(String),

    #[error("Network identifier must not be empty")]
    EmptyIdentifier,
}

/// One stored network credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub identifier: String,
    pub secret: String,
}

/// Port for the ordered list of known networks
pub trait CredentialStore {
    /// Number of stored credentials
    fn len(&self) -> Result<usize, CredentialError>;

    /// Whether the store holds no credentials
    fn is_empty(&self) -> Result<bool, CredentialError> {
        Ok(self.len()? == 0)
    }

    /// Credential at `index` in insertion order
    fn get(&self, index: usize) -> Result<Option<Credential>, CredentialError>;

    /// Replace the secret for `identifier`, or append a new entry.
    ///
    /// # Returns
    /// True if a new entry was appended
    fn upsert(&self, identifier: &str, secret: &str) -> Result<bool, CredentialError>;
}
