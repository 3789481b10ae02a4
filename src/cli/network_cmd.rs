//! Network command handler

use crate::application::ports::{CredentialError, CredentialStore};

use super::args::NetworkAction;
use super::presenter::Presenter;

/// Handle network subcommand
pub fn handle_network_command<S: CredentialStore>(
    action: NetworkAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), CredentialError> {
    match action {
        NetworkAction::Add { ssid, password } => {
            if store.upsert(&ssid, &password)? {
                presenter.success(&format!("Added network '{}'", ssid.trim()));
            } else {
                presenter.success(&format!("Updated network '{}'", ssid.trim()));
            }
            Ok(())
        }
        NetworkAction::List => {
            let count = store.len()?;
            if count == 0 {
                presenter.info("No networks configured");
                return Ok(());
            }
            for index in 0..count {
                if let Some(credential) = store.get(index)? {
                    presenter.key_value(
                        &format!("{}. {}", index + 1, credential.identifier),
                        &mask_secret(&credential.secret),
                    );
                }
            }
            Ok(())
        }
    }
}

/// Mask a secret for display (show first 2 and last 2 chars)
fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    match chars.len() {
        0 => "(open)".to_string(),
        n if n <= 6 => "*".repeat(n),
        n => format!(
            "{}{}{}",
            chars[..2].iter().collect::<String>(),
            "*".repeat(n - 4),
            chars[n - 2..].iter().collect::<String>()
        ),
    }
}
