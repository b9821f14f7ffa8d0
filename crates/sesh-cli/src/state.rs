//! Where the CLI keeps its session, and the client built on top of it.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;

use sesh_core::{ApiUrl, CredentialStore, SessionState};
use sesh_file::FileStorage;
use sesh_http::{Client, ClientConfig};

/// Environment variable overriding the state file location.
pub const STATE_FILE_ENV: &str = "SESH_STATE_FILE";

/// Get the state file path, creating its directory if needed.
fn state_path() -> Result<PathBuf> {
    let path = match std::env::var_os(STATE_FILE_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => {
            let dirs = ProjectDirs::from("", "", "sesh")
                .context("Could not determine data directory")?;
            dirs.data_dir().join("session.json")
        }
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("Failed to create data directory")?;
    }

    Ok(path)
}

/// Build a client for `api` backed by the state file.
pub fn open_client(api: &str) -> Result<Client> {
    let base_url = ApiUrl::new(api).context("Invalid API URL")?;
    let path = state_path()?;
    tracing::debug!(path = %path.display(), "Using state file");

    let store = CredentialStore::new(FileStorage::new(path));
    Client::new(ClientConfig::new(base_url), store).context("Failed to create client")
}

/// The stored session, or an error telling the user to log in.
pub fn require_session(client: &Client) -> Result<SessionState> {
    client
        .restore()
        .context("No active session. Run 'sesh login' first.")
}
