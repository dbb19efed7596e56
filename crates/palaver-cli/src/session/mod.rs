//! CLI session wiring.

pub mod storage;

use std::sync::Arc;

use anyhow::{Context, Result};

use palaver::{ApiClient, BaseUrl, ClientConfig, Navigator, Session};

use crate::output;
use storage::FileStore;

/// Tells the user to sign in again once the client drops the session.
#[derive(Debug, Default)]
pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn current_path(&self) -> Option<String> {
        None
    }

    fn navigate(&self, _path: &str) {
        output::error("Session expired. Run 'palaver login' to sign in again.");
    }
}

/// Build a session against `server` backed by the credentials file.
pub fn connect(server: &str) -> Result<Session> {
    let base_url = BaseUrl::new(server).context("Invalid server URL")?;
    let store = FileStore::default_location().context("Failed to open credentials file")?;

    let client = ApiClient::builder(ClientConfig::new(base_url))
        .store(Arc::new(store))
        .navigator(Arc::new(TerminalNavigator))
        .build()
        .context("Failed to build HTTP client")?;

    Ok(Session::new(client))
}
