//! CLI subcommand implementations.

use anyhow::{Context, Result};

use al_api::Client;
use al_core::Credential;
use al_store::Store;

use crate::Config;

pub mod auth;
pub mod chat;
pub mod dashboard;
pub mod focus;
pub mod plans;
pub mod review;

/// Message shown when a command needs a login that isn't there.
pub const NOT_LOGGED_IN: &str = "Not logged in. Run `aliman login` first.";

/// Opens the credential store, ensuring the parent directory exists.
pub fn open_store(config: &Config) -> Result<Store> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create data directory")?;
    }
    Store::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))
}

/// Client without credentials, for register/login.
pub fn anonymous_client(config: &Config) -> Result<Client> {
    Client::new(config.api_url.clone()).context("failed to create API client")
}

/// Client carrying the saved token, plus the credential it came from.
pub fn authenticated_client(config: &Config, store: &Store) -> Result<(Client, Credential)> {
    let credential = store
        .credential()
        .context("failed to read saved login")?
        .context(NOT_LOGGED_IN)?;
    let client = anonymous_client(config)?.with_token(credential.token.clone());
    Ok((client, credential))
}
