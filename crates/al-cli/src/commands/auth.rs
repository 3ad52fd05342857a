//! Register, login, logout and whoami.

use std::io::Write;

use anyhow::{Context, Result, bail};

use al_api::Client;
use al_core::Credential;
use al_store::Store;

use crate::cli::Credentials;

pub const MISSING_FIELDS: &str = "Please fill in all fields";

/// Presence check on the login form. Returns the trimmed username.
pub fn validate(args: &Credentials) -> Result<&str> {
    let username = args.username.trim();
    if username.is_empty() || args.password.is_empty() {
        bail!(MISSING_FIELDS);
    }
    Ok(username)
}

pub async fn register<W: Write>(
    writer: &mut W,
    client: &Client,
    store: &mut Store,
    args: &Credentials,
) -> Result<()> {
    let username = validate(args)?;
    let credential = client.register(username, &args.password).await?;
    save(writer, store, &credential)
}

pub async fn login<W: Write>(
    writer: &mut W,
    client: &Client,
    store: &mut Store,
    args: &Credentials,
) -> Result<()> {
    let username = validate(args)?;
    let credential = client.login(username, &args.password).await?;
    save(writer, store, &credential)
}

fn save<W: Write>(writer: &mut W, store: &mut Store, credential: &Credential) -> Result<()> {
    store
        .save_credential(credential)
        .context("failed to save login")?;
    tracing::info!(username = %credential.username, "logged in");
    writeln!(writer, "Logged in as {}.", credential.username)?;
    Ok(())
}

pub fn logout<W: Write>(writer: &mut W, store: &mut Store) -> Result<()> {
    if store.clear_credential().context("failed to clear login")? {
        writeln!(writer, "Logged out.")?;
    } else {
        writeln!(writer, "Not logged in.")?;
    }
    Ok(())
}

pub fn whoami<W: Write>(writer: &mut W, store: &Store) -> Result<()> {
    match store.credential().context("failed to read saved login")? {
        Some(credential) => writeln!(writer, "Logged in as {}.", credential.username)?,
        None => writeln!(writer, "Not logged in.")?,
    }
    Ok(())
}
