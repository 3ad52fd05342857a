//! Durable client-side storage for the Aliman client.
//!
//! A small key-value table in `SQLite` holds the login credential across
//! runs, under the fixed keys [`TOKEN_KEY`] and [`USERNAME_KEY`].
//!
//! # Thread Safety
//!
//! [`Store`] wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! The CLI opens one store per command and never shares it.

use std::path::Path;

use al_core::Credential;
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

/// Key holding the bearer token.
pub const TOKEN_KEY: &str = "aliman_token";
/// Key holding the username the token belongs to.
pub const USERNAME_KEY: &str = "aliman_username";

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Key-value store backed by `SQLite`.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Opens the store at the given path, creating it if necessary.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    /// Opens an in-memory store. Contents vanish when it is dropped.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    fn init(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// Removes a key. Returns `true` if it existed.
    pub fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let removed = self
            .conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }

    /// Loads the saved credential. Both keys must be present.
    pub fn credential(&self) -> Result<Option<Credential>, StoreError> {
        let token = self.get(TOKEN_KEY)?;
        let username = self.get(USERNAME_KEY)?;
        Ok(match (token, username) {
            (Some(token), Some(username)) => Some(Credential { token, username }),
            _ => None,
        })
    }

    pub fn save_credential(&mut self, credential: &Credential) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        for (key, value) in [
            (TOKEN_KEY, credential.token.as_str()),
            (USERNAME_KEY, credential.username.as_str()),
        ] {
            tx.execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )?;
        }
        tx.commit()?;
        tracing::debug!(username = %credential.username, "credential saved");
        Ok(())
    }

    /// Forgets the credential. Returns `true` if one was stored.
    pub fn clear_credential(&mut self) -> Result<bool, StoreError> {
        let tx = self.conn.transaction()?;
        let mut removed = 0;
        for key in [TOKEN_KEY, USERNAME_KEY] {
            removed += tx.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        }
        tx.commit()?;
        Ok(removed > 0)
    }
}
