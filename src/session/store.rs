// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Session store holding the current auth token

use std::sync::Arc;

use parking_lot::RwLock;

use super::storage::KeyValueStore;
use crate::config::DEFAULT_TOKEN_KEY;
use crate::error::Result;

/// Current authentication state
pub trait SessionStore: Send + Sync {
    /// Current token, if logged in
    fn token(&self) -> Option<String>;

    /// Replace the current token
    fn set_token(&self, token: &str) -> Result<()>;

    /// Clear the token and everything derived from it
    fn logout(&self) -> Result<()>;

    /// Whether a token is currently held
    fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}

/// Token held in memory and mirrored into a durable store
pub struct Session {
    token: RwLock<Option<String>>,
    storage: Arc<dyn KeyValueStore>,
    key: String,
}

impl Session {
    /// Create a session backed by `storage`, restoring any persisted token
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(storage, DEFAULT_TOKEN_KEY)
    }

    /// Create a session that persists its token under `key`
    pub fn with_key(storage: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let token = storage.get(&key);
        Self {
            token: RwLock::new(token),
            storage,
            key,
        }
    }
}

impl SessionStore for Session {
    fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    fn set_token(&self, token: &str) -> Result<()> {
        *self.token.write() = Some(token.to_string());
        self.storage.set(&self.key, token)
    }

    fn logout(&self) -> Result<()> {
        *self.token.write() = None;
        self.storage.remove(&self.key)?;
        tracing::info!("Session cleared");
        Ok(())
    }
}
