// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Durable key-value storage for session data
//!
//! Plays the role of a browser's localStorage: a small string map that
//! survives restarts. The file backend keeps one JSON document on disk and
//! writes it through on every change.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorContext, Result};

/// String key-value store
pub trait KeyValueStore: Send + Sync {
    /// Get a value
    fn get(&self, key: &str) -> Option<String>;

    /// Set a value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory store, lost when the process exits
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// On-disk document layout
#[derive(Debug, Default, Serialize, Deserialize)]
struct StorageDocument {
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

/// JSON file store
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open the store at `path`, loading existing entries.
    ///
    /// A missing file is an empty store; the file is created on first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let entries = if path.exists() {
            let raw = std::fs::read_to_string(&path).storage_context("read storage file")?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                let doc: StorageDocument =
                    serde_json::from_str(&raw).storage_context("parse storage file")?;
                doc.entries
            }
        } else {
            BTreeMap::new()
        };

        tracing::debug!(path = %path.display(), entries = entries.len(), "Storage opened");

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let doc = StorageDocument {
            updated_at: Some(Utc::now()),
            entries: entries.clone(),
        };
        let json = serde_json::to_string_pretty(&doc)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).storage_context("create storage directory")?;
        }
        std::fs::write(&self.path, json).storage_context("write storage file")?;
        Ok(())
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write();
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write();
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.flush(&entries)
    }
}
