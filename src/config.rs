// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Client configuration

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};
use crate::http::{headers, DEFAULT_USER_AGENT};
use crate::network::Whitelist;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Key the token is stored under in the durable store
pub const DEFAULT_TOKEN_KEY: &str = "token";

/// Default location of the durable store used by the CLI
pub const DEFAULT_STORAGE_FILE: &str = "portier-storage.json";

/// Request client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL relative paths are resolved against
    pub base_url: Option<Url>,
    /// Default timeout for every request
    pub timeout: Duration,
    /// Send and store cookies on cross-origin requests
    pub with_credentials: bool,
    /// User agent string
    pub user_agent: String,
    /// Headers added to every request
    pub default_headers: Vec<(String, String)>,
    /// Paths that may be called without a token
    pub whitelist: Whitelist,
    /// Durable store key holding the token
    pub token_key: String,
    /// Location of the durable store file
    pub storage_path: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
            with_credentials: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            default_headers: vec![(headers::ACCEPT.to_string(), "application/json".to_string())],
            whitelist: Whitelist::default(),
            token_key: DEFAULT_TOKEN_KEY.to_string(),
            storage_path: PathBuf::from(DEFAULT_STORAGE_FILE),
        }
    }
}

impl ClientConfig {
    /// Create a new client config
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a config from `PORTIER_*` environment variables.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(base) = lookup("PORTIER_BASE_URL") {
            config = config.base_url(&base)?;
        }

        if let Some(ms) = lookup("PORTIER_TIMEOUT_MS") {
            let ms: u64 = ms
                .trim()
                .parse()
                .map_err(|_| Error::config(format!("PORTIER_TIMEOUT_MS is not a number: {}", ms)))?;
            config.timeout = Duration::from_millis(ms);
        }

        if let Some(path) = lookup("PORTIER_STORAGE") {
            config.storage_path = PathBuf::from(path);
        }

        Ok(config)
    }

    /// Set the base URL
    pub fn base_url(mut self, base: &str) -> Result<Self> {
        let mut url = Url::parse(base)?;
        // Url::join drops the last segment unless the path ends in '/'
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        self.base_url = Some(url);
        Ok(self)
    }

    /// Set timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Include or omit cookies
    pub fn with_credentials(mut self, enabled: bool) -> Self {
        self.with_credentials = enabled;
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Add a default header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Replace the whitelist
    pub fn whitelist(mut self, whitelist: Whitelist) -> Self {
        self.whitelist = whitelist;
        self
    }

    /// Set the durable store key for the token
    pub fn token_key(mut self, key: impl Into<String>) -> Self {
        self.token_key = key.into();
        self
    }

    /// Set the durable store location
    pub fn storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = path.into();
        self
    }

    /// Resolve a path or absolute URL against the base URL
    pub fn resolve(&self, target: &str) -> Result<Url> {
        match Url::parse(target) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = self.base_url.as_ref().ok_or_else(|| {
                    Error::config(format!("relative path {} needs a base URL", target))
                })?;
                Ok(base.join(target.trim_start_matches('/'))?)
            }
            Err(e) => Err(e.into()),
        }
    }
}
