// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Paths that may be called without a token

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const REGISTER_PATH: &str = "/api/auth/register";
pub const REFRESH_PATH: &str = "/api/auth/refresh";
pub const CHECK_PATH: &str = "/api/auth/check";

/// Auth endpoints reachable while logged out
pub const DEFAULT_WHITELIST: [&str; 4] = [LOGIN_PATH, REGISTER_PATH, REFRESH_PATH, CHECK_PATH];

/// Set of path patterns exempt from authentication.
///
/// Matching is substring containment on the full URL, so
/// `https://host/api/auth/login?next=/` matches `/api/auth/login`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Whitelist {
    paths: Vec<String>,
}

impl Default for Whitelist {
    fn default() -> Self {
        Self::new(DEFAULT_WHITELIST)
    }
}

impl Whitelist {
    /// Create a whitelist from patterns; empty patterns are ignored
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut whitelist = Self::empty();
        for path in paths {
            whitelist = whitelist.with(path);
        }
        whitelist
    }

    /// Whitelist that exempts nothing
    pub fn empty() -> Self {
        Self { paths: Vec::new() }
    }

    /// Add a pattern
    pub fn with(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        // an empty pattern would match every URL
        if !path.is_empty() && !self.paths.contains(&path) {
            self.paths.push(path);
        }
        self
    }

    /// Check whether `url` contains any pattern
    pub fn matches(&self, url: &str) -> bool {
        self.paths.iter().any(|p| url.contains(p.as_str()))
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }
}
