// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Error types for Portier
//!
//! Request failures carry the message extracted from the server payload so
//! callers can show it directly. Auth failures are kept apart from generic
//! failures because they change session state.

use thiserror::Error;

/// Result type alias for Portier operations
pub type Result<T> = std::result::Result<T, Error>;

/// Message used when a request needs a token and none is stored
pub const LOGIN_REQUIRED_MESSAGE: &str = "请先登录";

/// Message used when the server gives no usable `message` field
pub const DEFAULT_FAILURE_MESSAGE: &str = "请求失败，请重试";

/// Main error type for Portier
#[derive(Error, Debug)]
pub enum Error {
    /// No token available and the target is not whitelisted.
    /// The request was never sent.
    #[error("{}", LOGIN_REQUIRED_MESSAGE)]
    AuthenticationRequired { url: String },

    /// Server answered 401 or 403; the session has been cleared
    #[error("{message}")]
    AuthExpired {
        status: u16,
        message: String,
        url: String,
    },

    /// Any other HTTP error response or transport failure
    #[error("{message}")]
    Request {
        status: Option<u16>,
        message: String,
        url: String,
    },

    /// Raw HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Header name or value could not be encoded
    #[error("Invalid header: {0}")]
    Header(String),

    /// Durable storage failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an authentication-required error
    pub fn authentication_required(url: impl Into<String>) -> Self {
        Error::AuthenticationRequired { url: url.into() }
    }

    /// Create a request failure from a status and extracted message.
    ///
    /// 401 and 403 map to [`Error::AuthExpired`], everything else to
    /// [`Error::Request`].
    pub fn from_status(status: Option<u16>, message: impl Into<String>, url: impl Into<String>) -> Self {
        match status {
            Some(s @ (401 | 403)) => Error::AuthExpired {
                status: s,
                message: message.into(),
                url: url.into(),
            },
            status => Error::Request {
                status,
                message: message.into(),
                url: url.into(),
            },
        }
    }

    /// Create a storage error
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Error::Storage(msg.into())
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Check if the request was blocked for lack of a token
    pub fn is_authentication_required(&self) -> bool {
        matches!(self, Error::AuthenticationRequired { .. })
    }

    /// Check if the server rejected our credentials
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Error::AuthExpired { .. })
    }

    /// Check if this is a transport timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Http(e) if e.is_timeout())
    }

    /// Check if this is a network error
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Http(_) | Error::Request { status: None, .. })
    }

    /// Get HTTP status code if available
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::AuthExpired { status, .. } => Some(*status),
            Error::Request { status, .. } => *status,
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Get URL if available
    pub fn url(&self) -> Option<&str> {
        match self {
            Error::AuthenticationRequired { url } => Some(url),
            Error::AuthExpired { url, .. } => Some(url),
            Error::Request { url, .. } => Some(url),
            Error::Http(e) => e.url().map(|u| u.as_str()),
            _ => None,
        }
    }

    /// Message shown to the user for this failure
    pub fn message(&self) -> String {
        match self {
            Error::AuthExpired { message, .. } | Error::Request { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

/// Helper trait for adding context to errors
pub trait ErrorContext<T> {
    /// Turn any failure into a storage error with context
    fn storage_context(self, msg: &str) -> Result<T>;
}

impl<T, E: Into<Error>> ErrorContext<T> for std::result::Result<T, E> {
    fn storage_context(self, msg: &str) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            Error::Storage(format!("{}: {}", msg, err))
        })
    }
}
