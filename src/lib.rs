// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! # Portier - Authenticated HTTP client
//!
//! A thin layer over reqwest for talking to a JSON API that uses bearer
//! tokens. Every request goes through an interceptor chain.
//!
//! ## Features
//!
//! - Bearer auth: token attached to every request when one is stored
//! - Login gating: protected requests without a token are blocked locally
//!   and a login prompt is raised
//! - Token capture: any `token` in a response payload refreshes the session
//! - Auth failures: 401/403 clear the session and raise the login prompt
//! - Error normalization: failures carry the server's `message`
//! - Durable session: token mirrored to a file-backed store
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use portier::{ClientConfig, FileStorage, LoginModal, RequestClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let modal = Arc::new(LoginModal::new());
//!     let client = RequestClient::builder()
//!         .config(ClientConfig::new().base_url("https://api.example.com")?)
//!         .storage(Arc::new(FileStorage::open("storage.json")?))
//!         .prompt(modal.clone())
//!         .build()?;
//!
//!     client
//!         .login(&serde_json::json!({"username": "demo", "password": "demo"}))
//!         .await?;
//!
//!     let data = client.get("/api/data").await?;
//!     println!("{}", data);
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod network;
pub mod prompt;
pub mod session;

// Re-exports for convenience

// Client
pub use client::{RequestClient, RequestClientBuilder};
pub use config::ClientConfig;

// Errors
pub use error::{Error, ErrorContext, Result};

// HTTP
pub use http::{HttpClient, Request, Response, Transport};

// Network
pub use network::{
    AuthFailureHandler, BearerAuth, InterceptAction, InterceptorChain, RequestInterceptor,
    RequestLogger, TokenCapture, Whitelist,
};

// Session
pub use prompt::{ConsolePrompt, LoginModal, LoginPrompt};
pub use session::{FileStorage, KeyValueStore, MemoryStorage, Session, SessionStore};

/// Portier version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
