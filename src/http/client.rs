// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP transport implementation

use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;

use super::request::Request;
use super::response::Response;
use crate::config::ClientConfig;
use crate::error::{Error, Result};

/// Sends a fully prepared request over the wire.
///
/// Non-2xx statuses are returned as responses, not errors; only transport
/// failures (connect, TLS, timeout, body read) produce `Err`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request) -> Result<Response>;
}

/// reqwest-backed transport
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a transport with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(&ClientConfig::default())
    }

    /// Create a transport from the client configuration
    pub fn with_config(config: &ClientConfig) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        for (name, value) in &config.default_headers {
            let name = HeaderName::try_from(name.as_str())
                .map_err(|e| Error::Header(format!("{}: {}", name, e)))?;
            let value = HeaderValue::try_from(value.as_str())
                .map_err(|e| Error::Header(format!("{}: {}", name, e)))?;
            default_headers.insert(name, value);
        }

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .default_headers(default_headers)
            .cookie_store(config.with_credentials)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn send(&self, request: Request) -> Result<Response> {
        let start = Instant::now();

        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers);

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;

        let final_url = response.url().clone();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        let response_time = start.elapsed().as_millis() as u64;

        Ok(Response::new(status, headers, body, final_url, response_time))
    }
}
