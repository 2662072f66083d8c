// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Authenticated request client
//!
//! [`RequestClient`] runs every request through the interceptor chain:
//! the bearer token is attached (or the request blocked) on the way out,
//! fresh tokens are captured on the way back, and failures are normalized
//! into [`Error::Request`] / [`Error::AuthExpired`] carrying the server's
//! message.

use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{Error, Result, DEFAULT_FAILURE_MESSAGE};
use crate::http::{HttpClient, Request, Response, Transport};
use crate::network::{
    AuthFailureHandler, BearerAuth, InterceptAction, InterceptorChain, RequestInterceptor,
    RequestLogger, TokenCapture, CHECK_PATH, LOGIN_PATH,
};
use crate::prompt::{LoginModal, LoginPrompt};
use crate::session::{KeyValueStore, MemoryStorage, Session, SessionStore};

/// HTTP client with bearer auth, login gating and error normalization
#[derive(Clone)]
pub struct RequestClient {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
    chain: Arc<InterceptorChain>,
    session: Arc<dyn SessionStore>,
}

impl RequestClient {
    /// Start building a client
    pub fn builder() -> RequestClientBuilder {
        RequestClientBuilder::new()
    }

    /// Client with default configuration, in-memory session and a login modal
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Get client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The session this client reads and updates
    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    /// Create a request for a path or absolute URL
    pub fn request(&self, method: Method, target: &str) -> Result<Request> {
        Ok(Request::from_url(method, self.config.resolve(target)?))
    }

    /// Execute a request and return the response payload
    pub async fn execute(&self, request: Request) -> Result<Value> {
        let response = self.dispatch(request).await?;
        Ok(response.payload())
    }

    /// Execute a request and deserialize the payload
    pub async fn execute_json<T: DeserializeOwned>(&self, request: Request) -> Result<T> {
        let payload = self.execute(request).await?;
        Ok(serde_json::from_value(payload)?)
    }

    /// Execute multiple requests concurrently.
    ///
    /// Results are returned in input order; completion order is unspecified.
    pub async fn execute_all(&self, requests: Vec<Request>) -> Vec<Result<Value>> {
        let futures: Vec<_> = requests.into_iter().map(|r| self.execute(r)).collect();
        futures::future::join_all(futures).await
    }

    /// GET a path
    pub async fn get(&self, target: &str) -> Result<Value> {
        self.execute(self.request(Method::GET, target)?).await
    }

    /// GET a path and deserialize the payload
    pub async fn get_json<T: DeserializeOwned>(&self, target: &str) -> Result<T> {
        self.execute_json(self.request(Method::GET, target)?).await
    }

    /// DELETE a path
    pub async fn delete(&self, target: &str) -> Result<Value> {
        self.execute(self.request(Method::DELETE, target)?).await
    }

    /// POST a JSON body
    pub async fn post<B: Serialize + ?Sized>(&self, target: &str, body: &B) -> Result<Value> {
        self.send_json(Method::POST, target, body).await
    }

    /// POST a JSON body and deserialize the payload
    pub async fn post_json<B, T>(&self, target: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::POST, target)?.json(body)?;
        self.execute_json(request).await
    }

    /// PUT a JSON body
    pub async fn put<B: Serialize + ?Sized>(&self, target: &str, body: &B) -> Result<Value> {
        self.send_json(Method::PUT, target, body).await
    }

    /// PATCH a JSON body
    pub async fn patch<B: Serialize + ?Sized>(&self, target: &str, body: &B) -> Result<Value> {
        self.send_json(Method::PATCH, target, body).await
    }

    /// Log in with the given credentials.
    ///
    /// The login endpoint is whitelisted; a `token` in its payload is picked
    /// up by the token capture interceptor like any other response.
    pub async fn login<B: Serialize + ?Sized>(&self, credentials: &B) -> Result<Value> {
        let payload = self.post(LOGIN_PATH, credentials).await?;
        if !self.session.is_authenticated() {
            tracing::warn!("Login response carried no token");
        }
        Ok(payload)
    }

    /// Ask the server whether the current credentials are still valid
    pub async fn check(&self) -> Result<Value> {
        self.get(CHECK_PATH).await
    }

    /// Clear the local session
    pub fn logout(&self) -> Result<()> {
        self.session.logout()
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        target: &str,
        body: &B,
    ) -> Result<Value> {
        let request = self.request(method, target)?.json(body)?;
        self.execute(request).await
    }

    async fn dispatch(&self, mut request: Request) -> Result<Response> {
        if let InterceptAction::Abort(err) = self.chain.process_request(&mut request).await? {
            return Err(err);
        }

        // the transport consumes the request; hooks still need it afterwards
        let sent = request.clone();

        match self.transport.send(request).await {
            Ok(mut response) if response.is_success() => {
                self.chain.process_response(&sent, &mut response).await?;
                Ok(response)
            }
            Ok(response) => {
                tracing::error!(
                    status = response.status_code(),
                    url = %response.url,
                    body = %response.text_lossy(),
                    "Error response"
                );
                let err = Error::from_status(
                    Some(response.status_code()),
                    response.failure_message(),
                    response.url_str(),
                );
                Err(self.fail(&sent, err).await)
            }
            Err(raw) => {
                tracing::error!(
                    url = %sent.url,
                    error = %raw,
                    timeout = raw.is_timeout(),
                    "Transport failure"
                );
                let err = Error::from_status(raw.status_code(), DEFAULT_FAILURE_MESSAGE, sent.url_str());
                Err(self.fail(&sent, err).await)
            }
        }
    }

    async fn fail(&self, request: &Request, error: Error) -> Error {
        self.chain.notify_error(request, &error).await;
        error
    }
}

/// Builder for [`RequestClient`].
///
/// Anything not supplied gets a default: in-memory storage, a [`Session`]
/// over that storage, a [`LoginModal`] and a reqwest transport.
pub struct RequestClientBuilder {
    config: ClientConfig,
    session: Option<Arc<dyn SessionStore>>,
    storage: Option<Arc<dyn KeyValueStore>>,
    prompt: Option<Arc<dyn LoginPrompt>>,
    transport: Option<Arc<dyn Transport>>,
    logger: RequestLogger,
    interceptors: Vec<Arc<dyn RequestInterceptor>>,
}

impl Default for RequestClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestClientBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            session: None,
            storage: None,
            prompt: None,
            transport: None,
            logger: RequestLogger::default(),
            interceptors: Vec::new(),
        }
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn session(mut self, session: Arc<dyn SessionStore>) -> Self {
        self.session = Some(session);
        self
    }

    /// Durable store used as the fallback token source
    pub fn storage(mut self, storage: Arc<dyn KeyValueStore>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn prompt(mut self, prompt: Arc<dyn LoginPrompt>) -> Self {
        self.prompt = Some(prompt);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn logger(mut self, logger: RequestLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Register an additional interceptor
    pub fn interceptor<I: RequestInterceptor + 'static>(mut self, interceptor: I) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn build(self) -> Result<RequestClient> {
        let config = self.config;

        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(MemoryStorage::new()));
        let session = self.session.unwrap_or_else(|| {
            Arc::new(Session::with_key(Arc::clone(&storage), config.token_key.clone()))
        });
        let prompt = self.prompt.unwrap_or_else(|| Arc::new(LoginModal::new()));
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpClient::with_config(&config)?),
        };

        let mut chain = InterceptorChain::new();
        chain.add(self.logger);
        chain.add(BearerAuth::new(
            Arc::clone(&session),
            storage,
            config.token_key.clone(),
            config.whitelist.clone(),
            Arc::clone(&prompt),
        ));
        chain.add(TokenCapture::new(Arc::clone(&session)));
        chain.add(AuthFailureHandler::new(Arc::clone(&session), prompt));
        for interceptor in self.interceptors {
            chain.add_shared(interceptor);
        }

        tracing::debug!(interceptors = ?chain.names(), "Request client ready");

        Ok(RequestClient {
            config: Arc::new(config),
            transport,
            chain: Arc::new(chain),
            session,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use parking_lot::Mutex;
    use reqwest::header::HeaderMap;
    use reqwest::StatusCode;
    use serde::Deserialize;

    /// Answers every request with a fixed reply and records what was sent
    struct FakeTransport {
        reply: Option<(u16, &'static str)>,
        sent: Mutex<Vec<Request>>,
    }

    impl FakeTransport {
        fn replying(status: u16, body: &'static str) -> Arc<Self> {
            Arc::new(Self {
                reply: Some((status, body)),
                sent: Mutex::new(Vec::new()),
            })
        }

        fn unreachable() -> Arc<Self> {
            Arc::new(Self {
                reply: None,
                sent: Mutex::new(Vec::new()),
            })
        }

        fn sent(&self) -> Vec<Request> {
            self.sent.lock().clone()
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn send(&self, request: Request) -> Result<Response> {
            let url = request.url.clone();
            self.sent.lock().push(request);
            let (status, body) = self.reply.ok_or_else(|| Error::other("connection refused"))?;
            Ok(Response::new(
                StatusCode::from_u16(status).unwrap(),
                HeaderMap::new(),
                Bytes::from(body),
                url,
                1,
            ))
        }
    }

    struct Harness {
        client: RequestClient,
        transport: Arc<FakeTransport>,
        storage: Arc<MemoryStorage>,
        modal: Arc<LoginModal>,
    }

    fn harness(transport: Arc<FakeTransport>, token: Option<&str>) -> Harness {
        let storage = Arc::new(MemoryStorage::new());
        if let Some(token) = token {
            storage.set("token", token).unwrap();
        }
        let modal = Arc::new(LoginModal::new());
        let client = RequestClient::builder()
            .config(ClientConfig::new().base_url("https://api.test").unwrap())
            .storage(storage.clone())
            .prompt(modal.clone())
            .transport(transport.clone())
            .build()
            .unwrap();

        Harness {
            client,
            transport,
            storage,
            modal,
        }
    }

    #[tokio::test]
    async fn test_token_attached_to_protected_request() {
        let h = harness(FakeTransport::replying(200, r#"{"items":[1]}"#), Some("abc"));

        let payload = h.client.get("/api/data").await.unwrap();

        assert_eq!(payload, serde_json::json!({"items": [1]}));
        let sent = h.transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].authorization(), Some("Bearer abc"));
        assert_eq!(sent[0].url_str(), "https://api.test/api/data");
    }

    #[tokio::test]
    async fn test_whitelisted_request_without_token() {
        let h = harness(FakeTransport::replying(200, r#"{"ok":true}"#), None);

        h.client
            .post("/api/auth/register", &serde_json::json!({"name": "a"}))
            .await
            .unwrap();

        let sent = h.transport.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].authorization().is_none());
        assert!(!h.modal.is_visible());
    }

    #[tokio::test]
    async fn test_protected_request_without_token_never_sent() {
        let h = harness(FakeTransport::replying(200, "{}"), None);

        let err = h.client.get("/api/data").await.unwrap_err();

        assert!(err.is_authentication_required());
        assert_eq!(err.to_string(), "请先登录");
        assert!(h.modal.is_visible());
        assert!(h.transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_forbidden_clears_session() {
        let h = harness(FakeTransport::replying(403, r#"{"message":"expired"}"#), Some("abc"));

        let err = h.client.get("/api/data").await.unwrap_err();

        assert!(err.is_auth_expired());
        assert_eq!(err.to_string(), "expired");
        assert!(!h.client.session().is_authenticated());
        assert!(h.storage.get("token").is_none());
        assert!(h.modal.is_visible());
    }

    #[tokio::test]
    async fn test_unauthorized_without_message_uses_default() {
        let h = harness(FakeTransport::replying(401, ""), Some("abc"));

        let err = h.client.get("/api/data").await.unwrap_err();

        assert_eq!(err.status_code(), Some(401));
        assert_eq!(err.to_string(), "请求失败，请重试");
        assert!(h.modal.is_visible());
    }

    #[tokio::test]
    async fn test_server_error_keeps_session() {
        let h = harness(FakeTransport::replying(500, r#"{"message":"boom"}"#), Some("abc"));

        let err = h.client.get("/api/data").await.unwrap_err();

        assert!(matches!(err, Error::Request { status: Some(500), .. }));
        assert_eq!(err.to_string(), "boom");
        assert!(h.client.session().is_authenticated());
        assert!(!h.modal.is_visible());
    }

    #[tokio::test]
    async fn test_transport_failure_normalized() {
        let h = harness(FakeTransport::unreachable(), Some("abc"));

        let err = h.client.get("/api/data").await.unwrap_err();

        assert!(matches!(err, Error::Request { status: None, .. }));
        assert_eq!(err.to_string(), "请求失败，请重试");
        assert_eq!(h.transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_login_stores_token() {
        let h = harness(FakeTransport::replying(200, r#"{"token":"T","user":{"id":1}}"#), None);

        let payload = h
            .client
            .login(&serde_json::json!({"username": "u", "password": "p"}))
            .await
            .unwrap();

        assert_eq!(payload["user"]["id"], 1);
        assert_eq!(h.client.session().token().as_deref(), Some("T"));
        assert_eq!(h.storage.get("token").as_deref(), Some("T"));
    }

    #[tokio::test]
    async fn test_get_json() {
        #[derive(Deserialize)]
        struct Item {
            id: u32,
        }

        let h = harness(FakeTransport::replying(200, r#"[{"id":1},{"id":2}]"#), Some("abc"));
        let items: Vec<Item> = h.client.get_json("/api/items").await.unwrap();

        assert_eq!(items.iter().map(|i| i.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_execute_all_independent() {
        let h = harness(FakeTransport::replying(200, "{}"), None);
        let requests = vec![
            h.client.request(Method::GET, "/api/auth/check").unwrap(),
            h.client.request(Method::GET, "/api/data").unwrap(),
        ];

        let results = h.client.execute_all(requests).await;

        assert!(results[0].is_ok());
        assert!(results[1].as_ref().unwrap_err().is_authentication_required());
        assert_eq!(h.transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_relative_path_needs_base_url() {
        let transport = FakeTransport::replying(200, "{}");
        let client = RequestClient::builder()
            .transport(transport.clone())
            .build()
            .unwrap();

        let err = client.get("/api/data").await.unwrap_err();

        assert!(matches!(err, Error::Config(_)));
        assert!(transport.sent().is_empty());
    }
}
