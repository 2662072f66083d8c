// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Request/response interceptor pipeline
//!
//! Every request passes through an ordered chain of interceptors before it
//! is sent, and every response or failure passes back through the same
//! chain. Any interceptor can stop a request by returning
//! [`InterceptAction::Abort`].

use std::sync::Arc;

use async_trait::async_trait;

use super::whitelist::Whitelist;
use crate::error::{Error, Result};
use crate::http::{Request, Response};
use crate::prompt::LoginPrompt;
use crate::session::{KeyValueStore, SessionStore};

/// Request interceptor trait
///
/// # Example
///
/// ```rust,no_run
/// use portier::network::{RequestInterceptor, InterceptAction};
/// use portier::http::Request;
/// use async_trait::async_trait;
///
/// struct TenantHeader {
///     tenant: String,
/// }
///
/// #[async_trait]
/// impl RequestInterceptor for TenantHeader {
///     fn name(&self) -> &'static str {
///         "tenant-header"
///     }
///
///     async fn before_request(&self, req: &mut Request) -> portier::Result<InterceptAction> {
///         req.headers.insert("x-tenant", self.tenant.parse().unwrap());
///         Ok(InterceptAction::Continue)
///     }
/// }
/// ```
#[async_trait]
pub trait RequestInterceptor: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Called before a request is sent.
    ///
    /// Can modify the request or abort it. An `Err` means the interceptor
    /// itself failed and is propagated as is.
    async fn before_request(&self, _request: &mut Request) -> Result<InterceptAction> {
        Ok(InterceptAction::Continue)
    }

    /// Called after a successful (2xx) response is received
    async fn after_response(&self, _request: &Request, _response: &mut Response) -> Result<()> {
        Ok(())
    }

    /// Called when the request failed, after the failure was normalized
    async fn on_error(&self, _request: &Request, _error: &Error) {}

    /// Filter - return true if this interceptor should handle the request
    fn should_intercept(&self, _request: &Request) -> bool {
        true
    }

    /// Priority - higher priority interceptors run first
    fn priority(&self) -> i32 {
        0
    }
}

/// Action to take after interception
#[derive(Debug)]
pub enum InterceptAction {
    /// Continue with the (possibly modified) request
    Continue,
    /// Abort the request with an error; nothing is sent
    Abort(Error),
}

/// Logs every request, response and failure
#[derive(Debug, Clone)]
pub struct RequestLogger {
    /// Log request bodies
    pub log_bodies: bool,
    /// Log response bodies
    pub log_responses: bool,
}

impl Default for RequestLogger {
    fn default() -> Self {
        Self {
            log_bodies: false,
            log_responses: true,
        }
    }
}

#[async_trait]
impl RequestInterceptor for RequestLogger {
    fn name(&self) -> &'static str {
        "request-logger"
    }

    async fn before_request(&self, request: &mut Request) -> Result<InterceptAction> {
        tracing::info!(
            method = %request.method,
            url = %request.url,
            "Request"
        );

        if self.log_bodies {
            if let Some(ref body) = request.body {
                tracing::debug!(body = ?String::from_utf8_lossy(body), "Request body");
            }
        }

        Ok(InterceptAction::Continue)
    }

    async fn after_response(&self, request: &Request, response: &mut Response) -> Result<()> {
        tracing::info!(
            url = %request.url,
            status = %response.status,
            time_ms = response.response_time_ms,
            "Response"
        );

        if self.log_responses {
            tracing::debug!(body = %response.text_lossy(), "Response body");
        }

        Ok(())
    }

    async fn on_error(&self, request: &Request, error: &Error) {
        match error {
            Error::AuthExpired { status, message, .. } => {
                tracing::warn!(url = %request.url, status, %message, "Credentials rejected");
            }
            _ => {
                tracing::error!(
                    url = %request.url,
                    status = ?error.status_code(),
                    message = %error.message(),
                    "Request failed"
                );
            }
        }
    }

    fn priority(&self) -> i32 {
        200 // log before anything can abort
    }
}

/// Attaches the bearer token, or blocks requests that need one.
///
/// The token comes from the session first and the durable store second.
/// A token is attached whenever one exists, whitelisted or not. Without a
/// token only whitelisted URLs go through; anything else shows the login
/// prompt and aborts with [`Error::AuthenticationRequired`].
pub struct BearerAuth {
    session: Arc<dyn SessionStore>,
    storage: Arc<dyn KeyValueStore>,
    token_key: String,
    whitelist: Whitelist,
    prompt: Arc<dyn LoginPrompt>,
}

impl BearerAuth {
    pub fn new(
        session: Arc<dyn SessionStore>,
        storage: Arc<dyn KeyValueStore>,
        token_key: impl Into<String>,
        whitelist: Whitelist,
        prompt: Arc<dyn LoginPrompt>,
    ) -> Self {
        Self {
            session,
            storage,
            token_key: token_key.into(),
            whitelist,
            prompt,
        }
    }

    fn current_token(&self) -> Option<String> {
        self.session
            .token()
            .filter(|t| !t.is_empty())
            .or_else(|| self.storage.get(&self.token_key).filter(|t| !t.is_empty()))
    }
}

#[async_trait]
impl RequestInterceptor for BearerAuth {
    fn name(&self) -> &'static str {
        "bearer-auth"
    }

    async fn before_request(&self, request: &mut Request) -> Result<InterceptAction> {
        let whitelisted = self.whitelist.matches(request.url_str());

        if let Some(token) = self.current_token() {
            request.set_bearer(&token)?;
            tracing::debug!(url = %request.url, "Bearer token attached");
            return Ok(InterceptAction::Continue);
        }

        if !whitelisted {
            tracing::warn!(url = %request.url, "Request requires authentication");
            self.prompt.show();
            return Ok(InterceptAction::Abort(Error::authentication_required(
                request.url_str(),
            )));
        }

        Ok(InterceptAction::Continue)
    }

    fn priority(&self) -> i32 {
        100
    }
}

/// Stores any `token` found in a successful response payload
pub struct TokenCapture {
    session: Arc<dyn SessionStore>,
}

impl TokenCapture {
    pub fn new(session: Arc<dyn SessionStore>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl RequestInterceptor for TokenCapture {
    fn name(&self) -> &'static str {
        "token-capture"
    }

    async fn after_response(&self, request: &Request, response: &mut Response) -> Result<()> {
        let Some(token) = response.token() else {
            return Ok(());
        };

        match self.session.set_token(&token) {
            Ok(()) => tracing::info!(url = %request.url, "Token updated from response"),
            Err(e) => tracing::error!(url = %request.url, error = %e, "Failed to update token"),
        }
        Ok(())
    }
}

/// Clears the session and asks for login when the server rejects credentials
pub struct AuthFailureHandler {
    session: Arc<dyn SessionStore>,
    prompt: Arc<dyn LoginPrompt>,
}

impl AuthFailureHandler {
    pub fn new(session: Arc<dyn SessionStore>, prompt: Arc<dyn LoginPrompt>) -> Self {
        Self { session, prompt }
    }
}

#[async_trait]
impl RequestInterceptor for AuthFailureHandler {
    fn name(&self) -> &'static str {
        "auth-failure"
    }

    async fn on_error(&self, request: &Request, error: &Error) {
        let Error::AuthExpired { status, .. } = error else {
            return;
        };

        tracing::info!(url = %request.url, status, "Handling auth failure");
        if let Err(e) = self.session.logout() {
            tracing::error!(error = %e, "Failed to clear session");
        }
        self.prompt.show();
    }
}

/// Interceptor chain - manages multiple interceptors
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn RequestInterceptor>>,
}

impl Default for InterceptorChain {
    fn default() -> Self {
        Self::new()
    }
}

impl InterceptorChain {
    /// Create a new empty chain
    pub fn new() -> Self {
        Self {
            interceptors: Vec::new(),
        }
    }

    /// Add an interceptor
    pub fn add<I: RequestInterceptor + 'static>(&mut self, interceptor: I) {
        self.add_shared(Arc::new(interceptor));
    }

    /// Add an already shared interceptor
    pub fn add_shared(&mut self, interceptor: Arc<dyn RequestInterceptor>) {
        self.interceptors.push(interceptor);
        // stable sort: equal priorities keep insertion order
        self.interceptors.sort_by(|a, b| b.priority().cmp(&a.priority()));
    }

    /// Interceptor names in execution order
    pub fn names(&self) -> Vec<&'static str> {
        self.interceptors.iter().map(|i| i.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Process request through all interceptors
    pub async fn process_request(&self, request: &mut Request) -> Result<InterceptAction> {
        for interceptor in &self.interceptors {
            if !interceptor.should_intercept(request) {
                continue;
            }

            match interceptor.before_request(request).await {
                Ok(InterceptAction::Continue) => continue,
                Ok(action) => return Ok(action),
                Err(e) => {
                    tracing::error!(
                        interceptor = interceptor.name(),
                        url = %request.url,
                        error = %e,
                        "Request transform failed"
                    );
                    return Err(e);
                }
            }
        }
        Ok(InterceptAction::Continue)
    }

    /// Process response through all interceptors
    pub async fn process_response(&self, request: &Request, response: &mut Response) -> Result<()> {
        for interceptor in &self.interceptors {
            if !interceptor.should_intercept(request) {
                continue;
            }
            interceptor.after_response(request, response).await?;
        }
        Ok(())
    }

    /// Notify interceptors of an error
    pub async fn notify_error(&self, request: &Request, error: &Error) {
        for interceptor in &self.interceptors {
            if interceptor.should_intercept(request) {
                interceptor.on_error(request, error).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::LoginModal;
    use crate::session::{MemoryStorage, Session};
    use bytes::Bytes;
    use reqwest::header::HeaderMap;
    use reqwest::StatusCode;

    struct Fixture {
        storage: Arc<MemoryStorage>,
        session: Arc<Session>,
        modal: Arc<LoginModal>,
    }

    impl Fixture {
        fn new() -> Self {
            let storage = Arc::new(MemoryStorage::new());
            let session = Arc::new(Session::new(storage.clone()));
            Self {
                storage,
                session,
                modal: Arc::new(LoginModal::new()),
            }
        }

        fn bearer(&self) -> BearerAuth {
            BearerAuth::new(
                self.session.clone(),
                self.storage.clone(),
                "token",
                Whitelist::default(),
                self.modal.clone(),
            )
        }
    }

    /// Session whose backing store rejects every write
    struct BrokenSession;

    impl SessionStore for BrokenSession {
        fn token(&self) -> Option<String> {
            Some("abc".to_string())
        }
        fn set_token(&self, _token: &str) -> Result<()> {
            Err(Error::storage("read-only"))
        }
        fn logout(&self) -> Result<()> {
            Err(Error::storage("read-only"))
        }
    }

    fn response(status: StatusCode, body: &'static str) -> Response {
        Response::new(
            status,
            HeaderMap::new(),
            Bytes::from(body),
            url::Url::parse("https://api.test/api/data").unwrap(),
            5,
        )
    }

    #[tokio::test]
    async fn test_bearer_attached_when_token_present() {
        let fx = Fixture::new();
        fx.session.set_token("abc").unwrap();

        let mut req = Request::get("https://api.test/api/data").unwrap();
        let action = fx.bearer().before_request(&mut req).await.unwrap();

        assert!(matches!(action, InterceptAction::Continue));
        assert_eq!(req.authorization(), Some("Bearer abc"));
    }

    #[tokio::test]
    async fn test_bearer_attached_on_whitelisted_path() {
        let fx = Fixture::new();
        fx.session.set_token("abc").unwrap();

        let mut req = Request::post("https://api.test/api/auth/refresh").unwrap();
        fx.bearer().before_request(&mut req).await.unwrap();

        assert_eq!(req.authorization(), Some("Bearer abc"));
    }

    #[tokio::test]
    async fn test_falls_back_to_durable_store() {
        let fx = Fixture::new();
        // written behind the session's back, e.g. by another component
        fx.storage.set("token", "from-disk").unwrap();

        let mut req = Request::get("https://api.test/api/data").unwrap();
        fx.bearer().before_request(&mut req).await.unwrap();

        assert_eq!(req.authorization(), Some("Bearer from-disk"));
    }

    #[tokio::test]
    async fn test_empty_session_token_falls_back_to_store() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set("token", "").unwrap();
        let session = Arc::new(Session::new(storage.clone()));
        let modal = Arc::new(LoginModal::new());
        storage.set("token", "x").unwrap();

        let bearer = BearerAuth::new(
            session,
            storage,
            "token",
            Whitelist::default(),
            modal.clone(),
        );
        let mut req = Request::get("https://api.test/api/data").unwrap();
        let action = bearer.before_request(&mut req).await.unwrap();

        assert!(matches!(action, InterceptAction::Continue));
        assert_eq!(req.authorization(), Some("Bearer x"));
        assert!(!modal.is_visible());
    }

    #[tokio::test]
    async fn test_whitelisted_without_token_passes() {
        let fx = Fixture::new();

        let mut req = Request::post("https://api.test/api/auth/login").unwrap();
        let action = fx.bearer().before_request(&mut req).await.unwrap();

        assert!(matches!(action, InterceptAction::Continue));
        assert!(req.authorization().is_none());
        assert!(!fx.modal.is_visible());
    }

    #[tokio::test]
    async fn test_missing_token_aborts_and_prompts() {
        let fx = Fixture::new();

        let mut req = Request::get("https://api.test/api/data").unwrap();
        let action = fx.bearer().before_request(&mut req).await.unwrap();

        match action {
            InterceptAction::Abort(err) => assert!(err.is_authentication_required()),
            other => panic!("expected abort, got {:?}", other),
        }
        assert!(fx.modal.is_visible());
    }

    #[tokio::test]
    async fn test_unencodable_token_propagates() {
        let fx = Fixture::new();
        fx.session.set_token("bad\ntoken").unwrap();

        let mut chain = InterceptorChain::new();
        chain.add(fx.bearer());

        let mut req = Request::get("https://api.test/api/data").unwrap();
        let err = chain.process_request(&mut req).await.unwrap_err();
        assert!(matches!(err, Error::Header(_)));
    }

    #[tokio::test]
    async fn test_token_capture() {
        let fx = Fixture::new();
        let capture = TokenCapture::new(fx.session.clone());
        let req = Request::get("https://api.test/api/data").unwrap();

        let mut resp = response(StatusCode::OK, r#"{"token":"T"}"#);
        capture.after_response(&req, &mut resp).await.unwrap();
        assert_eq!(fx.session.token().as_deref(), Some("T"));
        assert_eq!(fx.storage.get("token").as_deref(), Some("T"));

        let mut resp = response(StatusCode::OK, r#"{"items":[]}"#);
        capture.after_response(&req, &mut resp).await.unwrap();
        assert_eq!(fx.session.token().as_deref(), Some("T"));
    }

    #[tokio::test]
    async fn test_token_capture_swallows_storage_failure() {
        let capture = TokenCapture::new(Arc::new(BrokenSession));
        let req = Request::get("https://api.test/api/data").unwrap();
        let mut resp = response(StatusCode::OK, r#"{"token":"T"}"#);

        assert!(capture.after_response(&req, &mut resp).await.is_ok());
    }

    #[tokio::test]
    async fn test_auth_failure_clears_session() {
        let fx = Fixture::new();
        fx.session.set_token("abc").unwrap();
        let handler = AuthFailureHandler::new(fx.session.clone(), fx.modal.clone());
        let req = Request::get("https://api.test/api/data").unwrap();

        handler
            .on_error(&req, &Error::from_status(Some(500), "boom", req.url_str()))
            .await;
        assert!(fx.session.is_authenticated());
        assert!(!fx.modal.is_visible());

        handler
            .on_error(&req, &Error::from_status(Some(401), "expired", req.url_str()))
            .await;
        assert!(!fx.session.is_authenticated());
        assert!(fx.storage.get("token").is_none());
        assert!(fx.modal.is_visible());
    }

    #[tokio::test]
    async fn test_auth_failure_prompts_when_logout_fails() {
        let modal = Arc::new(LoginModal::new());
        let handler = AuthFailureHandler::new(Arc::new(BrokenSession), modal.clone());
        let req = Request::get("https://api.test/api/data").unwrap();

        handler
            .on_error(&req, &Error::from_status(Some(401), "expired", req.url_str()))
            .await;

        assert!(modal.is_visible());
        assert_eq!(modal.times_shown(), 1);
    }

    #[test]
    fn test_interceptor_chain_order() {
        let fx = Fixture::new();
        let mut chain = InterceptorChain::new();
        chain.add(TokenCapture::new(fx.session.clone()));
        chain.add(fx.bearer());
        chain.add(AuthFailureHandler::new(fx.session.clone(), fx.modal.clone()));
        chain.add(RequestLogger::default());

        assert_eq!(
            chain.names(),
            vec!["request-logger", "bearer-auth", "token-capture", "auth-failure"]
        );
    }
}
