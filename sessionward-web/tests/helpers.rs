//! Integration test helpers
//!
//! Drives the full router (session middleware included) in-process and keeps
//! cookies between requests the way a browser would.

use axum::{
    body::Body,
    http::{
        header::{COOKIE, HOST, SET_COOKIE},
        Request, StatusCode,
    },
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use sessionward_core::{RequestContext, SessionConfig};
use sessionward_store::MemorySessionHandler;
use sessionward_web::{create_app, AppState, SessionBackend, WebConfig};
use std::collections::BTreeMap;
use tower::ServiceExt;

pub const HOST_NAME: &str = "example.com";

/// Cookie storage of one client
#[derive(Debug, Default)]
pub struct Browser {
    pub cookies: BTreeMap<String, String>,
    pub https: bool,
}

impl Browser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn behind_https_proxy() -> Self {
        Self {
            https: true,
            ..Self::default()
        }
    }

    fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn absorb(&mut self, set_cookies: &[String]) {
        for header in set_cookies {
            let pair = header.split(';').next().unwrap_or_default();
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            if value.is_empty() {
                self.cookies.remove(name);
            } else {
                self.cookies.insert(name.to_string(), value.to_string());
            }
        }
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub set_cookies: Vec<String>,
    pub body: Value,
}

/// Application under test, backed by an in-memory session handler
pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    pub fn spawn() -> Self {
        Self::spawn_with(SessionConfig::default())
    }

    pub fn spawn_with(session_config: SessionConfig) -> Self {
        Self::spawn_configured(WebConfig::default(), session_config)
    }

    /// Application deployed behind a reverse proxy that sets `X-Forwarded-Proto`
    pub fn spawn_behind_proxy() -> Self {
        Self::spawn_configured(
            WebConfig {
                trust_forwarded_proto: true,
                ..WebConfig::default()
            },
            SessionConfig::default(),
        )
    }

    fn spawn_configured(web_config: WebConfig, session_config: SessionConfig) -> Self {
        let state = AppState::with_backend(
            web_config,
            session_config,
            SessionBackend::Memory(MemorySessionHandler::new()),
        );
        let router = create_app(state.clone());
        Self { state, router }
    }

    pub fn cookie_name(&self, https: bool) -> String {
        self.state
            .resolver
            .cookie_name(&RequestContext::new(HOST_NAME, https))
    }

    pub fn sessions(&self) -> &MemorySessionHandler {
        match self.state.handler.inner() {
            SessionBackend::Memory(handler) => handler,
            #[allow(unreachable_patterns)]
            _ => panic!("test app uses the memory backend"),
        }
    }

    pub async fn send(&self, browser: &mut Browser, method: &str, uri: &str) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(HOST, HOST_NAME);
        if !browser.cookies.is_empty() {
            builder = builder.header(COOKIE, browser.cookie_header());
        }
        if browser.https {
            builder = builder.header("x-forwarded-proto", "https");
        }

        let response = self
            .router
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let set_cookies: Vec<String> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|value| value.to_str().unwrap().to_string())
            .collect();
        browser.absorb(&set_cookies);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            set_cookies,
            body,
        }
    }
}
