//! Session middleware and extractor

use crate::{AppState, WebConfig};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{
        header::{HOST, SET_COOKIE},
        request::Parts,
        HeaderMap, HeaderValue, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use sessionward_core::RequestContext;
use sessionward_lifecycle::SessionLifecycleManager;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error, warn};

/// Shared handle on the current request's session
#[derive(Clone)]
pub struct Session(Arc<Mutex<SessionLifecycleManager>>);

impl Session {
    pub fn new(manager: SessionLifecycleManager) -> Self {
        Self(Arc::new(Mutex::new(manager)))
    }

    pub async fn lock(&self) -> MutexGuard<'_, SessionLifecycleManager> {
        self.0.lock().await
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Session>().cloned().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Session middleware is not installed",
        ))
    }
}

/// Build the session view of a request from its headers
pub fn request_context(headers: &HeaderMap, config: &WebConfig) -> RequestContext {
    let host = headers
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(&config.host);

    let forwarded_https = config.trust_forwarded_proto
        && headers
            .get("x-forwarded-proto")
            .and_then(|value| value.to_str().ok())
            .is_some_and(|proto| proto.eq_ignore_ascii_case("https"));

    CookieJar::from_headers(headers).iter().fold(
        RequestContext::new(host, config.secure || forwarded_https),
        |context, cookie| context.with_cookie(cookie.name(), cookie.value()),
    )
}

/// Start the session before the handler runs and save it afterwards
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let mut manager = state.session_manager(request_context(request.headers(), &state.config));
    let started = manager.start().await;
    debug!(started, "Session ready for {}", request.uri().path());

    let session = Session::new(manager);
    request.extensions_mut().insert(session.clone());

    let mut response = next.run(request).await;

    let mut manager = session.lock().await;
    if let Err(e) = manager.save().await {
        e.log();
        error!("Failed to save session: {}", e);
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    for cookie in manager.take_outgoing_cookies() {
        match HeaderValue::from_str(&cookie.to_header_value()) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => warn!("Dropping unencodable session cookie {}: {}", cookie.name, e),
        }
    }

    response
}
