//! In-memory view of the current request and its pending response cookies

use crate::cookie::SetCookie;
use std::collections::BTreeMap;

/// The request being served, as far as sessions are concerned
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    host: String,
    secure: bool,
    cookies: BTreeMap<String, String>,
    headers_sent: bool,
    outgoing: Vec<SetCookie>,
}

impl RequestContext {
    pub fn new(host: impl Into<String>, secure: bool) -> Self {
        Self {
            host: host.into(),
            secure,
            ..Self::default()
        }
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Host name without the port
    pub fn host(&self) -> &str {
        match self.host.rsplit_once(':') {
            Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
            _ => &self.host,
        }
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn has_cookie(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }

    /// Forget a cookie so later logic in this request no longer sees it
    pub fn remove_cookie(&mut self, name: &str) -> Option<String> {
        self.cookies.remove(name)
    }

    pub fn headers_sent(&self) -> bool {
        self.headers_sent
    }

    /// Response headers are flushed; `Set-Cookie` can no longer be emitted
    pub fn mark_headers_sent(&mut self) {
        self.headers_sent = true;
    }

    /// Queue a cookie for the response. Returns false once headers are sent.
    pub fn queue_cookie(&mut self, cookie: SetCookie) -> bool {
        if self.headers_sent {
            return false;
        }
        // A later instruction for the same cookie supersedes the earlier one
        self.outgoing.retain(|queued| queued.name != cookie.name);
        self.outgoing.push(cookie);
        true
    }

    /// Withdraw a queued instruction for `name`
    pub fn discard_cookie(&mut self, name: &str) {
        self.outgoing.retain(|queued| queued.name != name);
    }

    pub fn outgoing_cookies(&self) -> &[SetCookie] {
        &self.outgoing
    }

    pub fn take_outgoing_cookies(&mut self) -> Vec<SetCookie> {
        std::mem::take(&mut self.outgoing)
    }
}
