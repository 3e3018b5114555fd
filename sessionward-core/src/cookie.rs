//! Outgoing session cookies

use crate::types::{SameSite, SessionOptions};
use chrono::DateTime;
use serde::{Deserialize, Serialize};

/// Longest cookie lifetime user agents honour (400 days)
pub const MAX_COOKIE_LIFETIME: u64 = 400 * 86_400;

/// Latest expiry that still renders as a four-digit year (9999-12-31T23:59:59Z)
pub const MAX_COOKIE_EXPIRY: i64 = 253_402_300_799;

/// Expiry of a cookie issued at `now` for `lifetime` seconds, clamped to [`MAX_COOKIE_EXPIRY`]
fn expiry_after(now: i64, lifetime: u64) -> i64 {
    i64::try_from(lifetime)
        .ok()
        .and_then(|lifetime| now.checked_add(lifetime))
        .map_or(MAX_COOKIE_EXPIRY, |expires| expires.min(MAX_COOKIE_EXPIRY))
}

/// A `Set-Cookie` instruction queued for the response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    /// Expiry as unix seconds; `None` for a browser-session cookie
    pub expires: Option<i64>,
    pub path: String,
    pub domain: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

impl SetCookie {
    /// Cookie carrying a session identifier
    pub fn session(options: &SessionOptions, session_id: &str, now: i64) -> Self {
        let expires =
            (options.cookie_lifetime > 0).then(|| expiry_after(now, options.cookie_lifetime));
        Self::with_options(options, session_id.to_string(), expires)
    }

    /// Cookie telling the client to drop the session cookie, dated an hour back
    pub fn removal(options: &SessionOptions, request_time: i64) -> Self {
        Self::with_options(options, String::new(), Some(request_time - 3600))
    }

    fn with_options(options: &SessionOptions, value: String, expires: Option<i64>) -> Self {
        Self {
            name: options.cookie_name.clone(),
            value,
            expires,
            path: options.path.clone(),
            domain: options.domain.clone(),
            secure: options.secure,
            http_only: options.http_only,
            same_site: options.same_site,
        }
    }

    pub fn is_removal(&self) -> bool {
        self.value.is_empty()
    }

    /// Render as a `Set-Cookie` header value
    pub fn to_header_value(&self) -> String {
        let mut header = format!("{}={}", self.name, self.value);

        if let Some(expires) = self.expires {
            if let Some(at) = DateTime::from_timestamp(expires, 0) {
                header.push_str(&format!(
                    "; Expires={}",
                    at.format("%a, %d %b %Y %H:%M:%S GMT")
                ));
            }
        }
        if !self.path.is_empty() {
            header.push_str(&format!("; Path={}", self.path));
        }
        if let Some(domain) = &self.domain {
            header.push_str(&format!("; Domain={}", domain));
        }
        if self.secure {
            header.push_str("; Secure");
        }
        if self.http_only {
            header.push_str("; HttpOnly");
        }
        if let Some(same_site) = self.same_site {
            header.push_str(&format!("; SameSite={}", same_site));
        }

        header
    }
}
