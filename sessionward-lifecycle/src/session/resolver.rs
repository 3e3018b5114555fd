//! Session cookie options derived from configuration and the request

use sessionward_core::{
    RequestContext, SessionConfig, SessionOptions, SessionOptionsResolver,
};
use sha2::{Digest, Sha256};

/// Resolves cookie options the same way for every request of a site
///
/// Without a configured name the cookie is called `SESS<hash>` (`SSESS<hash>`
/// over HTTPS), the hash being taken over the cookie domain, so that sites
/// sharing a parent domain do not clobber each other's sessions and secure
/// and insecure sessions never mix.
#[derive(Debug, Clone, Default)]
pub struct CookieOptionsResolver {
    config: SessionConfig,
}

impl CookieOptionsResolver {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn unprefixed_name(&self, request: &RequestContext) -> String {
        match &self.config.cookie_domain {
            Some(domain) => domain.trim_start_matches('.').to_string(),
            None => request
                .host()
                .strip_prefix("www.")
                .unwrap_or(request.host())
                .to_string(),
        }
    }

    pub fn cookie_name(&self, request: &RequestContext) -> String {
        if let Some(name) = &self.config.cookie_name {
            return name.clone();
        }

        let prefix = if request.is_secure() { "SSESS" } else { "SESS" };
        let digest = Sha256::digest(self.unprefixed_name(request).as_bytes());
        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        format!("{}{}", prefix, &hex[..32])
    }
}

impl SessionOptionsResolver for CookieOptionsResolver {
    fn options(&self, request: &RequestContext) -> SessionOptions {
        SessionOptions {
            cookie_name: self.cookie_name(request),
            cookie_lifetime: self.config.cookie_lifetime,
            path: self.config.cookie_path.clone(),
            domain: self.config.cookie_domain.clone(),
            secure: request.is_secure(),
            http_only: self.config.cookie_http_only,
            same_site: self.config.cookie_same_site,
            gc_max_lifetime: self.config.gc_max_lifetime,
        }
    }

    fn has_session(&self, request: &RequestContext) -> bool {
        request
            .cookie(&self.cookie_name(request))
            .is_some_and(|value| !value.is_empty())
    }
}
