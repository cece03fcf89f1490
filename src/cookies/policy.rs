//! Pluggable cookie acceptance and transmission policy.

use crate::cookies::cookie::Cookie;
use crate::http::method::HttpMethod;
use url::Url;

/// Default `Max-Age`/`Expires` upper limit: 400 days.
///
/// <https://httpwg.org/http-extensions/draft-ietf-httpbis-rfc6265bis.html#name-the-max-age-attribute>
pub const RECOMMENDED_MAX_EXPIRY: i64 = 400 * 24 * 3600;

/// Default set of schemes that can handle cookies.
pub const DEFAULT_COOKIE_SCHEMES: &[&str] = &["http", "https", "ws", "wss"];

/// Default set of schemes considered secure.
pub const DEFAULT_SECURE_SCHEMES: &[&str] = &["https", "wss"];

/// Decisions the storage and retrieval algorithms delegate: limits, security
/// classification, and four veto hooks, any of which silently short-circuits
/// the corresponding step.
pub trait CookiePolicy {
    /// Ceiling applied to cookie expiry, in seconds from now.
    fn max_expiry(&self) -> i64;

    /// Total cookie count limit for the jar.
    fn max_count(&self) -> usize;

    /// Cookie count limit for one domain.
    fn max_count_per_domain(&self) -> usize;

    /// Whether cookies may be set on a public suffix (supercookies).
    fn allows_public_suffixes(&self) -> bool;

    fn is_request_secure(&self, request_uri: &Url) -> bool;

    fn is_request_method_safe(&self, method: HttpMethod, request_uri: &Url) -> bool;

    /// Whether cookies should be sent with this request at all.
    fn should_send_request(&self, method: HttpMethod, request_uri: &Url) -> bool;

    /// Whether this cookie should be included in the `Cookie` header.
    fn should_send_cookie(&self, cookie: &Cookie, method: HttpMethod, request_uri: &Url) -> bool;

    /// Whether the `Set-Cookie` headers of this response should be
    /// processed at all.
    fn should_accept_response(&self, method: HttpMethod, request_uri: &Url, status: u16) -> bool;

    /// Whether this cookie, having passed every other check, should be
    /// stored.
    fn should_accept_cookie(
        &self,
        cookie: &Cookie,
        method: HttpMethod,
        request_uri: &Url,
        status: u16,
    ) -> bool;
}

/// The default policy: unbounded counts, 400-day expiry ceiling, public
/// suffixes disallowed, https/wss considered secure, method safety per
/// RFC 9110 semantics, and no vetoes.
#[derive(Debug, Clone)]
pub struct DefaultPolicy {
    max_expiry: i64,
    max_count: usize,
    max_count_per_domain: usize,
    allow_public_suffixes: bool,
    secure_schemes: Vec<String>,
}

impl Default for DefaultPolicy {
    fn default() -> Self {
        Self {
            max_expiry: RECOMMENDED_MAX_EXPIRY,
            max_count: usize::MAX,
            max_count_per_domain: usize::MAX,
            allow_public_suffixes: false,
            secure_schemes: DEFAULT_SECURE_SCHEMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl DefaultPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_expiry(mut self, seconds: i64) -> Self {
        self.max_expiry = seconds;
        self
    }

    pub fn with_max_count(mut self, count: usize) -> Self {
        self.max_count = count;
        self
    }

    pub fn with_max_count_per_domain(mut self, count: usize) -> Self {
        self.max_count_per_domain = count;
        self
    }

    pub fn with_public_suffixes_allowed(mut self, allow: bool) -> Self {
        self.allow_public_suffixes = allow;
        self
    }

    pub fn with_secure_schemes(mut self, schemes: impl IntoIterator<Item = String>) -> Self {
        self.secure_schemes = schemes.into_iter().collect();
        self
    }
}

impl CookiePolicy for DefaultPolicy {
    fn max_expiry(&self) -> i64 {
        self.max_expiry
    }

    fn max_count(&self) -> usize {
        self.max_count
    }

    fn max_count_per_domain(&self) -> usize {
        self.max_count_per_domain
    }

    fn allows_public_suffixes(&self) -> bool {
        self.allow_public_suffixes
    }

    fn is_request_secure(&self, request_uri: &Url) -> bool {
        self.secure_schemes.iter().any(|s| s == request_uri.scheme())
    }

    fn is_request_method_safe(&self, method: HttpMethod, _request_uri: &Url) -> bool {
        method.is_safe()
    }

    fn should_send_request(&self, _method: HttpMethod, _request_uri: &Url) -> bool {
        true
    }

    fn should_send_cookie(&self, _cookie: &Cookie, _method: HttpMethod, _request_uri: &Url) -> bool {
        true
    }

    fn should_accept_response(&self, _method: HttpMethod, _request_uri: &Url, _status: u16) -> bool {
        true
    }

    fn should_accept_cookie(
        &self,
        _cookie: &Cookie,
        _method: HttpMethod,
        _request_uri: &Url,
        _status: u16,
    ) -> bool {
        true
    }
}
