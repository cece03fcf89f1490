//! The canonical cookie record held by the store.

use std::fmt;
use time::OffsetDateTime;

/// The `SameSite` enforcement level of a cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    /// No attribute was present; treated like `Lax` for retrieval carve-outs.
    #[default]
    Default,
    None,
    Lax,
    Strict,
}

impl SameSite {
    /// The attribute value as written on the wire; empty for `Default`.
    pub fn as_str(self) -> &'static str {
        match self {
            SameSite::Default => "",
            SameSite::None => "none",
            SameSite::Lax => "lax",
            SameSite::Strict => "strict",
        }
    }

    /// Parse a `SameSite` attribute value; anything unrecognized is
    /// `Default`.
    pub fn from_attribute(value: &str) -> Self {
        if value.eq_ignore_ascii_case("lax") {
            SameSite::Lax
        } else if value.eq_ignore_ascii_case("strict") {
            SameSite::Strict
        } else if value.eq_ignore_ascii_case("none") {
            SameSite::None
        } else {
            SameSite::Default
        }
    }
}

/// A cookie record, uniquely keyed by (domain, path, name) within the store.
///
/// `expires_at` is saturating epoch seconds: session cookies carry
/// [`Cookie::EXPIRES_NEVER`], an immediately-expired cookie (`Max-Age=0`)
/// carries `i64::MIN`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub persistent: bool,
    pub expires_at: i64,
    pub host_only: bool,
    pub secure_only: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    pub created_at: OffsetDateTime,
    pub accessed_at: OffsetDateTime,
}

impl Cookie {
    /// Expiry sentinel for session cookies.
    pub const EXPIRES_NEVER: i64 = i64::MAX;

    /// A session cookie with host-only defaults; the storage algorithm or
    /// the caller fill in domain, path and flags.
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: String::new(),
            path: "/".to_string(),
            persistent: false,
            expires_at: Self::EXPIRES_NEVER,
            host_only: true,
            secure_only: false,
            http_only: false,
            same_site: SameSite::Default,
            created_at,
            accessed_at: created_at,
        }
    }

    pub fn is_expired(&self, at: OffsetDateTime) -> bool {
        self.expires_at != Self::EXPIRES_NEVER && self.expires_at < at.unix_timestamp()
    }

    pub fn touch(&mut self, now: OffsetDateTime) {
        self.accessed_at = now;
    }

    /// Identity within the store.
    pub fn key(&self) -> (&str, &str, &str) {
        (&self.domain, &self.path, &self.name)
    }
}

/// `name=value`; a nameless cookie serializes as its bare value, so a
/// cookie that is empty on both sides serializes to nothing and is skipped
/// by the retrieval algorithm.
impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            f.write_str(&self.value)
        } else {
            write!(f, "{}={}", self.name, self.value)
        }
    }
}

/// The accepted shapes for direct insertion into a jar: a full record, or a
/// bare name/value pair that becomes a host-less session cookie.
#[derive(Debug, Clone)]
pub enum CookieInit {
    Record(Cookie),
    Pair(String, String),
}

impl From<Cookie> for CookieInit {
    fn from(cookie: Cookie) -> Self {
        CookieInit::Record(cookie)
    }
}

impl<N: Into<String>, V: Into<String>> From<(N, V)> for CookieInit {
    fn from((name, value): (N, V)) -> Self {
        CookieInit::Pair(name.into(), value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ts: i64) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(ts).unwrap()
    }

    #[test]
    fn session_cookie_never_expires() {
        let cookie = Cookie::new("sid", "1", at(0));
        assert!(!cookie.persistent);
        assert!(!cookie.is_expired(at(i64::MAX - 1)));
    }

    #[test]
    fn persistent_cookie_expiry() {
        let mut cookie = Cookie::new("sid", "1", at(0));
        cookie.persistent = true;
        cookie.expires_at = 100;
        assert!(!cookie.is_expired(at(100)));
        assert!(cookie.is_expired(at(101)));
    }

    #[test]
    fn immediately_expired_sentinel() {
        let mut cookie = Cookie::new("sid", "1", at(0));
        cookie.expires_at = i64::MIN;
        assert!(cookie.is_expired(at(0)));
    }

    #[test]
    fn serialization() {
        let t = at(0);
        assert_eq!(Cookie::new("a", "b", t).to_string(), "a=b");
        assert_eq!(Cookie::new("", "bare", t).to_string(), "bare");
        assert_eq!(Cookie::new("", "", t).to_string(), "");
    }

    #[test]
    fn same_site_attribute_parsing() {
        assert_eq!(SameSite::from_attribute("Lax"), SameSite::Lax);
        assert_eq!(SameSite::from_attribute("STRICT"), SameSite::Strict);
        assert_eq!(SameSite::from_attribute("none"), SameSite::None);
        assert_eq!(SameSite::from_attribute(""), SameSite::Default);
        assert_eq!(SameSite::from_attribute("whatever"), SameSite::Default);
    }
}
