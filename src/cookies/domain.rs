//! Host canonicalization and the RFC 6265 domain-match predicate.
//!
//! <https://httpwg.org/specs/rfc6265.html#cookie-domain>

use std::fmt;
use std::net::IpAddr;
use url::Url;

/// A request or cookie domain, carrying both the string it was built from
/// and its canonical form. IP literals never domain-match as suffixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    raw: String,
    canonical: String,
    is_ip: bool,
}

impl Domain {
    pub fn of(host: &str) -> Self {
        match parse_ip_literal(host) {
            Some(ip) => Self {
                raw: host.to_string(),
                canonical: ip.to_string(),
                is_ip: true,
            },
            None => Self {
                raw: host.to_string(),
                canonical: canonicalize_host(host),
                is_ip: false,
            },
        }
    }

    pub fn of_url(url: &Url) -> Self {
        Self::of(url.host_str().unwrap_or(""))
    }

    /// Canonical string equality.
    pub fn equals(&self, other: &Domain) -> bool {
        self.canonical == other.canonical
    }

    /// RFC 6265 domain-match: `self` matches `other` when they are equal, or
    /// when `other` is a suffix of `self` preceded by a `.` and `self` is a
    /// host name rather than an IP address.
    pub fn matches(&self, other: &Domain) -> bool {
        if self.equals(other) {
            return true;
        }
        if self.is_ip || other.canonical.is_empty() {
            return false;
        }
        let host = self.canonical.as_bytes();
        let suffix = other.canonical.as_bytes();
        host.len() > suffix.len()
            && host.ends_with(suffix)
            && host[host.len() - suffix.len() - 1] == b'.'
    }

    pub fn is_ip_address(&self) -> bool {
        self.is_ip
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_ip_literal(host: &str) -> Option<IpAddr> {
    if host.is_empty() {
        return None;
    }
    let inner = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    inner.parse().ok()
}

/// IDN hosts are converted to their ASCII (punycode) form by running them
/// through the url parser; anything it will not accept as a host falls back
/// to plain ASCII lowercasing.
fn canonicalize_host(host: &str) -> String {
    if host.is_empty() || host.bytes().any(|b| matches!(b, b'/' | b'?' | b'#' | b'@' | b':' | b'\\')) {
        return host.to_ascii_lowercase();
    }
    match Url::parse(&format!("http://{host}/")) {
        Ok(url) => match url.host_str() {
            Some(canonical) => canonical.to_string(),
            None => host.to_ascii_lowercase(),
        },
        Err(_) => host.to_ascii_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subdomain_matches_parent() {
        let sub = Domain::of("sub.example.com");
        let parent = Domain::of("example.com");
        assert!(sub.matches(&parent));
        assert!(!parent.matches(&sub));
    }

    #[test]
    fn suffix_requires_dot_boundary() {
        assert!(!Domain::of("example.com").matches(&Domain::of("ample.com")));
    }

    #[test]
    fn equality_is_case_insensitive() {
        assert!(Domain::of("Example.COM").equals(&Domain::of("example.com")));
        assert!(Domain::of("Example.COM").matches(&Domain::of("example.com")));
    }

    #[test]
    fn ip_literals_never_suffix_match() {
        let ip = Domain::of("10.0.0.1");
        assert!(ip.is_ip_address());
        assert!(ip.matches(&Domain::of("10.0.0.1")));
        assert!(!ip.matches(&Domain::of("0.0.1")));
    }

    #[test]
    fn bracketed_ipv6_is_an_ip() {
        let ip = Domain::of("[::1]");
        assert!(ip.is_ip_address());
        assert!(ip.equals(&Domain::of("::1")));
    }

    #[test]
    fn idn_host_canonicalizes_to_punycode() {
        let idn = Domain::of("bücher.example");
        assert_eq!(idn.canonical(), "xn--bcher-kva.example");
        assert!(idn.equals(&Domain::of("xn--bcher-kva.example")));
    }

    #[test]
    fn empty_domain_matches_nothing_but_itself() {
        let empty = Domain::of("");
        assert!(empty.equals(&Domain::of("")));
        assert!(!Domain::of("example.com").matches(&empty));
    }
}
