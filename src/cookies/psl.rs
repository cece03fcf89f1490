//! Public Suffix List lookups for cookie domain security.
//!
//! Prevents supercookie attacks by letting the storage algorithm reject
//! cookies set on public suffixes like `.com` or `.co.uk`, and gives the
//! request chain its registrable-domain ("site") computation.
//!
//! Uses Mozilla's Public Suffix List via the `psl` crate.

use psl::{List, Psl};

/// The public-suffix queries the engine needs, kept behind a trait so
/// embedders can swap in a private-list or test implementation.
pub trait PublicSuffixes {
    fn is_public_suffix(&self, domain: &str) -> bool;

    /// The registrable domain (eTLD+1) for a host, `None` when the host is
    /// itself a public suffix or unknown.
    fn registrable_domain(&self, host: &str) -> Option<String>;
}

/// Default implementation backed by the bundled Public Suffix List.
#[derive(Debug, Default, Clone, Copy)]
pub struct PslSuffixes;

impl PublicSuffixes for PslSuffixes {
    fn is_public_suffix(&self, domain: &str) -> bool {
        is_public_suffix(domain)
    }

    fn registrable_domain(&self, host: &str) -> Option<String> {
        registrable_domain(host)
    }
}

/// Check if a domain is a public suffix (e.g., "com", "co.uk").
pub fn is_public_suffix(domain: &str) -> bool {
    if domain.is_empty() {
        return false;
    }
    let domain_lower = domain.to_lowercase();
    let domain_bytes = domain_lower.as_bytes();

    if let Some(suffix) = List.suffix(domain_bytes) {
        // The domain is a public suffix if it equals its own suffix.
        suffix.as_bytes() == domain_bytes
    } else {
        false
    }
}

/// Get the registrable domain (eTLD+1) for a host.
/// For "sub.example.com", returns "example.com".
/// For "com" (public suffix), returns None.
pub fn registrable_domain(host: &str) -> Option<String> {
    let host_lower = host.to_lowercase();
    psl::domain(host_lower.as_bytes())
        .and_then(|d| std::str::from_utf8(d.as_bytes()).ok())
        .map(|s| s.to_string())
}
