//! Same-origin / same-site tracking across a redirect sequence.
//!
//! An HTTP-client collaborator starts a chain on the initial request,
//! advances it on every redirect, and reads the derived same-origin and
//! same-site flags to feed the storage and retrieval algorithms.

use crate::base::error::CookieError;
use crate::cookies::psl::{PslSuffixes, PublicSuffixes};
use crate::http::origin::{Origin, Site};
use url::Url;

/// How same-site status is recomputed as the chain grows.
///
/// RFC6265bis leaves redirect chains underspecified: one reading compares
/// the newest hop against every site visited so far, the other only against
/// the site the chain started on. Both are kept as an explicit choice.
///
/// <https://httpwg.org/http-extensions/draft-ietf-httpbis-rfc6265bis.html#name-lax-allowing-unsafe-enforce>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSiteMode {
    /// The newest site must be same-site with every prior site; one
    /// cross-site hop poisons the rest of the chain.
    #[default]
    Strict,
    /// Only the first site is compared, so a chain that bounces through a
    /// foreign site and returns is same-site again.
    Lenient,
}

/// State machine: Empty ⇄ Active. `start` captures the first origin and
/// site; `next` appends a hop and recomputes the flags; `finish` resets.
pub struct RequestChain {
    suffixes: Box<dyn PublicSuffixes>,
    mode: SameSiteMode,
    origin: Option<Origin>,
    sites: Vec<Site>,
    same_origin: bool,
    same_site: bool,
}

impl Default for RequestChain {
    fn default() -> Self {
        Self::new(SameSiteMode::default())
    }
}

impl RequestChain {
    pub fn new(mode: SameSiteMode) -> Self {
        Self::with_suffixes(mode, Box::new(PslSuffixes))
    }

    pub fn with_suffixes(mode: SameSiteMode, suffixes: Box<dyn PublicSuffixes>) -> Self {
        Self {
            suffixes,
            mode,
            origin: None,
            sites: Vec::new(),
            same_origin: true,
            same_site: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Begin a chain at the initial request URI.
    pub fn start(&mut self, request_uri: &Url) -> Result<(), CookieError> {
        self.origin = Some(Origin::of(request_uri)?);
        self.sites = vec![Site::of(request_uri, self.suffixes.as_ref())?];
        self.same_origin = true;
        self.same_site = true;
        Ok(())
    }

    /// Record a redirect hop. Errors when the chain was never started.
    pub fn next(&mut self, location: &Url) -> Result<(), CookieError> {
        if self.is_empty() {
            return Err(CookieError::EmptyChain);
        }
        let origin = Origin::of(location)?;
        self.sites.push(Site::of(location, self.suffixes.as_ref())?);
        // Same-origin is always relative to the origin the chain started on.
        let first = self
            .origin
            .as_ref()
            .ok_or(CookieError::EmptyChain)?;
        self.same_origin = first.is_same_origin(&origin);
        self.same_site = self.compute_same_site();
        tracing::trace!(
            location = %location,
            same_origin = self.same_origin,
            same_site = self.same_site,
            "request chain advanced"
        );
        Ok(())
    }

    /// Reset to the Empty state.
    pub fn finish(&mut self) {
        self.origin = None;
        self.sites.clear();
        self.same_origin = true;
        self.same_site = true;
    }

    pub fn is_same_origin(&self) -> bool {
        self.same_origin
    }

    pub fn is_same_site(&self) -> bool {
        self.same_site
    }

    fn compute_same_site(&self) -> bool {
        let last = self.sites.len() - 1;
        let current = &self.sites[last];
        match self.mode {
            SameSiteMode::Lenient => self.sites[0].is_same_site(current),
            SameSiteMode::Strict => self.sites[..last]
                .iter()
                .all(|site| current.is_same_site(site)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(input: &str) -> Url {
        Url::parse(input).unwrap()
    }

    #[test]
    fn next_on_empty_chain_is_an_error() {
        let mut chain = RequestChain::default();
        assert_eq!(
            chain.next(&url("https://example.com/")),
            Err(CookieError::EmptyChain),
        );
    }

    #[test]
    fn fresh_chain_is_same_everything() {
        let mut chain = RequestChain::default();
        chain.start(&url("https://a.com/")).unwrap();
        assert!(chain.is_same_origin());
        assert!(chain.is_same_site());
        assert!(!chain.is_empty());
    }

    #[test]
    fn same_origin_compares_to_first_hop_only() {
        let mut chain = RequestChain::default();
        chain.start(&url("https://a.com/")).unwrap();
        chain.next(&url("https://b.com/")).unwrap();
        assert!(!chain.is_same_origin());
        chain.next(&url("https://a.com/")).unwrap();
        assert!(chain.is_same_origin());
    }

    #[test]
    fn strict_mode_remembers_cross_site_detour() {
        let mut chain = RequestChain::new(SameSiteMode::Strict);
        chain.start(&url("https://a.com/")).unwrap();
        chain.next(&url("https://b.com/")).unwrap();
        assert!(!chain.is_same_site());
        chain.next(&url("https://a.com/")).unwrap();
        assert!(!chain.is_same_site());
    }

    #[test]
    fn lenient_mode_forgives_cross_site_detour() {
        let mut chain = RequestChain::new(SameSiteMode::Lenient);
        chain.start(&url("https://a.com/")).unwrap();
        chain.next(&url("https://b.com/")).unwrap();
        assert!(!chain.is_same_site());
        chain.next(&url("https://a.com/")).unwrap();
        assert!(chain.is_same_site());
    }

    #[test]
    fn subdomains_are_same_site() {
        let mut chain = RequestChain::default();
        chain.start(&url("https://www.example.com/")).unwrap();
        chain.next(&url("https://login.example.com/")).unwrap();
        assert!(chain.is_same_site());
        assert!(!chain.is_same_origin());
    }

    #[test]
    fn scheme_change_is_cross_site() {
        let mut chain = RequestChain::default();
        chain.start(&url("https://example.com/")).unwrap();
        chain.next(&url("http://example.com/")).unwrap();
        assert!(!chain.is_same_site());
    }

    #[test]
    fn finish_resets_to_empty() {
        let mut chain = RequestChain::default();
        chain.start(&url("https://a.com/")).unwrap();
        chain.next(&url("https://b.com/")).unwrap();
        chain.finish();
        assert!(chain.is_empty());
        assert!(chain.is_same_site());
        assert_eq!(
            chain.next(&url("https://a.com/")),
            Err(CookieError::EmptyChain),
        );
    }
}
