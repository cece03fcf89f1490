//! Origins and sites.
//!
//! An origin is a (scheme, host, port) tuple, optionally carrying an
//! effective-domain override; a site is (scheme, registrable domain or
//! host). Both are immutable once constructed.
//!
//! <https://html.spec.whatwg.org/multipage/browsers.html#concept-origin>
//! <https://html.spec.whatwg.org/#sites>

use crate::base::error::CookieError;
use crate::cookies::psl::PublicSuffixes;
use std::fmt;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    scheme: String,
    host: String,
    port: Option<u16>,
    domain: Option<String>,
}

impl Origin {
    pub fn new(
        scheme: impl Into<String>,
        host: impl Into<String>,
        port: Option<u16>,
    ) -> Result<Self, CookieError> {
        let scheme = scheme.into();
        let host = host.into();
        if scheme.is_empty() || host.is_empty() {
            return Err(CookieError::InvalidOrigin);
        }
        Ok(Self {
            scheme,
            host,
            port,
            domain: None,
        })
    }

    pub fn of(url: &Url) -> Result<Self, CookieError> {
        let host = url.host_str().ok_or(CookieError::InvalidOrigin)?;
        Self::new(url.scheme(), host, url.port_or_known_default())
    }

    /// Sets the effective domain, as a page would via `document.domain`.
    pub fn with_effective_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// <https://html.spec.whatwg.org/multipage/browsers.html#concept-origin-effective-domain>
    pub fn effective_domain(&self) -> &str {
        self.domain.as_deref().unwrap_or(&self.host)
    }

    /// Exact scheme + host + port equality.
    ///
    /// <https://html.spec.whatwg.org/multipage/browsers.html#same-origin>
    pub fn is_same_origin(&self, other: &Origin) -> bool {
        self.scheme == other.scheme && self.host == other.host && self.port == other.port
    }

    /// <https://html.spec.whatwg.org/multipage/browsers.html#same-origin-domain>
    pub fn is_same_origin_domain(&self, other: &Origin) -> bool {
        if self.domain != other.domain {
            return false;
        }
        match &self.domain {
            None => self.is_same_origin(other),
            Some(_) => self.scheme == other.scheme,
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}://{}:{}", self.scheme, self.host, port),
            None => write!(f, "{}://{}", self.scheme, self.host),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    scheme: String,
    host: String,
}

impl Site {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Result<Self, CookieError> {
        let scheme = scheme.into();
        let host = host.into();
        if scheme.is_empty() || host.is_empty() {
            return Err(CookieError::InvalidSite);
        }
        Ok(Self { scheme, host })
    }

    /// Obtain the site of a URL: its scheme plus its host's registrable
    /// domain, falling back to the host itself when no registrable domain
    /// exists.
    ///
    /// <https://html.spec.whatwg.org/multipage/browsers.html#obtain-a-site>
    pub fn of(url: &Url, suffixes: &dyn PublicSuffixes) -> Result<Self, CookieError> {
        let host = url.host_str().ok_or(CookieError::InvalidSite)?;
        match suffixes.registrable_domain(host) {
            Some(domain) => Self::new(url.scheme(), domain),
            None => Self::new(url.scheme(), host),
        }
    }

    /// Exact scheme + host equality.
    pub fn is_same_site(&self, other: &Site) -> bool {
        self.scheme == other.scheme && self.host == other.host
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host)
    }
}
