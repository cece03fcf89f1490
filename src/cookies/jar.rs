//! The cookie jar: response ingestion and request retrieval.

use time::OffsetDateTime;
use tracing::{debug, trace};
use url::Url;

use crate::base::clock::{Clock, UtcClock};
use crate::base::error::CookieError;
use crate::http::method::HttpMethod;
use crate::storage::PersistentStorage;

use super::cookie::{Cookie, CookieInit, SameSite};
use super::domain::Domain;
use super::parser::ResponseCookie;
use super::path::{default_path, path_matches};
use super::policy::{CookiePolicy, DefaultPolicy};
use super::psl::{PslSuffixes, PublicSuffixes};
use super::store::CookieStore;

/// How a retrieval sees the request it serves.
#[derive(Debug, Clone, Copy)]
pub struct Retrieval {
    pub is_http: bool,
    pub is_same_site: bool,
    pub is_secure: bool,
    pub is_safe_method: bool,
}

impl Retrieval {
    pub fn for_http_request(is_same_site: bool, is_secure: bool, is_safe_method: bool) -> Self {
        Retrieval {
            is_http: true,
            is_same_site,
            is_secure,
            is_safe_method,
        }
    }

    /// Non-HTTP access (scripts and similar) is treated as a secure
    /// same-site read that must not see HttpOnly cookies.
    pub fn for_non_http_request() -> Self {
        Retrieval {
            is_http: false,
            is_same_site: true,
            is_secure: true,
            is_safe_method: false,
        }
    }
}

/// An in-memory cookie store with the full acceptance and retrieval
/// algorithms layered on top, plus optional write-through persistence.
pub struct CookieJar {
    store: CookieStore,
    policy: Box<dyn CookiePolicy>,
    clock: Box<dyn Clock>,
    suffixes: Box<dyn PublicSuffixes>,
    storage: Option<Box<dyn PersistentStorage>>,
}

impl CookieJar {
    pub fn new() -> Self {
        CookieJar {
            store: CookieStore::new(),
            policy: Box::new(DefaultPolicy::new()),
            clock: Box::new(UtcClock),
            suffixes: Box::new(PslSuffixes),
            storage: None,
        }
    }

    pub fn with_policy(mut self, policy: impl CookiePolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_suffixes(mut self, suffixes: impl PublicSuffixes + 'static) -> Self {
        self.suffixes = Box::new(suffixes);
        self
    }

    pub fn with_storage(mut self, storage: impl PersistentStorage + 'static) -> Self {
        self.storage = Some(Box::new(storage));
        self
    }

    /// Inserts a cookie directly, bypassing the acceptance algorithm.
    /// Returns the record it replaced, if any.
    pub fn set(&mut self, init: impl Into<CookieInit>) -> Option<Cookie> {
        let cookie = match init.into() {
            CookieInit::Record(cookie) => cookie,
            CookieInit::Pair(name, value) => Cookie::new(name, value, self.clock.now()),
        };
        self.store.set(cookie)
    }

    pub fn get(&self, domain: &str, path: &str, name: &str) -> Option<&Cookie> {
        self.store.get(domain, path, name)
    }

    pub fn all(&self) -> impl Iterator<Item = &Cookie> {
        self.store.all()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn clear(&mut self) -> Result<(), CookieError> {
        self.store.clear();
        if let Some(storage) = &mut self.storage {
            storage.clear()?;
        }
        Ok(())
    }

    pub fn clear_expired(&mut self) {
        let now = self.clock.now();
        self.store.clear_expired(now);
    }

    pub fn clear_session_cookies(&mut self) {
        self.store.clear_session();
    }

    /// Replaces the in-memory contents with what storage holds. Returns
    /// how many cookies were loaded.
    pub fn load_from_storage(&mut self) -> Result<usize, CookieError> {
        let Some(storage) = &mut self.storage else {
            return Ok(0);
        };
        let cookies = storage.load()?;
        let count = cookies.len();
        self.store.clear();
        for cookie in cookies {
            self.store.set(cookie);
        }
        debug!(count, "loaded cookies from storage");
        Ok(count)
    }

    /// Processes every `Set-Cookie` header of a response against this jar.
    ///
    /// Individual malformed or rejected headers are skipped; only storage
    /// failures surface as errors.
    pub fn update_from_response(
        &mut self,
        method: HttpMethod,
        url: &Url,
        status: u16,
        headers: &[impl AsRef<str>],
        is_same_site: bool,
    ) -> Result<(), CookieError> {
        if !self.policy.should_accept_response(method, url, status) {
            return Ok(());
        }
        if url.host_str().is_none() {
            return Err(CookieError::UriMissingHost {
                uri: url.to_string(),
            });
        }
        let request_domain = Domain::of_url(url);
        let is_http = matches!(url.scheme(), "http" | "https");
        let is_secure = self.policy.is_request_secure(url);
        let now = self.clock.now();

        for header in headers {
            let received = match ResponseCookie::parse(header.as_ref()) {
                Ok(received) => received,
                Err(err) => {
                    debug!(error = %err, "skipping malformed Set-Cookie header");
                    continue;
                }
            };
            self.store_received_cookie(
                received,
                now,
                status,
                method,
                url,
                &request_domain,
                is_http,
                is_secure,
                is_same_site,
            )?;
        }
        if let Some(storage) = &mut self.storage {
            storage.flush()?;
        }
        Ok(())
    }

    /// Cookie header value for an HTTP request, or `None` when nothing
    /// matches.
    pub fn retrieve_for_request(
        &mut self,
        method: HttpMethod,
        url: &Url,
        is_same_site: bool,
    ) -> Result<Option<String>, CookieError> {
        let retrieval = Retrieval::for_http_request(
            is_same_site,
            self.policy.is_request_secure(url),
            self.policy.is_request_method_safe(method, url),
        );
        self.retrieve(method, url, retrieval)
    }

    /// Cookie string for non-HTTP access to `url`, such as script reads.
    pub fn retrieve_for_non_http(&mut self, url: &Url) -> Result<Option<String>, CookieError> {
        self.retrieve(HttpMethod::Get, url, Retrieval::for_non_http_request())
    }

    fn retrieve(
        &mut self,
        method: HttpMethod,
        url: &Url,
        retrieval: Retrieval,
    ) -> Result<Option<String>, CookieError> {
        let now = self.clock.now();
        self.store.clear_expired(now);
        if !self.policy.should_send_request(method, url) {
            return Ok(None);
        }
        if url.host_str().is_none() {
            return Err(CookieError::UriMissingHost {
                uri: url.to_string(),
            });
        }

        let request_domain = Domain::of_url(url);
        let request_host = request_domain.canonical();
        let request_path = url.path();
        let policy = &*self.policy;

        let mut matched: Vec<&Cookie> = self
            .store
            .matching(
                |domain| request_domain.matches(&Domain::of(domain)),
                |path| path_matches(request_path, path),
                |cookie| {
                    if cookie.host_only && cookie.domain != request_host {
                        return false;
                    }
                    if cookie.secure_only && !retrieval.is_secure {
                        return false;
                    }
                    if cookie.http_only && !retrieval.is_http {
                        return false;
                    }
                    if cookie.same_site != SameSite::None && !retrieval.is_same_site {
                        // Lax (and unset, treated as Lax here) still rides
                        // along on safe cross-site HTTP requests.
                        let lax_exception = retrieval.is_http
                            && retrieval.is_safe_method
                            && matches!(cookie.same_site, SameSite::Lax | SameSite::Default);
                        if !lax_exception {
                            return false;
                        }
                    }
                    policy.should_send_cookie(cookie, method, url)
                },
            )
            .collect();

        // Longer paths first, older cookies first within a path.
        matched.sort_by(|a, b| {
            b.path
                .len()
                .cmp(&a.path.len())
                .then_with(|| a.created_at.cmp(&b.created_at))
        });

        let keys: Vec<(String, String, String)> = matched
            .iter()
            .map(|c| (c.domain.clone(), c.path.clone(), c.name.clone()))
            .collect();
        drop(matched);

        let mut parts = Vec::with_capacity(keys.len());
        for (domain, path, name) in &keys {
            if let Some(cookie) = self.store.get_mut(domain, path, name) {
                cookie.touch(now);
                if let Some(storage) = &mut self.storage {
                    storage.touch(cookie)?;
                }
                let serialized = cookie.to_string();
                if !serialized.is_empty() {
                    parts.push(serialized);
                }
            }
        }
        if let Some(storage) = &mut self.storage {
            storage.flush()?;
        }

        if parts.is_empty() {
            Ok(None)
        } else {
            Ok(Some(parts.join("; ")))
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn store_received_cookie(
        &mut self,
        mut received: ResponseCookie,
        now: OffsetDateTime,
        status: u16,
        method: HttpMethod,
        url: &Url,
        request_domain: &Domain,
        is_http: bool,
        is_secure: bool,
        is_same_site: bool,
    ) -> Result<bool, CookieError> {
        let now_ts = now.unix_timestamp();
        let mut cookie = Cookie::new(received.name, received.value, now);

        // Max-Age wins over Expires; either one makes the cookie
        // persistent, otherwise it lives for the session.
        if let Some(max_age) = received.max_age {
            cookie.persistent = true;
            cookie.expires_at = if max_age <= 0 {
                i64::MIN
            } else {
                now_ts.saturating_add(max_age.min(self.policy.max_expiry()))
            };
        } else if let Some(expires) = received.expires {
            cookie.persistent = true;
            cookie.expires_at = expires
                .unix_timestamp()
                .min(now_ts.saturating_add(self.policy.max_expiry()));
        } else {
            cookie.persistent = false;
            cookie.expires_at = Cookie::EXPIRES_NEVER;
        }

        if !received.domain.is_ascii() {
            trace!(name = %cookie.name, "rejected: non-ascii domain attribute");
            return Ok(false);
        }

        if !self.policy.allows_public_suffixes()
            && !received.domain.is_empty()
            && self.suffixes.is_public_suffix(&received.domain)
        {
            if request_domain.equals(&Domain::of(&received.domain)) {
                // A host that IS the public suffix may still set a
                // host-only cookie for itself.
                received.domain.clear();
            } else {
                trace!(name = %cookie.name, domain = %received.domain, "rejected: public suffix domain");
                return Ok(false);
            }
        }

        if received.domain.is_empty() {
            cookie.host_only = true;
            cookie.domain = request_domain.canonical().to_string();
        } else {
            if !request_domain.matches(&Domain::of(&received.domain)) {
                trace!(name = %cookie.name, domain = %received.domain, "rejected: domain does not cover request host");
                return Ok(false);
            }
            cookie.host_only = false;
            cookie.domain = received.domain;
        }

        cookie.path = match received.path {
            Some(path) => path,
            None => default_path(url.path()).to_string(),
        };

        cookie.secure_only = received.secure;
        if cookie.secure_only && !is_secure {
            trace!(name = %cookie.name, "rejected: Secure cookie from insecure request");
            return Ok(false);
        }

        cookie.http_only = received.http_only;
        if cookie.http_only && !is_http {
            trace!(name = %cookie.name, "rejected: HttpOnly cookie from non-http source");
            return Ok(false);
        }

        // An insecure source must not shadow an existing Secure cookie it
        // could not itself have set.
        if !cookie.secure_only && !is_secure && self.contains_matching_secure_only(&cookie) {
            trace!(name = %cookie.name, "rejected: would shadow a Secure cookie");
            return Ok(false);
        }

        cookie.same_site = received.same_site;
        if cookie.same_site != SameSite::None && !is_same_site {
            trace!(name = %cookie.name, "rejected: SameSite cookie in cross-site response");
            return Ok(false);
        }
        if cookie.same_site == SameSite::None && !cookie.secure_only {
            trace!(name = %cookie.name, "rejected: SameSite=None requires Secure");
            return Ok(false);
        }

        if !prefix_requirements_hold(&cookie) {
            trace!(name = %cookie.name, "rejected: cookie name prefix requirements");
            return Ok(false);
        }

        if !self
            .policy
            .should_accept_cookie(&cookie, method, url, status)
        {
            trace!(name = %cookie.name, "rejected by policy");
            return Ok(false);
        }

        if let Some(old) = self.store.get(&cookie.domain, &cookie.path, &cookie.name) {
            if !is_http && old.http_only {
                trace!(name = %cookie.name, "rejected: non-http overwrite of HttpOnly cookie");
                return Ok(false);
            }
            cookie.created_at = old.created_at;
            let old = old.clone();
            if let Some(storage) = &mut self.storage {
                storage.delete(&old)?;
            }
        }

        if let Some(storage) = &mut self.storage {
            storage.add(&cookie)?;
        }
        trace!(name = %cookie.name, domain = %cookie.domain, path = %cookie.path, "stored cookie");
        self.store.set(cookie);
        self.enforce_limits()?;
        Ok(true)
    }

    fn contains_matching_secure_only(&self, cookie: &Cookie) -> bool {
        let cookie_domain = Domain::of(&cookie.domain);
        self.store.any(
            |domain| cookie_domain.matches(&Domain::of(domain)),
            |path| path_matches(&cookie.path, path),
            |existing| existing.secure_only && existing.name == cookie.name,
        )
    }

    fn enforce_limits(&mut self) -> Result<(), CookieError> {
        let per_domain = self.policy.max_count_per_domain();
        if per_domain != usize::MAX {
            let over: Vec<String> = self
                .store
                .domains()
                .filter(|d| self.store.domain_len(d) > per_domain)
                .map(String::from)
                .collect();
            for domain in over {
                let excess = self.store.domain_len(&domain) - per_domain;
                self.evict(Some(&domain), excess)?;
            }
        }
        let max_total = self.policy.max_count();
        if max_total != usize::MAX && self.store.len() > max_total {
            let excess = self.store.len() - max_total;
            self.evict(None, excess)?;
        }
        Ok(())
    }

    // Evicts the least recently accessed cookies, optionally scoped to one
    // domain.
    fn evict(&mut self, domain: Option<&str>, count: usize) -> Result<(), CookieError> {
        let mut candidates: Vec<&Cookie> = self
            .store
            .all()
            .filter(|c| domain.map_or(true, |d| c.domain == d))
            .collect();
        candidates.sort_by(|a, b| a.accessed_at.cmp(&b.accessed_at));
        let keys: Vec<(String, String, String)> = candidates
            .iter()
            .take(count)
            .map(|c| (c.domain.clone(), c.path.clone(), c.name.clone()))
            .collect();
        drop(candidates);
        for (domain, path, name) in keys {
            if let Some(removed) = self.store.remove(&domain, &path, &name) {
                debug!(name = %removed.name, domain = %removed.domain, "evicted cookie over limit");
                if let Some(storage) = &mut self.storage {
                    storage.delete(&removed)?;
                }
            }
        }
        Ok(())
    }
}

impl Default for CookieJar {
    fn default() -> Self {
        CookieJar::new()
    }
}

fn has_prefix_ignore_case(s: &str, prefix: &str) -> bool {
    s.as_bytes()
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix.as_bytes()))
}

fn prefix_requirements_hold(cookie: &Cookie) -> bool {
    if has_prefix_ignore_case(&cookie.name, "__Secure-") {
        return cookie.secure_only;
    }
    if has_prefix_ignore_case(&cookie.name, "__Host-") {
        return cookie.secure_only && cookie.host_only && cookie.path == "/";
    }
    if cookie.name.is_empty() {
        // A nameless cookie must not smuggle a prefixed name through its
        // value.
        return !has_prefix_ignore_case(&cookie.value, "__Secure-")
            && !has_prefix_ignore_case(&cookie.value, "__Host-");
    }
    true
}
