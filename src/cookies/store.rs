//! The in-memory cookie index.

use crate::cookies::cookie::Cookie;
use std::collections::BTreeMap;
use time::OffsetDateTime;

type PathMap = BTreeMap<String, BTreeMap<String, Cookie>>;

/// Cookies indexed domain → path → name. Retrieval order is decided by the
/// retrieval algorithm, not by this structure.
#[derive(Debug, Default, Clone)]
pub struct CookieStore {
    index: BTreeMap<String, PathMap>,
}

impl CookieStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert; returns the replaced record, if any.
    pub fn set(&mut self, cookie: Cookie) -> Option<Cookie> {
        self.index
            .entry(cookie.domain.clone())
            .or_default()
            .entry(cookie.path.clone())
            .or_default()
            .insert(cookie.name.clone(), cookie)
    }

    pub fn get(&self, domain: &str, path: &str, name: &str) -> Option<&Cookie> {
        self.index.get(domain)?.get(path)?.get(name)
    }

    pub fn get_mut(&mut self, domain: &str, path: &str, name: &str) -> Option<&mut Cookie> {
        self.index.get_mut(domain)?.get_mut(path)?.get_mut(name)
    }

    pub fn remove(&mut self, domain: &str, path: &str, name: &str) -> Option<Cookie> {
        let paths = self.index.get_mut(domain)?;
        let names = paths.get_mut(path)?;
        let removed = names.remove(name);
        if names.is_empty() {
            paths.remove(path);
        }
        if paths.is_empty() {
            self.index.remove(domain);
        }
        removed
    }

    pub fn clear(&mut self) {
        self.index.clear();
    }

    pub fn len(&self) -> usize {
        self.index
            .values()
            .flat_map(|paths| paths.values())
            .map(|names| names.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn domain_len(&self, domain: &str) -> usize {
        self.index
            .get(domain)
            .map(|paths| paths.values().map(|names| names.len()).sum())
            .unwrap_or(0)
    }

    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    pub fn all(&self) -> impl Iterator<Item = &Cookie> {
        self.index
            .values()
            .flat_map(|paths| paths.values())
            .flat_map(|names| names.values())
    }

    /// Lazy query over the index: domains failing `domain_pred` are skipped
    /// without visiting their paths, and likewise for `path_pred`.
    pub fn matching<'a, D, P, C>(
        &'a self,
        domain_pred: D,
        path_pred: P,
        cookie_pred: C,
    ) -> impl Iterator<Item = &'a Cookie> + 'a
    where
        D: Fn(&str) -> bool + 'a,
        P: Fn(&str) -> bool + 'a,
        C: Fn(&Cookie) -> bool + 'a,
    {
        self.index
            .iter()
            .filter(move |(domain, _)| domain_pred(domain))
            .flat_map(|(_, paths)| paths.iter())
            .filter(move |(path, _)| path_pred(path))
            .flat_map(|(_, names)| names.values())
            .filter(move |cookie| cookie_pred(cookie))
    }

    pub fn any<D, P, C>(&self, domain_pred: D, path_pred: P, cookie_pred: C) -> bool
    where
        D: Fn(&str) -> bool,
        P: Fn(&str) -> bool,
        C: Fn(&Cookie) -> bool,
    {
        self.matching(domain_pred, path_pred, cookie_pred)
            .next()
            .is_some()
    }

    /// Keep only cookies satisfying the predicate, pruning emptied levels.
    pub fn retain(&mut self, mut pred: impl FnMut(&Cookie) -> bool) {
        self.index.retain(|_, paths| {
            paths.retain(|_, names| {
                names.retain(|_, cookie| pred(cookie));
                !names.is_empty()
            });
            !paths.is_empty()
        });
    }

    pub fn clear_expired(&mut self, at: OffsetDateTime) {
        self.retain(|cookie| !cookie.is_expired(at));
    }

    pub fn clear_session(&mut self) {
        self.retain(|cookie| cookie.persistent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn cookie(name: &str, domain: &str, path: &str) -> Cookie {
        let mut c = Cookie::new(name, "v", OffsetDateTime::UNIX_EPOCH);
        c.domain = domain.to_string();
        c.path = path.to_string();
        c
    }

    #[test]
    fn set_is_keyed_by_domain_path_name() {
        let mut store = CookieStore::new();
        store.set(cookie("a", "example.com", "/"));
        store.set(cookie("a", "example.com", "/sub"));
        store.set(cookie("a", "other.com", "/"));
        assert_eq!(store.len(), 3);

        let replaced = store.set(cookie("a", "example.com", "/"));
        assert!(replaced.is_some());
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn remove_prunes_empty_levels() {
        let mut store = CookieStore::new();
        store.set(cookie("a", "example.com", "/"));
        assert!(store.remove("example.com", "/", "a").is_some());
        assert!(store.is_empty());
        assert!(store.remove("example.com", "/", "a").is_none());
    }

    #[test]
    fn matching_applies_predicates_per_level() {
        let mut store = CookieStore::new();
        store.set(cookie("a", "example.com", "/"));
        store.set(cookie("b", "example.com", "/private"));
        store.set(cookie("c", "other.com", "/"));

        let names: Vec<_> = store
            .matching(
                |domain| domain == "example.com",
                |path| path == "/",
                |_| true,
            )
            .map(|c| c.name.clone())
            .collect();
        assert_eq!(names, ["a"]);

        assert!(store.any(|_| true, |_| true, |c| c.name == "c"));
        assert!(!store.any(|d| d == "example.com", |_| true, |c| c.name == "c"));
    }

    #[test]
    fn clear_expired_and_session() {
        let now = OffsetDateTime::from_unix_timestamp(1_000).unwrap();
        let mut store = CookieStore::new();

        let mut expired = cookie("dead", "example.com", "/");
        expired.persistent = true;
        expired.expires_at = 10;
        store.set(expired);

        let mut live = cookie("live", "example.com", "/");
        live.persistent = true;
        live.expires_at = 2_000;
        store.set(live);

        store.set(cookie("session", "example.com", "/"));

        store.clear_expired(now);
        assert_eq!(store.len(), 2);
        assert!(store.get("example.com", "/", "dead").is_none());

        store.clear_session();
        assert_eq!(store.len(), 1);
        assert!(store.get("example.com", "/", "live").is_some());
    }
}
