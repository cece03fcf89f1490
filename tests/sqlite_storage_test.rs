//! Persistence across jar instances over the same database file.

use std::rc::Rc;

use cookienet::base::FixedClock;
use cookienet::cookies::CookieJar;
use cookienet::http::HttpMethod;
use cookienet::storage::{PersistentStorage, SqliteStorage};
use time::macros::datetime;
use url::Url;

fn jar_over(path: &std::path::Path) -> (CookieJar, Rc<FixedClock>) {
    let clock = Rc::new(FixedClock::at(datetime!(2026-03-01 12:00 UTC)));
    let storage = SqliteStorage::open(path).unwrap();
    let jar = CookieJar::new()
        .with_clock(Rc::clone(&clock))
        .with_storage(storage);
    (jar, clock)
}

fn ingest(jar: &mut CookieJar, url: &str, headers: &[&str]) {
    let url = Url::parse(url).unwrap();
    jar.update_from_response(HttpMethod::Get, &url, 200, headers, true)
        .unwrap();
}

#[test]
fn persistent_cookies_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("cookies.sqlite");

    {
        let (mut jar, _) = jar_over(&db);
        ingest(
            &mut jar,
            "https://example.com/app/page",
            &[
                "keep=1; Max-Age=86400; Path=/app; Secure; SameSite=Strict",
                "session=2",
            ],
        );
    }

    let (mut jar, _) = jar_over(&db);
    assert_eq!(jar.load_from_storage().unwrap(), 1);
    let kept = jar.get("example.com", "/app", "keep").unwrap();
    assert_eq!(kept.value, "1");
    assert!(kept.secure_only);
    assert_eq!(kept.same_site, cookienet::cookies::SameSite::Strict);
    assert!(jar.get("example.com", "/", "session").is_none());

    let url = Url::parse("https://example.com/app/page").unwrap();
    assert_eq!(
        jar.retrieve_for_request(HttpMethod::Get, &url, true).unwrap(),
        Some("keep=1".into())
    );
}

#[test]
fn session_cookies_survive_when_persistence_is_opted_in() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("cookies.sqlite");

    {
        let mut storage = SqliteStorage::open(&db).unwrap();
        storage.set_persist_session_cookies(true);
        let mut jar = CookieJar::new().with_storage(storage);
        ingest(&mut jar, "http://example.com/", &["session=2"]);
    }

    let mut storage = SqliteStorage::open(&db).unwrap();
    storage.set_persist_session_cookies(true);
    let mut jar = CookieJar::new().with_storage(storage);
    assert_eq!(jar.load_from_storage().unwrap(), 1);
    assert!(!jar.get("example.com", "/", "session").unwrap().persistent);
}

#[test]
fn replacement_and_deletion_reach_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("cookies.sqlite");

    {
        let (mut jar, _) = jar_over(&db);
        ingest(&mut jar, "http://example.com/", &["a=1; Max-Age=3600"]);
        ingest(&mut jar, "http://example.com/", &["a=2; Max-Age=3600"]);
        ingest(&mut jar, "http://example.com/", &["b=1; Max-Age=3600"]);
        // Max-Age=0 deletes from the jar; the row must go too.
        ingest(&mut jar, "http://example.com/", &["b=gone; Max-Age=0"]);
        let url = Url::parse("http://example.com/").unwrap();
        assert_eq!(
            jar.retrieve_for_request(HttpMethod::Get, &url, true).unwrap(),
            Some("a=2".into())
        );
    }

    let (mut jar, clock) = jar_over(&db);
    jar.load_from_storage().unwrap();
    assert_eq!(jar.get("example.com", "/", "a").unwrap().value, "2");
    // The Max-Age=0 record was written expired; time has not moved, but any
    // retrieval prunes it.
    clock.advance(1);
    let url = Url::parse("http://example.com/").unwrap();
    assert_eq!(
        jar.retrieve_for_request(HttpMethod::Get, &url, true).unwrap(),
        Some("a=2".into())
    );
    assert!(jar.get("example.com", "/", "b").is_none());
}

#[test]
fn clear_empties_both_jar_and_database() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("cookies.sqlite");

    {
        let (mut jar, _) = jar_over(&db);
        ingest(&mut jar, "http://example.com/", &["a=1; Max-Age=3600"]);
        jar.clear().unwrap();
        assert!(jar.is_empty());
    }

    let (mut jar, _) = jar_over(&db);
    assert_eq!(jar.load_from_storage().unwrap(), 0);
}

#[test]
fn access_times_are_written_back() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("cookies.sqlite");

    {
        let (mut jar, clock) = jar_over(&db);
        ingest(&mut jar, "http://example.com/", &["a=1; Max-Age=86400"]);
        clock.advance(600);
        let url = Url::parse("http://example.com/").unwrap();
        jar.retrieve_for_request(HttpMethod::Get, &url, true)
            .unwrap();
    }

    let mut storage = SqliteStorage::open(&db).unwrap();
    let loaded = storage.load().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(
        loaded[0].accessed_at,
        loaded[0].created_at + time::Duration::seconds(600)
    );
}
