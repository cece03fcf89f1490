//! SQLite-backed cookie storage.

use std::path::Path;

use rusqlite::{params, params_from_iter, Connection};
use time::OffsetDateTime;
use tracing::debug;

use crate::base::error::CookieError;
use crate::cookies::cookie::{Cookie, SameSite};

use super::{Operation, PersistentStorage};

/// Default count of queued operations beyond which a flush runs
/// automatically, independent of the caller's own flush cadence.
const DEFAULT_MAX_PENDING: usize = 512;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS cookies (
    host_key    TEXT NOT NULL,
    domain      TEXT NOT NULL,
    path        TEXT NOT NULL,
    name        TEXT NOT NULL,
    value       TEXT NOT NULL,
    created_at  INTEGER NOT NULL,
    expires_at  INTEGER NOT NULL,
    accessed_at INTEGER NOT NULL,
    hostonly    INTEGER NOT NULL,
    secureonly  INTEGER NOT NULL,
    httponly    INTEGER NOT NULL,
    persistent  INTEGER NOT NULL,
    samesite    TEXT NOT NULL,
    UNIQUE (host_key, path, name)
)";

/// Cookie persistence over a single SQLite database.
///
/// Mutations are queued in memory and written in one transaction per
/// [`flush`](PersistentStorage::flush). Any queue still pending when the
/// storage is dropped gets a best-effort final flush.
pub struct SqliteStorage {
    conn: Connection,
    pending: Vec<Operation>,
    persist_session_cookies: bool,
    max_pending: usize,
}

impl SqliteStorage {
    /// Opens (creating if needed) the database at `path` and runs the
    /// schema migration.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CookieError> {
        Self::from_connection(Connection::open(path)?)
    }

    /// An in-memory database, useful for tests and throwaway jars.
    pub fn in_memory() -> Result<Self, CookieError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, CookieError> {
        conn.execute(SCHEMA, [])?;
        Ok(SqliteStorage {
            conn,
            pending: Vec::new(),
            persist_session_cookies: false,
            max_pending: DEFAULT_MAX_PENDING,
        })
    }

    /// Changes the auto-flush threshold.
    pub fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = max_pending.max(1);
        self
    }

    fn queue(&mut self, op: Operation) -> Result<(), CookieError> {
        if !self.persist_session_cookies && !op.cookie().persistent {
            return Ok(());
        }
        self.pending.push(op);
        if self.pending.len() >= self.max_pending {
            self.flush()?;
        }
        Ok(())
    }

    fn load_rows(&mut self, keys: Option<&[&str]>) -> Result<Vec<Cookie>, CookieError> {
        let mut sql = String::from(
            "SELECT host_key, domain, path, name, value, created_at, expires_at, \
             accessed_at, hostonly, secureonly, httponly, persistent, samesite \
             FROM cookies",
        );
        let mut clauses = Vec::new();
        if !self.persist_session_cookies {
            clauses.push("persistent = 1".to_string());
        }
        let keys = keys.unwrap_or(&[]);
        if !keys.is_empty() {
            let placeholders = vec!["?"; keys.len()].join(", ");
            clauses.push(format!("host_key IN ({placeholders})"));
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(keys.iter()), row_to_cookie)?;
        let mut cookies = Vec::new();
        for row in rows {
            cookies.push(row?);
        }
        Ok(cookies)
    }
}

impl PersistentStorage for SqliteStorage {
    fn set_persist_session_cookies(&mut self, persist: bool) {
        self.persist_session_cookies = persist;
    }

    fn clear(&mut self) -> Result<(), CookieError> {
        self.pending.clear();
        self.conn.execute("DELETE FROM cookies", [])?;
        Ok(())
    }

    fn load(&mut self) -> Result<Vec<Cookie>, CookieError> {
        self.load_rows(None)
    }

    fn load_domains(&mut self, keys: &[&str]) -> Result<Vec<Cookie>, CookieError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        self.load_rows(Some(keys))
    }

    fn add(&mut self, cookie: &Cookie) -> Result<(), CookieError> {
        self.queue(Operation::Add(cookie.clone()))
    }

    fn delete(&mut self, cookie: &Cookie) -> Result<(), CookieError> {
        self.queue(Operation::Delete(cookie.clone()))
    }

    fn touch(&mut self, cookie: &Cookie) -> Result<(), CookieError> {
        self.queue(Operation::Touch(cookie.clone()))
    }

    fn flush(&mut self) -> Result<(), CookieError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        // Drain up front so a failed transaction does not leave the queue
        // replaying the same doomed writes forever.
        let pending = std::mem::take(&mut self.pending);
        debug!(operations = pending.len(), "flushing cookie storage");

        let tx = self.conn.transaction()?;
        for op in &pending {
            match op {
                Operation::Add(c) => {
                    tx.execute(
                        "INSERT OR REPLACE INTO cookies \
                         (host_key, domain, path, name, value, created_at, expires_at, \
                          accessed_at, hostonly, secureonly, httponly, persistent, samesite) \
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                        params![
                            c.domain,
                            c.domain,
                            c.path,
                            c.name,
                            c.value,
                            c.created_at.unix_timestamp(),
                            if c.expires_at == Cookie::EXPIRES_NEVER { 0 } else { c.expires_at },
                            c.accessed_at.unix_timestamp(),
                            c.host_only,
                            c.secure_only,
                            c.http_only,
                            c.persistent,
                            c.same_site.as_str(),
                        ],
                    )?;
                }
                Operation::Delete(c) => {
                    tx.execute(
                        "DELETE FROM cookies WHERE host_key = ?1 AND path = ?2 AND name = ?3",
                        params![c.domain, c.path, c.name],
                    )?;
                }
                Operation::Touch(c) => {
                    tx.execute(
                        "UPDATE cookies SET accessed_at = ?1 \
                         WHERE host_key = ?2 AND path = ?3 AND name = ?4",
                        params![c.accessed_at.unix_timestamp(), c.domain, c.path, c.name],
                    )?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }
}

impl Drop for SqliteStorage {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

fn row_to_cookie(row: &rusqlite::Row<'_>) -> rusqlite::Result<Cookie> {
    let created: i64 = row.get(5)?;
    let expires: i64 = row.get(6)?;
    let accessed: i64 = row.get(7)?;
    let persistent: bool = row.get(11)?;
    let samesite: String = row.get(12)?;
    Ok(Cookie {
        name: row.get(3)?,
        value: row.get(4)?,
        domain: row.get(1)?,
        path: row.get(2)?,
        persistent,
        expires_at: if persistent { expires } else { Cookie::EXPIRES_NEVER },
        host_only: row.get(8)?,
        secure_only: row.get(9)?,
        http_only: row.get(10)?,
        same_site: SameSite::from_attribute(&samesite),
        created_at: timestamp(created),
        accessed_at: timestamp(accessed),
    })
}

fn timestamp(secs: i64) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(secs).unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn sample(name: &str, persistent: bool) -> Cookie {
        let mut c = Cookie::new(name.to_string(), "v".to_string(), datetime!(2026-01-01 00:00 UTC));
        c.domain = "example.com".to_string();
        c.persistent = persistent;
        if persistent {
            c.expires_at = datetime!(2027-01-01 00:00 UTC).unix_timestamp();
        }
        c
    }

    #[test]
    fn add_is_invisible_until_flush() {
        let mut storage = SqliteStorage::in_memory().unwrap();
        storage.add(&sample("a", true)).unwrap();
        assert!(storage.load().unwrap().is_empty());
        storage.flush().unwrap();
        assert_eq!(storage.load().unwrap().len(), 1);
    }

    #[test]
    fn queue_auto_flushes_at_threshold() {
        let mut storage = SqliteStorage::in_memory().unwrap().with_max_pending(2);
        storage.add(&sample("a", true)).unwrap();
        assert!(storage.load().unwrap().is_empty());
        storage.add(&sample("b", true)).unwrap();
        assert_eq!(storage.load().unwrap().len(), 2);
    }

    #[test]
    fn round_trips_fields() {
        let mut storage = SqliteStorage::in_memory().unwrap();
        let mut c = sample("sid", true);
        c.value = "opaque".to_string();
        c.path = "/app".to_string();
        c.host_only = false;
        c.secure_only = true;
        c.http_only = true;
        c.same_site = SameSite::Strict;
        storage.add(&c).unwrap();
        storage.flush().unwrap();

        let loaded = storage.load().unwrap();
        assert_eq!(loaded.len(), 1);
        let got = &loaded[0];
        assert_eq!(got.name, "sid");
        assert_eq!(got.value, "opaque");
        assert_eq!(got.domain, "example.com");
        assert_eq!(got.path, "/app");
        assert!(!got.host_only);
        assert!(got.secure_only);
        assert!(got.http_only);
        assert_eq!(got.same_site, SameSite::Strict);
        assert_eq!(got.created_at, c.created_at);
        assert_eq!(got.expires_at, c.expires_at);
    }

    #[test]
    fn session_cookies_are_dropped_at_the_queue() {
        let mut storage = SqliteStorage::in_memory().unwrap();
        storage.add(&sample("session", false)).unwrap();
        storage.flush().unwrap();
        assert!(storage.load().unwrap().is_empty());
    }

    #[test]
    fn session_cookies_persist_when_enabled() {
        let mut storage = SqliteStorage::in_memory().unwrap();
        storage.set_persist_session_cookies(true);
        storage.add(&sample("session", false)).unwrap();
        storage.flush().unwrap();

        let loaded = storage.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(!loaded[0].persistent);
        assert_eq!(loaded[0].expires_at, Cookie::EXPIRES_NEVER);
    }

    #[test]
    fn delete_removes_the_row() {
        let mut storage = SqliteStorage::in_memory().unwrap();
        let c = sample("a", true);
        storage.add(&c).unwrap();
        storage.flush().unwrap();
        storage.delete(&c).unwrap();
        storage.flush().unwrap();
        assert!(storage.load().unwrap().is_empty());
    }

    #[test]
    fn touch_updates_access_time() {
        let mut storage = SqliteStorage::in_memory().unwrap();
        let mut c = sample("a", true);
        storage.add(&c).unwrap();
        storage.flush().unwrap();

        c.accessed_at = datetime!(2026-06-01 12:00 UTC);
        storage.touch(&c).unwrap();
        storage.flush().unwrap();

        let loaded = storage.load().unwrap();
        assert_eq!(loaded[0].accessed_at, datetime!(2026-06-01 12:00 UTC));
    }

    #[test]
    fn replace_on_same_key() {
        let mut storage = SqliteStorage::in_memory().unwrap();
        let mut c = sample("a", true);
        storage.add(&c).unwrap();
        c.value = "second".to_string();
        storage.add(&c).unwrap();
        storage.flush().unwrap();

        let loaded = storage.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].value, "second");
    }

    #[test]
    fn load_domains_filters_by_host_key() {
        let mut storage = SqliteStorage::in_memory().unwrap();
        let mut other = sample("b", true);
        other.domain = "other.test".to_string();
        storage.add(&sample("a", true)).unwrap();
        storage.add(&other).unwrap();
        storage.flush().unwrap();

        let loaded = storage.load_domains(&["example.com"]).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "a");
        assert!(storage.load_domains(&[]).unwrap().is_empty());
    }

    #[test]
    fn clear_drops_rows_and_queue() {
        let mut storage = SqliteStorage::in_memory().unwrap();
        storage.add(&sample("a", true)).unwrap();
        storage.flush().unwrap();
        storage.add(&sample("b", true)).unwrap();
        storage.clear().unwrap();
        storage.flush().unwrap();
        assert!(storage.load().unwrap().is_empty());
    }
}
