//! Durable cookie storage.
//!
//! Writes are queued as value copies and applied in batches: the jar calls
//! `add`/`delete`/`touch` while running its algorithms and `flush` once per
//! response or retrieval, making the flush transaction the atomicity
//! boundary. Operations queued but never flushed are lost on crash; the
//! in-memory store stays authoritative for the process lifetime.

pub mod sqlite;

pub use sqlite::SqliteStorage;

use crate::base::error::CookieError;
use crate::cookies::cookie::Cookie;

/// A queued storage mutation; owns its own copy of the record so later
/// in-memory changes cannot leak into an earlier queued write.
#[derive(Debug, Clone)]
pub enum Operation {
    Add(Cookie),
    Delete(Cookie),
    Touch(Cookie),
}

impl Operation {
    pub fn cookie(&self) -> &Cookie {
        match self {
            Operation::Add(c) | Operation::Delete(c) | Operation::Touch(c) => c,
        }
    }
}

/// The durability contract the jar programs against.
pub trait PersistentStorage {
    /// Whether session (non-persistent) cookies should be written at all.
    fn set_persist_session_cookies(&mut self, persist: bool);

    /// Deletes every stored cookie and drops the pending queue.
    fn clear(&mut self) -> Result<(), CookieError>;

    /// Loads all committed rows; session rows are excluded unless session
    /// persistence is enabled.
    fn load(&mut self) -> Result<Vec<Cookie>, CookieError>;

    /// Loads committed rows for the given host keys.
    fn load_domains(&mut self, keys: &[&str]) -> Result<Vec<Cookie>, CookieError>;

    /// Queues an insert. May auto-flush when the queue reaches its
    /// threshold, hence fallible.
    fn add(&mut self, cookie: &Cookie) -> Result<(), CookieError>;

    /// Queues a delete.
    fn delete(&mut self, cookie: &Cookie) -> Result<(), CookieError>;

    /// Queues a last-access-time update.
    fn touch(&mut self, cookie: &Cookie) -> Result<(), CookieError>;

    /// Runs every queued operation in one transaction. On failure the
    /// transaction rolls back, the error surfaces as
    /// [`CookieError::Storage`], and the queue is considered drained: the
    /// failed operations are not retried.
    fn flush(&mut self) -> Result<(), CookieError>;
}
