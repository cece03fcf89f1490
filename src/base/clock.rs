//! Wall-clock provisioning.
//!
//! Every time-dependent decision in the engine (expiry arithmetic, creation
//! and access timestamps) reads the clock injected at construction, so tests
//! can pin or advance time deterministically.

use std::cell::Cell;
use time::OffsetDateTime;

/// A source of "now".
pub trait Clock {
    fn now(&self) -> OffsetDateTime;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> OffsetDateTime {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Box<C> {
    fn now(&self) -> OffsetDateTime {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for std::rc::Rc<C> {
    fn now(&self) -> OffsetDateTime {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> OffsetDateTime {
        (**self).now()
    }
}

/// The default clock: UTC system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct UtcClock;

impl Clock for UtcClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// A clock frozen at a given instant, advanced explicitly. Second
/// resolution, which is all the cookie model observes.
#[derive(Debug)]
pub struct FixedClock {
    timestamp: Cell<i64>,
}

impl FixedClock {
    pub fn at(now: OffsetDateTime) -> Self {
        Self {
            timestamp: Cell::new(now.unix_timestamp()),
        }
    }

    pub fn at_timestamp(timestamp: i64) -> Self {
        Self {
            timestamp: Cell::new(timestamp),
        }
    }

    pub fn set(&self, now: OffsetDateTime) {
        self.timestamp.set(now.unix_timestamp());
    }

    pub fn advance(&self, seconds: i64) {
        self.timestamp.set(self.timestamp.get().saturating_add(seconds));
    }
}

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(self.timestamp.get())
            .unwrap_or(OffsetDateTime::UNIX_EPOCH)
    }
}
