//! Base types and error handling.
//!
//! Provides the foundational pieces shared by the whole engine:
//! - [`CookieError`](error::CookieError): the crate-wide error enum
//! - [`Clock`](clock::Clock): injected wall-clock capability

pub mod clock;
pub mod error;

pub use clock::{Clock, FixedClock, UtcClock};
pub use error::CookieError;
