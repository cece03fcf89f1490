//! Cookie parsing, matching, and the jar itself.
//!
//! The pieces layer roughly bottom-up:
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`parser`] | Tolerant `Set-Cookie` header parsing |
//! | [`date`] | Tolerant cookie-date parsing |
//! | [`domain`] | Host canonicalization and domain-match |
//! | [`path`] | Default-path and path-match |
//! | [`psl`] | Public Suffix List lookups |
//! | [`cookie`] | The canonical cookie record |
//! | [`store`] | The in-memory domain/path/name index |
//! | [`policy`] | Pluggable limits and veto hooks |
//! | [`jar`] | The storage and retrieval algorithms |
//!
//! # Quick start
//!
//! ```rust
//! use cookienet::cookies::CookieJar;
//! use cookienet::http::HttpMethod;
//! use url::Url;
//!
//! let mut jar = CookieJar::new();
//! let url = Url::parse("https://example.com/").unwrap();
//! jar.update_from_response(HttpMethod::Get, &url, 200, &["sid=opaque; Secure"], true)
//!     .unwrap();
//! let header = jar.retrieve_for_request(HttpMethod::Get, &url, true).unwrap();
//! assert_eq!(header.as_deref(), Some("sid=opaque"));
//! ```

pub mod cookie;
pub mod date;
pub mod domain;
pub mod jar;
pub mod parser;
pub mod path;
pub mod policy;
pub mod psl;
pub mod store;

pub use cookie::{Cookie, CookieInit, SameSite};
pub use domain::Domain;
pub use jar::{CookieJar, Retrieval};
pub use parser::ResponseCookie;
pub use policy::{CookiePolicy, DefaultPolicy};
pub use psl::{PslSuffixes, PublicSuffixes};
pub use store::CookieStore;
