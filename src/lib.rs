//! # cookienet
//!
//! A client-side HTTP cookie engine: RFC 6265bis storage and retrieval with
//! tolerant header parsing, same-site request classification, pluggable
//! policy, and SQLite persistence.
//!
//! ## Quick Start
//!
//! ```rust
//! use cookienet::cookies::CookieJar;
//! use cookienet::http::HttpMethod;
//! use url::Url;
//!
//! let mut jar = CookieJar::new();
//! let url = Url::parse("https://example.com/login").unwrap();
//!
//! jar.update_from_response(
//!     HttpMethod::Post,
//!     &url,
//!     200,
//!     &["sid=opaque; Path=/; Secure; HttpOnly"],
//!     true,
//! )
//! .unwrap();
//!
//! let header = jar
//!     .retrieve_for_request(HttpMethod::Get, &url, true)
//!     .unwrap();
//! assert_eq!(header.as_deref(), Some("sid=opaque"));
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Errors and the injected clock
//! - [`cookies`] - Parsing, matching, policy, and the jar
//! - [`http`] - Methods, origins, sites, and redirect-chain tracking
//! - [`storage`] - Transactional SQLite persistence
//!
//! ## Security
//!
//! The jar enforces the RFC 6265bis client protections:
//! - Public Suffix List validation to prevent supercookie attacks
//! - `Secure` cookie integrity against insecure overwrites
//! - `__Secure-`/`__Host-` name prefix requirements
//! - `SameSite` enforcement, with strict or lenient redirect-chain
//!   classification via [`http::RequestChain`]

pub mod base;
pub mod cookies;
pub mod http;
pub mod storage;
