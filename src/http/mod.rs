//! HTTP-facing types: request methods, origins, sites, and the redirect
//! request chain whose same-origin/same-site flags feed the cookie
//! algorithms.

pub mod chain;
pub mod method;
pub mod origin;

// Re-exports for convenience
pub use chain::{RequestChain, SameSiteMode};
pub use method::HttpMethod;
pub use origin::{Origin, Site};
