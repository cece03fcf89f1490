//! Default-path derivation and the RFC 6265 path-match predicate.
//!
//! <https://httpwg.org/specs/rfc6265.html#cookie-path>

/// The default path of a cookie set without a `Path` attribute: `/` for an
/// empty or non-rooted request path, otherwise the request path up to but
/// not including its right-most `/`.
pub fn default_path(uri_path: &str) -> &str {
    if uri_path.is_empty() || !uri_path.starts_with('/') {
        return "/";
    }
    match uri_path.rfind('/') {
        Some(0) | None => "/",
        Some(pos) => &uri_path[..pos],
    }
}

/// A request path path-matches a cookie path when they are identical, or
/// when the cookie path is a prefix ending in `/`, or a prefix whose next
/// request-path character is `/`. An empty request path counts as `/`.
pub fn path_matches(request_path: &str, cookie_path: &str) -> bool {
    let request_path = if request_path.is_empty() {
        "/"
    } else {
        request_path
    };
    if request_path == cookie_path {
        return true;
    }
    if let Some(rest) = request_path.strip_prefix(cookie_path) {
        if cookie_path.ends_with('/') || rest.starts_with('/') {
            return true;
        }
    }
    false
}
