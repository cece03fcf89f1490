use thiserror::Error;

/// Crate-wide error type.
///
/// Parse errors abort the offending `Set-Cookie` header only; the storage
/// algorithm skips it and keeps going. Usage errors (invalid origins, an
/// empty request chain) indicate caller bugs and are surfaced as `Err`
/// values. Storage errors wrap a failed persistence transaction.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum CookieError {
    // Set-Cookie parsing
    #[error("Set-Cookie header is empty")]
    EmptyHeader,
    #[error("Set-Cookie header contains forbidden control bytes")]
    InvalidCharacters,
    #[error("cookie name/value pair exceeds the 4096 octet limit")]
    NameValueLimit,

    // Usage errors
    #[error("URI has no host: {uri}")]
    UriMissingHost { uri: String },
    #[error("an origin requires a non-empty scheme and host")]
    InvalidOrigin,
    #[error("a site requires a non-empty scheme and host")]
    InvalidSite,
    #[error("the request chain is empty")]
    EmptyChain,
    #[error("unknown HTTP method: {0}")]
    UnknownMethod(String),

    // Persistent storage
    #[error("cookie storage is locked")]
    StorageLocked,
    #[error("cookie storage failure: {message}")]
    Storage { message: String },
}

impl CookieError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// True for the parse-error variants that only invalidate a single
    /// `Set-Cookie` header.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyHeader | Self::InvalidCharacters | Self::NameValueLimit
        )
    }
}

impl From<rusqlite::Error> for CookieError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ffi::ErrorCode::DatabaseBusy
                    || e.code == rusqlite::ffi::ErrorCode::DatabaseLocked =>
            {
                CookieError::StorageLocked
            }
            _ => CookieError::Storage {
                message: err.to_string(),
            },
        }
    }
}
