//! Parsing of `Set-Cookie` header values.
//!
//! <https://httpwg.org/http-extensions/draft-ietf-httpbis-rfc6265bis.html#name-the-set-cookie-header-field>

use crate::base::error::CookieError;
use crate::cookies::cookie::SameSite;
use crate::cookies::date;
use std::fmt;
use time::OffsetDateTime;

/// Name/value pair beyond which the whole header is rejected.
const MAX_NAME_VALUE_OCTETS: usize = 4096;

/// Attribute values beyond this length are dropped without aborting the
/// header.
const MAX_ATTRIBUTE_OCTETS: usize = 1024;

/// The result of parsing one `Set-Cookie` header: the raw attributes before
/// the storage algorithm has made any accept/reject decision. An empty
/// `domain` means the attribute was absent (or explicitly empty, which the
/// storage model treats identically).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: Option<String>,
    pub expires: Option<OffsetDateTime>,
    pub max_age: Option<i64>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
}

impl ResponseCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: String::new(),
            path: None,
            expires: None,
            max_age: None,
            secure: false,
            http_only: false,
            same_site: SameSite::Default,
        }
    }

    /// Parse one raw `Set-Cookie` header value.
    ///
    /// Fails on an empty header, forbidden control bytes, or an oversize
    /// name/value pair; malformed attributes are individually ignored.
    pub fn parse(header: &str) -> Result<Self, CookieError> {
        if header.is_empty() {
            return Err(CookieError::EmptyHeader);
        }
        if header
            .bytes()
            .any(|b| matches!(b, 0x00..=0x08 | 0x0A..=0x1F | 0x7F))
        {
            return Err(CookieError::InvalidCharacters);
        }

        let mut segments = header.split(';');
        let mut cookie = Self::parse_name_value(segments.next().unwrap_or(""))?;
        for segment in segments {
            cookie.parse_attribute(segment);
        }
        Ok(cookie)
    }

    fn parse_name_value(segment: &str) -> Result<Self, CookieError> {
        let (name, value) = match segment.split_once('=') {
            // No "=": the whole segment is the value of a nameless cookie.
            None => ("", segment),
            Some((name, value)) => (name, value),
        };
        let name = trim_ows(name);
        let value = trim_ows(value);
        if name.len() + value.len() > MAX_NAME_VALUE_OCTETS {
            return Err(CookieError::NameValueLimit);
        }
        Ok(Self::new(name, value))
    }

    fn parse_attribute(&mut self, segment: &str) {
        let (key, value) = match segment.split_once('=') {
            Some((key, value)) => (trim_ows(key), Some(trim_ows(value))),
            None => (trim_ows(segment), None),
        };

        if let Some(value) = value {
            if value.len() > MAX_ATTRIBUTE_OCTETS {
                return;
            }
            if key.eq_ignore_ascii_case("expires") {
                // An unparsable date leaves any previous Expires in place.
                if let Some(parsed) = date::parse(value) {
                    self.expires = Some(parsed);
                }
                return;
            }
            if key.eq_ignore_ascii_case("max-age") {
                self.parse_max_age(value);
                return;
            }
            if key.eq_ignore_ascii_case("domain") {
                self.parse_domain(value);
                return;
            }
            if key.eq_ignore_ascii_case("path") {
                self.path = if value.starts_with('/') {
                    Some(value.to_string())
                } else {
                    None
                };
                return;
            }
            if key.eq_ignore_ascii_case("samesite") {
                self.same_site = SameSite::from_attribute(value);
                return;
            }
        }

        // Boolean attributes accept (and ignore) a value.
        if key.eq_ignore_ascii_case("secure") {
            self.secure = true;
        } else if key.eq_ignore_ascii_case("httponly") {
            self.http_only = true;
        }
    }

    /// `-?\d+` only, saturating to the i64 range; anything else (including
    /// the empty string) is ignored.
    fn parse_max_age(&mut self, value: &str) {
        let digits = value.strip_prefix('-').unwrap_or(value);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return;
        }
        self.max_age = Some(value.parse::<i64>().unwrap_or(if value.starts_with('-') {
            i64::MIN
        } else {
            i64::MAX
        }));
    }

    fn parse_domain(&mut self, value: &str) {
        if value.is_empty() {
            self.domain.clear();
            return;
        }
        let value = value.strip_prefix('.').unwrap_or(value);
        self.domain = value.to_ascii_lowercase();
    }
}

/// Serializes back to `Set-Cookie` form.
impl fmt::Display for ResponseCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            f.write_str(&self.value)?;
        } else {
            write!(f, "{}={}", self.name, self.value)?;
        }
        if !self.domain.is_empty() {
            write!(f, "; domain={}", self.domain)?;
        }
        if let Some(path) = &self.path {
            write!(f, "; path={path}")?;
        }
        if let Some(expires) = self.expires {
            let format = time::macros::format_description!(
                "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
            );
            match expires.format(format) {
                Ok(date) => write!(f, "; expires={date}")?,
                Err(_) => return Err(fmt::Error),
            }
        }
        if let Some(max_age) = self.max_age {
            write!(f, "; max-age={max_age}")?;
        }
        if self.secure {
            f.write_str("; secure")?;
        }
        if self.http_only {
            f.write_str("; httponly")?;
        }
        if self.same_site != SameSite::Default {
            write!(f, "; samesite={}", self.same_site.as_str())?;
        }
        Ok(())
    }
}

/// Attribute names and values are trimmed of spaces and tabs only.
fn trim_ows(input: &str) -> &str {
    input.trim_matches(|c| c == ' ' || c == '\t')
}
