//! Tolerant parsing for the `Expires` cookie attribute.
//!
//! Implements the RFC 6265 cookie-date algorithm: the input is broken into
//! delimiter-separated tokens and scanned once, assigning the time,
//! day-of-month, month and year components in rule order rather than input
//! order, so legacy servers emitting any of the historical date formats
//! (RFC 850, asctime, RFC 1123, ...) still parse.
//!
//! <https://httpwg.org/specs/rfc6265.html#cookie-date>

use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time};

/// Parse a cookie date string. Returns `None` when the input does not
/// yield all four components or any component is out of range. The result
/// is always UTC.
pub fn parse(input: &str) -> Option<OffsetDateTime> {
    let mut time_of_day: Option<(u8, u8, u8)> = None;
    let mut day_of_month: Option<u8> = None;
    let mut month: Option<Month> = None;
    let mut year: Option<i32> = None;

    for token in tokenize(input) {
        if time_of_day.is_none() {
            if let Some(found) = parse_time(token) {
                time_of_day = Some(found);
                continue;
            }
        }
        if day_of_month.is_none() {
            if let Some(found) = parse_day_of_month(token) {
                day_of_month = Some(found);
                continue;
            }
        }
        if month.is_none() {
            if let Some(found) = parse_month(token) {
                month = Some(found);
                continue;
            }
        }
        if year.is_none() {
            if let Some(found) = parse_year(token) {
                year = Some(found);
                continue;
            }
        }
    }

    let (hour, minute, second) = time_of_day?;
    let day = day_of_month?;
    let month = month?;
    let mut year = year?;

    // Two-digit years: 70-99 are in the 1900s, 0-69 in the 2000s.
    if (70..=99).contains(&year) {
        year += 1900;
    } else if (0..=69).contains(&year) {
        year += 2000;
    }

    if !(1..=31).contains(&day) || year < 1601 || hour > 23 || minute > 59 || second > 59 {
        return None;
    }

    let date = Date::from_calendar_date(year, month, day).ok()?;
    let time = Time::from_hms(hour, minute, second).ok()?;
    Some(PrimitiveDateTime::new(date, time).assume_utc())
}

/// Date delimiters per RFC 6265 §5.1.1; a token is a maximal run of
/// non-delimiter bytes.
const fn is_delimiter(byte: u8) -> bool {
    matches!(
        byte,
        0x09 | 0x20..=0x2F | 0x3B..=0x40 | 0x5B..=0x60 | 0x7B..=0x7E
    )
}

fn tokenize(input: &str) -> impl Iterator<Item = &str> {
    input
        .split(|c: char| c.is_ascii() && is_delimiter(c as u8))
        .filter(|token| !token.is_empty())
}

/// Consume a leading run of 1 to `max` ASCII digits; the byte after the run
/// (if any) must not be a digit.
fn leading_digits(bytes: &[u8], max: usize) -> Option<(u32, &[u8])> {
    let run = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    if run == 0 || run > max {
        return None;
    }
    let mut value: u32 = 0;
    for &b in &bytes[..run] {
        value = value * 10 + u32::from(b - b'0');
    }
    Some((value, &bytes[run..]))
}

/// `hh:mm:ss` with 1-2 digit fields, optionally followed by non-digit junk.
fn parse_time(token: &str) -> Option<(u8, u8, u8)> {
    let bytes = token.as_bytes();
    let (hour, rest) = leading_digits(bytes, 2)?;
    let rest = rest.strip_prefix(b":")?;
    let (minute, rest) = leading_digits(rest, 2)?;
    let rest = rest.strip_prefix(b":")?;
    let (second, rest) = leading_digits(rest, 2)?;
    if rest.first().is_some_and(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((hour as u8, minute as u8, second as u8))
}

fn parse_day_of_month(token: &str) -> Option<u8> {
    let (day, rest) = leading_digits(token.as_bytes(), 2)?;
    if rest.first().is_some_and(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(day as u8)
}

/// Matches on a case-insensitive three-letter month prefix.
fn parse_month(token: &str) -> Option<Month> {
    let prefix = token.as_bytes().get(..3)?;
    let month = match prefix.to_ascii_lowercase().as_slice() {
        b"jan" => Month::January,
        b"feb" => Month::February,
        b"mar" => Month::March,
        b"apr" => Month::April,
        b"may" => Month::May,
        b"jun" => Month::June,
        b"jul" => Month::July,
        b"aug" => Month::August,
        b"sep" => Month::September,
        b"oct" => Month::October,
        b"nov" => Month::November,
        b"dec" => Month::December,
        _ => return None,
    };
    Some(month)
}

fn parse_year(token: &str) -> Option<i32> {
    let bytes = token.as_bytes();
    let run = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    if !(2..=4).contains(&run) {
        return None;
    }
    let (year, _) = leading_digits(bytes, 4)?;
    Some(year as i32)
}
