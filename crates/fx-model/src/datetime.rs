//! Strict wire-format parsing for date/time literals.
//!
//! The accepted grammars are deliberately narrow (these are wire formats, not
//! user input):
//! - date / date-time: `YYYY-MM-DD`, optionally `THH:MM:SS`, optionally
//!   `.fff` (exactly three fractional digits), optionally a trailing `Z`
//! - time-only: exactly `HH:MM:SS.fff`
//!
//! Pattern mismatch and calendar invalidity (month 13, day 40, hour 25, ...)
//! are both reported as the same parse failure; callers surface it as a
//! date-parsing error, distinct from a type mismatch.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// A string failed the strict date/time literal grammar (or named an invalid
/// calendar instant).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid date/time literal: '{input}'")]
pub struct DateTimeParseError {
    pub input: String,
}

impl DateTimeParseError {
    fn new(input: &str) -> Self {
        Self {
            input: input.to_string(),
        }
    }
}

fn digits(bytes: &[u8]) -> Option<u32> {
    let mut n = 0u32;
    for &b in bytes {
        if !b.is_ascii_digit() {
            return None;
        }
        n = n * 10 + u32::from(b - b'0');
    }
    Some(n)
}

/// Parses `YYYY-MM-DD[THH:MM:SS[.fff]][Z]`.
///
/// Returns the parsed instant (midnight when no time component was present)
/// and whether a time component was present.
pub fn parse_date_or_datetime(s: &str) -> Result<(NaiveDateTime, bool), DateTimeParseError> {
    let err = || DateTimeParseError::new(s);
    let bytes = s.as_bytes();
    if bytes.len() < 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return Err(err());
    }
    let year = digits(&bytes[0..4]).ok_or_else(err)?;
    let month = digits(&bytes[5..7]).ok_or_else(err)?;
    let day = digits(&bytes[8..10]).ok_or_else(err)?;
    let date = NaiveDate::from_ymd_opt(year as i32, month, day).ok_or_else(err)?;

    let rest = &bytes[10..];
    if rest.is_empty() {
        return Ok((date.and_time(NaiveTime::MIN), false));
    }
    if rest[0] != b'T' {
        return Err(err());
    }
    let time = parse_time_component(&rest[1..]).ok_or_else(err)?;
    Ok((date.and_time(time), true))
}

/// Parses exactly `HH:MM:SS.fff` (no `Z`, no shorter forms).
pub fn parse_time(s: &str) -> Result<NaiveTime, DateTimeParseError> {
    let bytes = s.as_bytes();
    if bytes.len() != 12 || bytes[8] != b'.' {
        return Err(DateTimeParseError::new(s));
    }
    hms(&bytes[0..8])
        .and_then(|(h, m, sec)| {
            let milli = digits(&bytes[9..12])?;
            NaiveTime::from_hms_milli_opt(h, m, sec, milli)
        })
        .ok_or_else(|| DateTimeParseError::new(s))
}

fn hms(bytes: &[u8]) -> Option<(u32, u32, u32)> {
    if bytes.len() != 8 || bytes[2] != b':' || bytes[5] != b':' {
        return None;
    }
    Some((
        digits(&bytes[0..2])?,
        digits(&bytes[3..5])?,
        digits(&bytes[6..8])?,
    ))
}

/// `HH:MM:SS`, optional `.fff`, optional trailing `Z`. No trailing garbage.
fn parse_time_component(bytes: &[u8]) -> Option<NaiveTime> {
    if bytes.len() < 8 {
        return None;
    }
    let (h, m, s) = hms(&bytes[0..8])?;
    let mut rest = &bytes[8..];
    let milli = if rest.first() == Some(&b'.') {
        if rest.len() < 4 {
            return None;
        }
        let f = digits(&rest[1..4])?;
        rest = &rest[4..];
        f
    } else {
        0
    };
    match rest {
        [] | [b'Z'] => NaiveTime::from_hms_milli_opt(h, m, s, milli),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn date_only_parses_to_midnight() {
        let (dt, has_time) = parse_date_or_datetime("2015-01-01").unwrap();
        assert_eq!(dt, NaiveDate::from_ymd_opt(2015, 1, 1).unwrap().and_time(NaiveTime::MIN));
        assert!(!has_time);
    }

    #[test]
    fn datetime_with_zulu_parses() {
        let (dt, has_time) = parse_date_or_datetime("2015-01-01T00:00:00Z").unwrap();
        assert_eq!(
            dt,
            NaiveDate::from_ymd_opt(2015, 1, 1).unwrap().and_time(NaiveTime::MIN)
        );
        assert!(has_time);
    }

    #[test]
    fn datetime_with_millis_parses() {
        let (dt, _) = parse_date_or_datetime("2021-06-30T23:59:58.123Z").unwrap();
        assert_eq!(
            dt,
            NaiveDate::from_ymd_opt(2021, 6, 30)
                .unwrap()
                .and_hms_milli_opt(23, 59, 58, 123)
                .unwrap()
        );
    }

    #[test]
    fn calendar_invalid_date_is_rejected() {
        assert!(parse_date_or_datetime("2015-13-40").is_err());
        assert!(parse_date_or_datetime("2015-02-30").is_err());
    }

    #[test]
    fn grammar_deviations_are_rejected() {
        for s in [
            "2015-1-01",
            "2015/01/01",
            "2015-01-01 00:00:00",
            "2015-01-01T00:00",
            "2015-01-01T00:00:00.12",
            "2015-01-01T00:00:00.1234",
            "2015-01-01T00:00:00Zx",
            "2015-01-01T25:00:00",
        ] {
            assert!(parse_date_or_datetime(s).is_err(), "accepted {s:?}");
        }
    }

    #[test]
    fn time_requires_exact_shape() {
        assert_eq!(
            parse_time("12:34:56.789").unwrap(),
            NaiveTime::from_hms_milli_opt(12, 34, 56, 789).unwrap()
        );
        for s in ["12:34:56", "12:34:56.7", "12:34:56.789Z", "99:34:56.789"] {
            assert!(parse_time(s).is_err(), "accepted {s:?}");
        }
    }
}
