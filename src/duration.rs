//! Duration literals such as `"1h30m"` or `"250ms"`.

use crate::error::{Error, Result, USAGE_DURATION};
use std::time::Duration;

const NANOS_PER_UNIT: &[(&str, u128)] = &[
    ("ns", 1),
    ("us", 1_000),
    ("µs", 1_000),
    ("μs", 1_000),
    ("ms", 1_000_000),
    ("s", 1_000_000_000),
    ("m", 60_000_000_000),
    ("h", 3_600_000_000_000),
];

fn invalid(text: &str) -> Error {
    Error::literal(format!("invalid duration: {text:?}")).with_usage_text(USAGE_DURATION)
}

/// Splits a leading run of ASCII digits off `s`.
fn leading_digits(s: &str) -> (&str, &str) {
    let n = s.bytes().take_while(u8::is_ascii_digit).count();
    s.split_at(n)
}

/// Parses a duration string: a sequence of decimal numbers, each with an
/// optional fraction and a unit.
///
/// `"0"` needs no unit. A leading `-` is only accepted for zero durations;
/// negative values are range errors.
pub(crate) fn parse_duration(text: &str) -> Result<Duration> {
    let (negative, mut rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(invalid(text));
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let (whole, after) = leading_digits(rest);
        let (fraction, after) = match after.strip_prefix('.') {
            Some(tail) => match leading_digits(tail) {
                ("", _) => return Err(invalid(text)),
                split => split,
            },
            None => ("", after),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid(text));
        }

        let unit_len = after
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() || *c == '.')
            .map_or(after.len(), |(i, _)| i);
        let (unit, tail) = after.split_at(unit_len);
        let scale = NANOS_PER_UNIT
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, scale)| *scale)
            .ok_or_else(|| invalid(text))?;

        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid(text))?
        };
        let mut nanos = whole.checked_mul(scale).ok_or_else(|| overflow(text))?;
        let mut divisor: u128 = 1;
        let mut frac: u128 = 0;
        for d in fraction.bytes().take(18) {
            frac = frac * 10 + u128::from(d - b'0');
            divisor *= 10;
        }
        nanos += frac * scale / divisor;
        total = total.checked_add(nanos).ok_or_else(|| overflow(text))?;
        rest = tail;
    }

    if negative && total > 0 {
        return Err(Error::range(text, "duration (negative durations are not allowed)")
            .with_usage_text(USAGE_DURATION));
    }
    let secs = u64::try_from(total / 1_000_000_000).map_err(|_| overflow(text))?;
    let subsec = (total % 1_000_000_000) as u32;
    Ok(Duration::new(secs, subsec))
}

fn overflow(text: &str) -> Error {
    Error::range(text, "duration").with_usage_text(USAGE_DURATION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_units() {
        assert_eq!(parse_duration("300ms").unwrap(), Duration::from_millis(300));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("15µs").unwrap(), Duration::from_micros(15));
        assert_eq!(parse_duration("15μs").unwrap(), Duration::from_micros(15));
        assert_eq!(parse_duration("15us").unwrap(), Duration::from_micros(15));
        assert_eq!(parse_duration("7ns").unwrap(), Duration::from_nanos(7));
    }

    #[test]
    fn test_compound_and_fractional() {
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("1.5h").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("2m3.5s").unwrap(), Duration::from_millis(123_500));
        assert_eq!(parse_duration(".5s").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("+1s").unwrap(), Duration::from_secs(1));
    }

    #[test]
    fn test_zero() {
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
        assert_eq!(parse_duration("-0").unwrap(), Duration::ZERO);
        assert_eq!(parse_duration("-0s").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_invalid() {
        for bad in ["", "5", "1d", "h", "1.h", ".s", "1.", "ms5", "1h-2m", "-"] {
            assert!(parse_duration(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_negative_is_range_error() {
        let err = parse_duration("-5s").unwrap_err();
        assert!(err.is_range());
    }
}
