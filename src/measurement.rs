//! # Measurement Normalization
//!
//! The gauge publishes its level as a locale-formatted decimal string in meters,
//! using a comma as the fractional separator (`"3,45"`). This module converts that
//! string into whole centimeters.
//!
//! ## Conversion Rules
//! - `,` is normalized to `.`; a plain `.` is accepted as well
//! - Digits beyond the second fractional place are truncated toward zero
//! - A string without separator is whole meters: `"345"` is `34500` cm
//! - Negative levels are rejected as a data quality anomaly
//!
//! The arithmetic runs on the decimal digits directly, so `"0,29"` yields `29`
//! instead of the `28` a float multiply would produce.

use crate::Measurement;
use thiserror::Error;

/// Reasons a raw level string could not be turned into a [`Measurement`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Nothing but whitespace was supplied
    #[error("empty level string")]
    Empty,

    /// The string is not a decimal number after separator normalization
    #[error("malformed level string: {0:?}")]
    Malformed(String),

    /// The number does not fit into the measurement range
    #[error("level out of range: {0:?}")]
    OutOfRange(String),

    /// The gauge reported a level below zero
    #[error("negative level: {0:?}")]
    Negative(String),
}

/// Convert a meter reading such as `"3,45"` into centimeters.
///
/// # Example
/// ```
/// use pegel_lib::measurement::{parse_level_cm, ParseError};
///
/// assert_eq!(parse_level_cm("3,45"), Ok(345));
/// assert_eq!(parse_level_cm("345"), Ok(34500));
/// assert!(matches!(parse_level_cm("n/a"), Err(ParseError::Malformed(_))));
/// ```
pub fn parse_level_cm(raw: &str) -> Result<Measurement, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }

    let normalized = trimmed.replace(',', ".");
    let malformed = || ParseError::Malformed(raw.to_string());

    let (negative, unsigned) = match normalized.as_bytes()[0] {
        b'-' => (true, &normalized[1..]),
        b'+' => (false, &normalized[1..]),
        _ => (false, normalized.as_str()),
    };

    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (unsigned, ""),
    };

    let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !is_digits(whole) || !is_digits(fraction) || (whole.is_empty() && fraction.is_empty()) {
        return Err(malformed());
    }

    let meters: Measurement = if whole.is_empty() {
        0
    } else {
        whole
            .parse()
            .map_err(|_| ParseError::OutOfRange(raw.to_string()))?
    };

    // First two fractional digits are centimeters, the rest is truncated
    let cm_digits = fraction.as_bytes().iter().take(2).chain(b"00").take(2);
    let fraction_cm = cm_digits.fold(0, |acc, b| acc * 10 + Measurement::from(b - b'0'));

    let cm = meters
        .checked_mul(100)
        .and_then(|v| v.checked_add(fraction_cm))
        .ok_or_else(|| ParseError::OutOfRange(raw.to_string()))?;

    if negative && cm != 0 {
        return Err(ParseError::Negative(raw.to_string()));
    }

    Ok(cm)
}

/// Format centimeters as meters with two decimals, e.g. `345` as `"3.45"`.
pub fn format_meters(cm: Measurement) -> String {
    let sign = if cm < 0 { "-" } else { "" };
    let abs = cm.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_decimal_is_converted_to_cm() {
        assert_eq!(parse_level_cm("3,45"), Ok(345));
        assert_eq!(parse_level_cm("0,29"), Ok(29));
        assert_eq!(parse_level_cm("10,5"), Ok(1050));
    }

    #[test]
    fn value_without_separator_is_whole_meters() {
        // Documented behavior: the gauge never omits the separator, so a bare
        // integer is read as meters, not centimeters.
        assert_eq!(parse_level_cm("345"), Ok(34500));
    }

    #[test]
    fn extra_fraction_digits_are_truncated() {
        assert_eq!(parse_level_cm("3,459"), Ok(345));
        assert_eq!(parse_level_cm("3,4599999"), Ok(345));
    }

    #[test]
    fn dot_separator_and_whitespace_are_accepted() {
        assert_eq!(parse_level_cm(" 2.07\n"), Ok(207));
        assert_eq!(parse_level_cm(",5"), Ok(50));
        assert_eq!(parse_level_cm("4,"), Ok(400));
        assert_eq!(parse_level_cm("+1,00"), Ok(100));
    }

    #[test]
    fn malformed_strings_are_rejected() {
        assert_eq!(parse_level_cm(""), Err(ParseError::Empty));
        assert_eq!(parse_level_cm("   "), Err(ParseError::Empty));
        for raw in ["abc", "3,4,5", "3.45m", ",", "-", "1e3", "3 45"] {
            assert!(
                matches!(parse_level_cm(raw), Err(ParseError::Malformed(_))),
                "{raw:?} should be malformed"
            );
        }
    }

    #[test]
    fn negative_levels_are_an_anomaly() {
        assert_eq!(
            parse_level_cm("-0,50"),
            Err(ParseError::Negative("-0,50".to_string()))
        );
        assert_eq!(parse_level_cm("-0,00"), Ok(0));
    }

    #[test]
    fn huge_values_are_out_of_range() {
        assert!(matches!(
            parse_level_cm("99999999999999999999,00"),
            Err(ParseError::OutOfRange(_))
        ));
    }

    #[test]
    fn meters_formatting() {
        assert_eq!(format_meters(345), "3.45");
        assert_eq!(format_meters(7), "0.07");
        assert_eq!(format_meters(34500), "345.00");
        assert_eq!(format_meters(-50), "-0.50");
    }
}
