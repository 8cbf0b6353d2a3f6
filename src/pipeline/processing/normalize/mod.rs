//! Field-level parsers turning raw cell text into typed, constrained values.
//!
//! Every function here is pure and returns `None` when the value cannot be
//! recovered; the cleaners decide whether a `None` drops the row.

use chrono::NaiveDateTime;

use crate::constants::DEFAULT_TIMESTAMP_FORMAT;
use crate::domain::ReviewScore;

/// Parses timestamps with a fixed, configurable format
#[derive(Debug, Clone)]
pub struct FieldNormalizer {
    pub timestamp_format: String,
}

impl Default for FieldNormalizer {
    fn default() -> Self {
        Self {
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }
}

impl FieldNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timestamp_format(format: &str) -> Self {
        Self {
            timestamp_format: format.to_string(),
        }
    }

    pub fn timestamp(&self, raw: Option<&str>) -> Option<NaiveDateTime> {
        raw.and_then(|value| parse_timestamp(value, &self.timestamp_format))
    }
}

/// Parse a timestamp in exactly `format`; anything else is rejected.
pub fn parse_timestamp(raw: &str, format: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), format).ok()
}

/// Recover a review score from noisy input.
///
/// The first character in `1..=5` wins, wherever it appears in the text, so
/// `"score: 4!"` yields 4 and `"10"` yields 1. Text without such a digit is
/// not a score.
pub fn parse_score(raw: &str) -> Option<ReviewScore> {
    raw.chars()
        .find(|c| ('1'..='5').contains(c))
        .and_then(|c| c.to_digit(10))
        .and_then(|digit| ReviewScore::new(digit as u8))
}

/// Parse a non-negative whole number. Integral float text such as `"2.0"`
/// is accepted because exported spreadsheets often write counts that way.
pub fn parse_count(raw: &str) -> Option<u32> {
    let value = raw.trim();
    if let Ok(count) = value.parse::<u32>() {
        return Some(count);
    }
    let float = value.parse::<f64>().ok()?;
    if float.is_finite() && float.fract() == 0.0 && float >= 0.0 && float <= u32::MAX as f64 {
        Some(float as u32)
    } else {
        None
    }
}

/// Parse a signed whole number, with the same tolerance for `"2.0"` as
/// [`parse_count`].
pub fn parse_integer(raw: &str) -> Option<i64> {
    let value = raw.trim();
    if let Ok(number) = value.parse::<i64>() {
        return Some(number);
    }
    let float = value.parse::<f64>().ok()?;
    if float.is_finite() && float.fract() == 0.0 && float.abs() <= i64::MAX as f64 {
        Some(float as i64)
    } else {
        None
    }
}

/// Parse a decimal amount, accepting a comma as the decimal separator.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let value = raw.trim();
    let parsed = if value.contains('.') {
        value.parse::<f64>()
    } else {
        value.replace(',', ".").parse::<f64>()
    };
    parsed.ok().filter(|v| v.is_finite())
}

/// Trim text; blank text is missing.
pub fn clean_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_timestamp_fixed_format() {
        let parsed = parse_timestamp("03/01/2021 10:00", DEFAULT_TIMESTAMP_FORMAT).unwrap();
        let expected = NaiveDate::from_ymd_opt(2021, 1, 3)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_parse_timestamp_rejects_other_formats() {
        assert!(parse_timestamp("2021-01-03 10:00", DEFAULT_TIMESTAMP_FORMAT).is_none());
        assert!(parse_timestamp("31/02/2021 10:00", DEFAULT_TIMESTAMP_FORMAT).is_none());
        assert!(parse_timestamp("not a date", DEFAULT_TIMESTAMP_FORMAT).is_none());
    }

    #[test]
    fn test_field_normalizer_custom_format() {
        let normalizer = FieldNormalizer::with_timestamp_format("%Y-%m-%d %H:%M:%S");
        assert!(normalizer.timestamp(Some("2018-10-02 10:56:33")).is_some());
        assert!(normalizer.timestamp(Some("02/10/2018 10:56")).is_none());
        assert!(normalizer.timestamp(None).is_none());
    }

    #[test]
    fn test_parse_score_mines_first_valid_digit() {
        assert_eq!(parse_score("score: 4!").map(|s| s.value()), Some(4));
        assert_eq!(parse_score("5").map(|s| s.value()), Some(5));
        assert_eq!(parse_score("4.0").map(|s| s.value()), Some(4));
        assert_eq!(parse_score("[[3]]").map(|s| s.value()), Some(3));
        assert_eq!(parse_score("10").map(|s| s.value()), Some(1));
        assert_eq!(parse_score("0 then 7, then 2").map(|s| s.value()), Some(2));
    }

    #[test]
    fn test_parse_score_rejects_text_without_digit() {
        assert!(parse_score("n/a").is_none());
        assert!(parse_score("").is_none());
        assert!(parse_score("0").is_none());
        assert!(parse_score("9876").is_none());
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("3"), Some(3));
        assert_eq!(parse_count(" 2.0 "), Some(2));
        assert_eq!(parse_count("0"), Some(0));
        assert_eq!(parse_count("1.5"), None);
        assert_eq!(parse_count("-1"), None);
        assert_eq!(parse_count("two"), None);
    }

    #[test]
    fn test_parse_integer_keeps_zero_and_negatives() {
        assert_eq!(parse_integer("0"), Some(0));
        assert_eq!(parse_integer("-1"), Some(-1));
        assert_eq!(parse_integer("3.0"), Some(3));
        assert_eq!(parse_integer("1.5"), None);
        assert_eq!(parse_integer(""), None);
        assert_eq!(parse_integer("two"), None);
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("58.90"), Some(58.9));
        assert_eq!(parse_decimal("13,29"), Some(13.29));
        assert_eq!(parse_decimal("abc"), None);
        assert_eq!(parse_decimal("NaN"), None);
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text(Some("  boleto ")), Some("boleto".to_string()));
        assert_eq!(clean_text(Some("   ")), None);
        assert_eq!(clean_text(None), None);
    }
}
