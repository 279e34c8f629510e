//! Calendar-date validation
//!
//! Dates travel through the system as `YYYY-MM-DD` strings. The format is
//! zero-padded, so lexical order equals chronological order and range
//! predicates can compare the strings directly.

use crate::DomainError;
use chrono::NaiveDate;

/// Check that `value` is a strict `YYYY-MM-DD` calendar date
///
/// Exactly ten ASCII characters, digits in every position except the two
/// hyphens, and the triple must name a real day (no `2023-02-30`). Time
/// components, timezones and surrounding whitespace are rejected.
///
/// # Examples
///
/// ```
/// use juris_domain::is_calendar_date;
///
/// assert!(is_calendar_date("2023-09-07"));
/// assert!(!is_calendar_date("2023-09-07T00:00:00Z"));
/// assert!(!is_calendar_date("7. september 2023"));
/// ```
pub fn is_calendar_date(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != 10 {
        return false;
    }

    let shape_ok = bytes.iter().enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        _ => b.is_ascii_digit(),
    });

    shape_ok && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

/// Validate a named date field, producing a [`DomainError::InvalidDate`] on failure
pub fn validate_calendar_date(field: &'static str, value: &str) -> Result<(), DomainError> {
    if is_calendar_date(value) {
        Ok(())
    } else {
        Err(DomainError::InvalidDate {
            field,
            value: value.to_string(),
        })
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: every real day formatted as %Y-%m-%d is accepted
        #[test]
        fn test_formatted_days_are_accepted(days in 0i64..(400 * 366)) {
            let base = NaiveDate::from_ymd_opt(1800, 1, 1).unwrap();
            let date = base + chrono::Duration::days(days);
            let formatted = date.format("%Y-%m-%d").to_string();
            prop_assert!(is_calendar_date(&formatted));
        }

        /// Property: lexical order of valid dates equals chronological order
        #[test]
        fn test_lexical_order_is_chronological(a in 0i64..100_000, b in 0i64..100_000) {
            let base = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap();
            let da = base + chrono::Duration::days(a);
            let db = base + chrono::Duration::days(b);
            let sa = da.format("%Y-%m-%d").to_string();
            let sb = db.format("%Y-%m-%d").to_string();
            prop_assert_eq!(sa < sb, da < db);
        }

        /// Property: anything with a trailing time component is rejected
        #[test]
        fn test_time_suffix_rejected(h in 0u32..24, m in 0u32..60) {
            let value = format!("2023-09-07T{:02}:{:02}", h, m);
            prop_assert!(!is_calendar_date(&value));
        }
    }
}
