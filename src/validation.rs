//! Validation helpers for terminal input.

use chrono::{Datelike, Months, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

/// Validate date string has format YYYY-MM-DD
pub fn validate_date_format(date: &str) -> bool {
    if !DATE_RE.is_match(date) {
        return false;
    }
    if let Ok(naive_date) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        let year = naive_date.year();
        return (2000..=2100).contains(&year);
    }
    false
}

/// The picker only offers dates from today through one month out.
pub fn date_within_booking_window(date: NaiveDate, today: NaiveDate) -> bool {
    let limit = today.checked_add_months(Months::new(1)).unwrap_or(today);
    date >= today && date <= limit
}

/// Parses a picked date argument, enforcing the picker's window.
pub fn parse_picked_date(input: &str, today: NaiveDate) -> Result<NaiveDate, String> {
    if !validate_date_format(input) {
        return Err(format!("Invalid date '{}'. Please use YYYY-MM-DD format", input));
    }
    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|e| format!("Invalid date '{}': {}", input, e))?;
    if !date_within_booking_window(date, today) {
        return Err(format!(
            "Date {} is outside the booking window ({} through {})",
            date,
            today,
            today.checked_add_months(Months::new(1)).unwrap_or(today)
        ));
    }
    Ok(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("2024-01-05", true)]
    #[test_case("2024-1-05", false)]
    #[test_case("not-a-date", false)]
    #[test_case("2024-13-40", false)]
    #[test_case("1999-01-01", false)]
    fn date_format(input: &str, expected: bool) {
        assert_eq!(validate_date_format(input), expected);
    }

    #[test]
    fn booking_window_is_today_through_one_month() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();

        assert!(date_within_booking_window(today, today));
        assert!(date_within_booking_window(
            NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(),
            today
        ));
        assert!(!date_within_booking_window(
            NaiveDate::from_ymd_opt(2024, 2, 16).unwrap(),
            today
        ));
        assert!(!date_within_booking_window(
            NaiveDate::from_ymd_opt(2024, 1, 14).unwrap(),
            today
        ));
    }

    #[test]
    fn parse_rejects_out_of_window_dates() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert!(parse_picked_date("2024-03-01", today).is_err());
        assert_eq!(
            parse_picked_date("2024-01-20", today),
            Ok(NaiveDate::from_ymd_opt(2024, 1, 20).unwrap())
        );
    }
}
