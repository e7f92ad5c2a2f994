//! Session timestamp handling
//!
//! Sessions are stamped with a local wall-clock date and time entered by the
//! operator in `DD.MM.YYYY HH:MM` form. No time zone is attached.

use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::debug;

/// chrono format string for session timestamps
pub const SESSION_TIMESTAMP_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Human-readable form of [`SESSION_TIMESTAMP_FORMAT`], used in prompts
pub const SESSION_TIMESTAMP_HINT: &str = "DD.MM.YYYY HH:MM";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid date format '{value}', expected DD.MM.YYYY HH:MM")]
pub struct InvalidDateFormat {
    pub value: String,
}

/// Parse a session timestamp such as `01.09.2024 10:00`.
///
/// Surrounding whitespace is ignored.
pub fn parse_session_timestamp(input: &str) -> Result<NaiveDateTime, InvalidDateFormat> {
    let trimmed = input.trim();
    NaiveDateTime::parse_from_str(trimmed, SESSION_TIMESTAMP_FORMAT).map_err(|e| {
        debug!(value = %trimmed, error = %e, "Rejected session timestamp");
        InvalidDateFormat {
            value: trimmed.to_string(),
        }
    })
}

/// Format a timestamp the way it appears inside a session id
pub fn format_session_timestamp(at: NaiveDateTime) -> String {
    at.format(SESSION_TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parse_valid_timestamp() {
        let at = parse_session_timestamp("01.09.2024 10:00").unwrap();
        assert_eq!(at.day(), 1);
        assert_eq!(at.month(), 9);
        assert_eq!(at.year(), 2024);
        assert_eq!(at.hour(), 10);
        assert_eq!(at.minute(), 0);
    }

    #[test]
    fn parse_trims_whitespace() {
        assert!(parse_session_timestamp("  15.02.2025 08:30 \n").is_ok());
    }

    #[test]
    fn reject_iso_dates() {
        let err = parse_session_timestamp("2024-09-01 10:00").unwrap_err();
        assert_eq!(err.value, "2024-09-01 10:00");
    }

    #[test]
    fn reject_impossible_dates() {
        assert!(parse_session_timestamp("31.02.2024 10:00").is_err());
        assert!(parse_session_timestamp("01.09.2024 25:00").is_err());
        assert!(parse_session_timestamp("").is_err());
    }

    #[test]
    fn format_round_trips() {
        let at = parse_session_timestamp("05.03.2024 07:09").unwrap();
        assert_eq!(format_session_timestamp(at), "05.03.2024 07:09");
    }
}
