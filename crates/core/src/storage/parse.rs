//! Database value parsing utilities
//!
//! Provides error-safe parsing of stored values.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rusqlite::Error as SqlError;
use uuid::Uuid;

use crate::models::{BookingStatus, SlotStatus};

fn conversion_error<E>(e: E) -> SqlError
where
    E: std::error::Error + Send + Sync + 'static,
{
    SqlError::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
}

/// Parse a UUID from a database string column
pub fn parse_uuid(s: &str) -> Result<Uuid, SqlError> {
    Uuid::parse_str(s).map_err(conversion_error)
}

/// Parse a DateTime from an RFC3339 string
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, SqlError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(conversion_error)
}

/// Parse an optional DateTime from an RFC3339 string
pub fn parse_datetime_opt(s: Option<String>) -> Result<Option<DateTime<Utc>>, SqlError> {
    s.map(|s| parse_datetime(&s)).transpose()
}

/// Parse a calendar date stored as `YYYY-MM-DD`
pub fn parse_date(s: &str) -> Result<NaiveDate, SqlError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(conversion_error)
}

/// Parse a time-of-day stored as `HH:MM`
pub fn parse_time(s: &str) -> Result<NaiveTime, SqlError> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(conversion_error)
}

/// Convert a status string to SlotStatus
pub fn slot_status_from_str(value: &str) -> SlotStatus {
    match value {
        "full" => SlotStatus::Full,
        "completed" => SlotStatus::Completed,
        "cancelled" => SlotStatus::Cancelled,
        _ => SlotStatus::Available,
    }
}

/// Convert a status string to BookingStatus
pub fn booking_status_from_str(value: &str) -> BookingStatus {
    match value {
        "pending" => BookingStatus::Pending,
        "cancelled" => BookingStatus::Cancelled,
        _ => BookingStatus::Confirmed,
    }
}

/// Encode a date for storage
pub fn date_to_db(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Encode a time-of-day for storage
pub fn time_to_db(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Extension trait for converting rusqlite Results to Option
pub trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, SqlError>;
}

impl<T> OptionalExt<T> for Result<T, SqlError> {
    fn optional(self) -> Result<Option<T>, SqlError> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(SqlError::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_roundtrip() {
        let date = NaiveDate::from_ymd_opt(2026, 9, 15).unwrap();
        assert_eq!(parse_date(&date_to_db(date)).unwrap(), date);
    }

    #[test]
    fn test_time_roundtrip() {
        let time = NaiveTime::from_hms_opt(9, 5, 0).unwrap();
        assert_eq!(time_to_db(time), "09:05");
        assert_eq!(parse_time("09:05").unwrap(), time);
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(slot_status_from_str("full"), SlotStatus::Full);
        assert_eq!(slot_status_from_str("available"), SlotStatus::Available);
        assert_eq!(
            booking_status_from_str("cancelled"),
            BookingStatus::Cancelled
        );
    }
}
