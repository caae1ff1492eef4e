//! Date and time window handling for slots
//!
//! Slots carry a calendar date plus HH:MM start/end times interpreted as
//! local wall-clock time. Dates arrive from clients as `YYYY-MM-DD` or
//! `DD-MM-YYYY`; ISO is always tried first, which leaves `2025-03-04`
//! reading as the 4th of March.

use chrono::{NaiveDate, NaiveTime};

use crate::error::{Error, Result};

/// Minimum lead time for a slot starting today, in minutes
pub const SAME_DAY_LEAD_MINUTES: i64 = 60;

/// Parse a slot date, accepting `YYYY-MM-DD` first, then `DD-MM-YYYY`
pub fn parse_slot_date(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%d-%m-%Y"))
        .map_err(|_| Error::InvalidInput(format!("Unparseable date: {}", input)))
}

/// Parse a strict 24-hour `HH:MM` time
pub fn parse_slot_time(input: &str) -> Result<NaiveTime> {
    let bytes = input.as_bytes();

    // chrono's %H accepts single-digit hours; clients must send HH:MM
    let well_formed = bytes.len() == 5
        && bytes[2] == b':'
        && bytes[0].is_ascii_digit()
        && bytes[1].is_ascii_digit()
        && bytes[3].is_ascii_digit()
        && bytes[4].is_ascii_digit();

    if !well_formed {
        return Err(Error::InvalidFormat(format!(
            "Expected HH:MM, got: {}",
            input
        )));
    }

    NaiveTime::parse_from_str(input, "%H:%M")
        .map_err(|_| Error::InvalidFormat(format!("Invalid time: {}", input)))
}

/// Half-open interval overlap test over [start, end)
///
/// Back-to-back windows (one ending exactly when the next starts)
/// do not overlap.
pub fn windows_overlap(
    a_start: NaiveTime,
    a_end: NaiveTime,
    b_start: NaiveTime,
    b_end: NaiveTime,
) -> bool {
    a_start < b_end && a_end > b_start
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_parse_iso_date() {
        let date = parse_slot_date("2026-09-15").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 9, 15).unwrap());
    }

    #[test]
    fn test_parse_day_first_date() {
        let date = parse_slot_date("15-09-2026").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 9, 15).unwrap());
    }

    #[test]
    fn test_iso_wins_when_ambiguous() {
        // Both readings are valid; ISO takes priority, so this is April 3rd
        let date = parse_slot_date("2025-03-04").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 3, 4).unwrap());
    }

    #[test]
    fn test_out_of_range_date_rejected() {
        assert!(matches!(
            parse_slot_date("2026-13-01"),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            parse_slot_date("32-01-2026"),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            parse_slot_date("not-a-date"),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_slot_time("09:30").unwrap(), time(9, 30));
        assert_eq!(parse_slot_time("23:59").unwrap(), time(23, 59));
    }

    #[test]
    fn test_loose_time_rejected() {
        // Single-digit hour and seconds both fail the strict format
        assert!(matches!(
            parse_slot_time("9:30"),
            Err(Error::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_slot_time("09:30:00"),
            Err(Error::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_slot_time("25:00"),
            Err(Error::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_slot_time("10:61"),
            Err(Error::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_overlap() {
        // 10:00-10:30 vs 10:15-10:45 overlap
        assert!(windows_overlap(
            time(10, 15),
            time(10, 45),
            time(10, 0),
            time(10, 30)
        ));
        // Back-to-back windows do not
        assert!(!windows_overlap(
            time(10, 30),
            time(11, 0),
            time(10, 0),
            time(10, 30)
        ));
        // Containment does
        assert!(windows_overlap(
            time(10, 5),
            time(10, 10),
            time(10, 0),
            time(10, 30)
        ));
    }
}
