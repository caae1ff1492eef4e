//! Booking storage operations

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{
    booking_status_from_str, date_to_db, parse_datetime, parse_datetime_opt, parse_uuid,
    time_to_db, OptionalExt,
};
use crate::error::Result;
use crate::models::{Booking, BookingStatus};

const BOOKING_COLUMNS: &str =
    "id, slot_id, student_id, mentor_id, status, booked_at, cancelled_at";

fn booking_from_row(row: &Row<'_>) -> rusqlite::Result<Booking> {
    Ok(Booking {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        slot_id: parse_uuid(&row.get::<_, String>(1)?)?,
        student_id: parse_uuid(&row.get::<_, String>(2)?)?,
        mentor_id: parse_uuid(&row.get::<_, String>(3)?)?,
        status: booking_status_from_str(&row.get::<_, String>(4)?),
        booked_at: parse_datetime(&row.get::<_, String>(5)?)?,
        cancelled_at: parse_datetime_opt(row.get::<_, Option<String>>(6)?)?,
    })
}

pub struct BookingStore<'a> {
    conn: &'a Connection,
}

impl<'a> BookingStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a new booking
    #[instrument(skip(self, booking), fields(booking_id = %booking.id, slot_id = %booking.slot_id))]
    pub fn create(&self, booking: &Booking) -> Result<()> {
        self.conn.execute(
            "INSERT INTO bookings (id, slot_id, student_id, mentor_id, status,
                                   booked_at, cancelled_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                booking.id.to_string(),
                booking.slot_id.to_string(),
                booking.student_id.to_string(),
                booking.mentor_id.to_string(),
                booking.status.as_str(),
                booking.booked_at.to_rfc3339(),
                booking.cancelled_at.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// Find booking by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"
        ))?;

        let booking = stmt
            .query_row(params![id.to_string()], booking_from_row)
            .optional()?;

        Ok(booking)
    }

    /// Find a student's confirmed booking on a slot, if any
    #[instrument(skip(self))]
    pub fn find_confirmed(&self, slot_id: Uuid, student_id: Uuid) -> Result<Option<Booking>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings
             WHERE slot_id = ?1 AND student_id = ?2 AND status = 'confirmed'"
        ))?;

        let booking = stmt
            .query_row(
                params![slot_id.to_string(), student_id.to_string()],
                booking_from_row,
            )
            .optional()?;

        Ok(booking)
    }

    /// Mark a booking cancelled
    #[instrument(skip(self))]
    pub fn mark_cancelled(&self, booking_id: Uuid, cancelled_at: DateTime<Utc>) -> Result<()> {
        self.conn.execute(
            "UPDATE bookings SET status = ?1, cancelled_at = ?2 WHERE id = ?3",
            params![
                BookingStatus::Cancelled.as_str(),
                cancelled_at.to_rfc3339(),
                booking_id.to_string(),
            ],
        )?;
        Ok(())
    }

    /// A student's confirmed bookings whose slot window has not ended
    #[instrument(skip(self))]
    pub fn list_upcoming_for_student(
        &self,
        student_id: Uuid,
        now: NaiveDateTime,
    ) -> Result<Vec<Booking>> {
        let today = date_to_db(now.date());
        let time_now = time_to_db(now.time());

        let mut stmt = self.conn.prepare(
            "SELECT b.id, b.slot_id, b.student_id, b.mentor_id, b.status,
                    b.booked_at, b.cancelled_at
             FROM bookings b
             INNER JOIN slots s ON s.id = b.slot_id
             WHERE b.student_id = ?1 AND b.status = 'confirmed'
               AND (s.slot_date > ?2 OR (s.slot_date = ?2 AND s.end_time > ?3))
             ORDER BY s.slot_date, s.start_time",
        )?;

        let bookings = stmt
            .query_map(
                params![student_id.to_string(), today, time_now],
                booking_from_row,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(bookings)
    }
}
