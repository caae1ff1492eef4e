//! Availability slot storage operations

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{
    date_to_db, parse_date, parse_datetime, parse_time, parse_uuid, slot_status_from_str,
    time_to_db, OptionalExt,
};
use crate::error::Result;
use crate::models::{AvailabilitySlot, SlotStatus, SlotSummary};

const SLOT_COLUMNS: &str = "id, mentor_id, slot_date, start_time, end_time, \
     max_participants, description, status, created_at";

fn slot_from_row(row: &Row<'_>) -> rusqlite::Result<AvailabilitySlot> {
    Ok(AvailabilitySlot {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        mentor_id: parse_uuid(&row.get::<_, String>(1)?)?,
        date: parse_date(&row.get::<_, String>(2)?)?,
        start_time: parse_time(&row.get::<_, String>(3)?)?,
        end_time: parse_time(&row.get::<_, String>(4)?)?,
        max_participants: row.get(5)?,
        description: row.get(6)?,
        status: slot_status_from_str(&row.get::<_, String>(7)?),
        created_at: parse_datetime(&row.get::<_, String>(8)?)?,
    })
}

pub struct SlotStore<'a> {
    conn: &'a Connection,
}

impl<'a> SlotStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a new slot
    #[instrument(skip(self, slot), fields(slot_id = %slot.id, mentor_id = %slot.mentor_id))]
    pub fn create(&self, slot: &AvailabilitySlot) -> Result<()> {
        self.conn.execute(
            "INSERT INTO slots (id, mentor_id, slot_date, start_time, end_time,
                                max_participants, description, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                slot.id.to_string(),
                slot.mentor_id.to_string(),
                date_to_db(slot.date),
                time_to_db(slot.start_time),
                time_to_db(slot.end_time),
                slot.max_participants,
                slot.description,
                slot.status.as_str(),
                slot.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Find slot by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<AvailabilitySlot>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {SLOT_COLUMNS} FROM slots WHERE id = ?1"))?;

        let slot = stmt
            .query_row(params![id.to_string()], slot_from_row)
            .optional()?;

        Ok(slot)
    }

    /// Update a slot's mutable fields
    #[instrument(skip(self, slot), fields(slot_id = %slot.id))]
    pub fn update(&self, slot: &AvailabilitySlot) -> Result<()> {
        self.conn.execute(
            "UPDATE slots SET slot_date = ?1, start_time = ?2, end_time = ?3,
                              max_participants = ?4, description = ?5, status = ?6
             WHERE id = ?7",
            params![
                date_to_db(slot.date),
                time_to_db(slot.start_time),
                time_to_db(slot.end_time),
                slot.max_participants,
                slot.description,
                slot.status.as_str(),
                slot.id.to_string(),
            ],
        )?;
        Ok(())
    }

    /// Update only the status of a slot
    #[instrument(skip(self))]
    pub fn update_status(&self, slot_id: Uuid, status: SlotStatus) -> Result<()> {
        self.conn.execute(
            "UPDATE slots SET status = ?1 WHERE id = ?2",
            params![status.as_str(), slot_id.to_string()],
        )?;
        Ok(())
    }

    /// Delete a slot (bookings and waiting list rows cascade)
    #[instrument(skip(self))]
    pub fn delete(&self, slot_id: Uuid) -> Result<()> {
        self.conn.execute(
            "DELETE FROM slots WHERE id = ?1",
            params![slot_id.to_string()],
        )?;
        Ok(())
    }

    /// Non-terminal slots for a mentor on one date, for overlap checks
    #[instrument(skip(self))]
    pub fn list_active_on_date(
        &self,
        mentor_id: Uuid,
        date: chrono::NaiveDate,
    ) -> Result<Vec<AvailabilitySlot>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SLOT_COLUMNS} FROM slots
             WHERE mentor_id = ?1 AND slot_date = ?2
               AND status IN ('available', 'full')
             ORDER BY start_time"
        ))?;

        let slots = stmt
            .query_map(
                params![mentor_id.to_string(), date_to_db(date)],
                slot_from_row,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(slots)
    }

    /// Upcoming non-terminal slots for a mentor with live booked counts
    ///
    /// "Upcoming" means the window has not ended as of `now`. Date and
    /// time columns compare lexicographically in their stored formats.
    #[instrument(skip(self))]
    pub fn list_upcoming_for_mentor(
        &self,
        mentor_id: Uuid,
        now: NaiveDateTime,
    ) -> Result<Vec<SlotSummary>> {
        let today = date_to_db(now.date());
        let time_now = time_to_db(now.time());

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SLOT_COLUMNS},
                    (SELECT COUNT(*) FROM bookings b
                      WHERE b.slot_id = slots.id AND b.status = 'confirmed')
             FROM slots
             WHERE mentor_id = ?1
               AND status IN ('available', 'full')
               AND (slot_date > ?2 OR (slot_date = ?2 AND end_time > ?3))
             ORDER BY slot_date, start_time"
        ))?;

        let summaries = stmt
            .query_map(params![mentor_id.to_string(), today, time_now], |row| {
                Ok(SlotSummary {
                    slot: slot_from_row(row)?,
                    current_booked: row.get(9)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(summaries)
    }

    /// Non-terminal slots whose window has ended as of `now`
    #[instrument(skip(self))]
    pub fn list_expired(&self, now: NaiveDateTime) -> Result<Vec<AvailabilitySlot>> {
        let today = date_to_db(now.date());
        let time_now = time_to_db(now.time());

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SLOT_COLUMNS} FROM slots
             WHERE status IN ('available', 'full')
               AND (slot_date < ?1 OR (slot_date = ?1 AND end_time <= ?2))
             ORDER BY slot_date, end_time"
        ))?;

        let slots = stmt
            .query_map(params![today, time_now], slot_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(slots)
    }

    /// Count confirmed bookings for a slot
    #[instrument(skip(self))]
    pub fn confirmed_count(&self, slot_id: Uuid) -> Result<u64> {
        let count: u64 = self.conn.query_row(
            "SELECT COUNT(*) FROM bookings WHERE slot_id = ?1 AND status = 'confirmed'",
            params![slot_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
