//! Waiting list storage operations
//!
//! Queue order is joined_at ascending with rowid as the tiebreak, so
//! entries created within the same timestamp still pop in insertion order.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{parse_datetime, parse_uuid, OptionalExt};
use crate::error::Result;
use crate::models::WaitingListEntry;

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<WaitingListEntry> {
    Ok(WaitingListEntry {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        slot_id: parse_uuid(&row.get::<_, String>(1)?)?,
        student_id: parse_uuid(&row.get::<_, String>(2)?)?,
        joined_at: parse_datetime(&row.get::<_, String>(3)?)?,
    })
}

pub struct WaitlistStore<'a> {
    conn: &'a Connection,
}

impl<'a> WaitlistStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Enqueue a student
    #[instrument(skip(self, entry), fields(slot_id = %entry.slot_id, student_id = %entry.student_id))]
    pub fn create(&self, entry: &WaitingListEntry) -> Result<()> {
        self.conn.execute(
            "INSERT INTO waiting_list (id, slot_id, student_id, joined_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.id.to_string(),
                entry.slot_id.to_string(),
                entry.student_id.to_string(),
                entry.joined_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Find a student's entry on a slot's queue
    #[instrument(skip(self))]
    pub fn find(&self, slot_id: Uuid, student_id: Uuid) -> Result<Option<WaitingListEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, slot_id, student_id, joined_at FROM waiting_list
             WHERE slot_id = ?1 AND student_id = ?2",
        )?;

        let entry = stmt
            .query_row(
                params![slot_id.to_string(), student_id.to_string()],
                entry_from_row,
            )
            .optional()?;

        Ok(entry)
    }

    /// Remove an entry by id
    #[instrument(skip(self))]
    pub fn delete(&self, entry_id: Uuid) -> Result<()> {
        self.conn.execute(
            "DELETE FROM waiting_list WHERE id = ?1",
            params![entry_id.to_string()],
        )?;
        Ok(())
    }

    /// Oldest entry on a slot's queue, if any
    #[instrument(skip(self))]
    pub fn front_of_queue(&self, slot_id: Uuid) -> Result<Option<WaitingListEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, slot_id, student_id, joined_at FROM waiting_list
             WHERE slot_id = ?1
             ORDER BY joined_at, rowid
             LIMIT 1",
        )?;

        let entry = stmt
            .query_row(params![slot_id.to_string()], entry_from_row)
            .optional()?;

        Ok(entry)
    }

    /// Queue length for a slot
    #[instrument(skip(self))]
    pub fn count_for_slot(&self, slot_id: Uuid) -> Result<u64> {
        let count: u64 = self.conn.query_row(
            "SELECT COUNT(*) FROM waiting_list WHERE slot_id = ?1",
            params![slot_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 1-indexed queue position: entries strictly earlier plus one
    #[instrument(skip(self))]
    pub fn position(&self, slot_id: Uuid, joined_at: DateTime<Utc>) -> Result<u64> {
        let earlier: u64 = self.conn.query_row(
            "SELECT COUNT(*) FROM waiting_list WHERE slot_id = ?1 AND joined_at < ?2",
            params![slot_id.to_string(), joined_at.to_rfc3339()],
            |row| row.get(0),
        )?;
        Ok(earlier + 1)
    }
}
