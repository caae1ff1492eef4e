//! SQLite storage layer for Campusloop

mod bookings;
mod migrations;
mod parse;
mod slots;
mod traits;
mod waitlist;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rusqlite::Connection;
use std::path::Path;
use tracing::instrument;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{AvailabilitySlot, Booking, SlotStatus, SlotSummary, WaitingListEntry};

pub use bookings::BookingStore;
pub use slots::SlotStore;
pub use traits::{BookingRepository, SlotRepository, Storage, WaitlistRepository};
pub use waitlist::WaitlistStore;

/// Main database handle
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Open in-memory database (for testing)
    #[instrument]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initialize database schema via migrations
    fn init(&self) -> Result<()> {
        migrations::run_migrations(&self.conn)?;
        Ok(())
    }

    /// Get current schema version
    pub fn schema_version(&self) -> u32 {
        self.conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap_or(0)
    }

    /// Get slot store
    pub fn slots(&self) -> SlotStore<'_> {
        SlotStore::new(&self.conn)
    }

    /// Get booking store
    pub fn bookings(&self) -> BookingStore<'_> {
        BookingStore::new(&self.conn)
    }

    /// Get waiting list store
    pub fn waitlist(&self) -> WaitlistStore<'_> {
        WaitlistStore::new(&self.conn)
    }

    /// Run a closure inside a single SQLite transaction.
    ///
    /// The closure receives a connection usable with the store types; the
    /// transaction commits only if the closure returns Ok, otherwise it
    /// rolls back on drop. Multi-step sequences (book, cancel-and-promote)
    /// go through here so their writes commit atomically.
    pub fn with_transaction<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T>,
    ) -> Result<T> {
        let tx = self.conn.unchecked_transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }
}

// Implement repository traits for Database
// This enables using Database through the trait interface

impl SlotRepository for Database {
    fn create_slot(&self, slot: &AvailabilitySlot) -> Result<()> {
        self.slots().create(slot)
    }

    fn find_slot_by_id(&self, id: Uuid) -> Result<Option<AvailabilitySlot>> {
        self.slots().find_by_id(id)
    }

    fn update_slot(&self, slot: &AvailabilitySlot) -> Result<()> {
        self.slots().update(slot)
    }

    fn update_slot_status(&self, slot_id: Uuid, status: SlotStatus) -> Result<()> {
        self.slots().update_status(slot_id, status)
    }

    fn delete_slot(&self, slot_id: Uuid) -> Result<()> {
        self.slots().delete(slot_id)
    }

    fn list_active_slots_on_date(
        &self,
        mentor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<AvailabilitySlot>> {
        self.slots().list_active_on_date(mentor_id, date)
    }

    fn list_upcoming_slots_for_mentor(
        &self,
        mentor_id: Uuid,
        now: NaiveDateTime,
    ) -> Result<Vec<SlotSummary>> {
        self.slots().list_upcoming_for_mentor(mentor_id, now)
    }

    fn list_expired_slots(&self, now: NaiveDateTime) -> Result<Vec<AvailabilitySlot>> {
        self.slots().list_expired(now)
    }

    fn confirmed_booking_count(&self, slot_id: Uuid) -> Result<u64> {
        self.slots().confirmed_count(slot_id)
    }
}

impl BookingRepository for Database {
    fn create_booking(&self, booking: &Booking) -> Result<()> {
        self.bookings().create(booking)
    }

    fn find_booking_by_id(&self, id: Uuid) -> Result<Option<Booking>> {
        self.bookings().find_by_id(id)
    }

    fn find_confirmed_booking(
        &self,
        slot_id: Uuid,
        student_id: Uuid,
    ) -> Result<Option<Booking>> {
        self.bookings().find_confirmed(slot_id, student_id)
    }

    fn cancel_booking(&self, booking_id: Uuid, cancelled_at: DateTime<Utc>) -> Result<()> {
        self.bookings().mark_cancelled(booking_id, cancelled_at)
    }

    fn list_upcoming_bookings_for_student(
        &self,
        student_id: Uuid,
        now: NaiveDateTime,
    ) -> Result<Vec<Booking>> {
        self.bookings().list_upcoming_for_student(student_id, now)
    }
}

impl WaitlistRepository for Database {
    fn create_waitlist_entry(&self, entry: &WaitingListEntry) -> Result<()> {
        self.waitlist().create(entry)
    }

    fn find_waitlist_entry(
        &self,
        slot_id: Uuid,
        student_id: Uuid,
    ) -> Result<Option<WaitingListEntry>> {
        self.waitlist().find(slot_id, student_id)
    }

    fn delete_waitlist_entry(&self, entry_id: Uuid) -> Result<()> {
        self.waitlist().delete(entry_id)
    }

    fn waitlist_front(&self, slot_id: Uuid) -> Result<Option<WaitingListEntry>> {
        self.waitlist().front_of_queue(slot_id)
    }

    fn waitlist_count(&self, slot_id: Uuid) -> Result<u64> {
        self.waitlist().count_for_slot(slot_id)
    }

    fn waitlist_position(&self, slot_id: Uuid, joined_at: DateTime<Utc>) -> Result<u64> {
        self.waitlist().position(slot_id, joined_at)
    }
}
