//! Storage repository traits
//!
//! These traits define the storage interface, allowing for different
//! implementations (SQLite, mock, future document store backend).

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{AvailabilitySlot, Booking, SlotStatus, SlotSummary, WaitingListEntry};

/// Slot repository operations
pub trait SlotRepository {
    /// Create a new slot
    fn create_slot(&self, slot: &AvailabilitySlot) -> Result<()>;

    /// Find slot by ID
    fn find_slot_by_id(&self, id: Uuid) -> Result<Option<AvailabilitySlot>>;

    /// Update a slot's mutable fields
    fn update_slot(&self, slot: &AvailabilitySlot) -> Result<()>;

    /// Update only the status of a slot
    fn update_slot_status(&self, slot_id: Uuid, status: SlotStatus) -> Result<()>;

    /// Delete a slot, cascading its bookings and queue entries
    fn delete_slot(&self, slot_id: Uuid) -> Result<()>;

    /// Non-terminal slots for a mentor on one date
    fn list_active_slots_on_date(
        &self,
        mentor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<AvailabilitySlot>>;

    /// Upcoming slots for a mentor with live booked counts
    fn list_upcoming_slots_for_mentor(
        &self,
        mentor_id: Uuid,
        now: NaiveDateTime,
    ) -> Result<Vec<SlotSummary>>;

    /// Non-terminal slots whose window has ended
    fn list_expired_slots(&self, now: NaiveDateTime) -> Result<Vec<AvailabilitySlot>>;

    /// Count confirmed bookings for a slot
    fn confirmed_booking_count(&self, slot_id: Uuid) -> Result<u64>;
}

/// Booking repository operations
pub trait BookingRepository {
    /// Create a new booking
    fn create_booking(&self, booking: &Booking) -> Result<()>;

    /// Find booking by ID
    fn find_booking_by_id(&self, id: Uuid) -> Result<Option<Booking>>;

    /// Find a student's confirmed booking on a slot
    fn find_confirmed_booking(&self, slot_id: Uuid, student_id: Uuid)
        -> Result<Option<Booking>>;

    /// Mark a booking cancelled
    fn cancel_booking(&self, booking_id: Uuid, cancelled_at: DateTime<Utc>) -> Result<()>;

    /// A student's confirmed, not-yet-ended bookings
    fn list_upcoming_bookings_for_student(
        &self,
        student_id: Uuid,
        now: NaiveDateTime,
    ) -> Result<Vec<Booking>>;
}

/// Waiting list repository operations
pub trait WaitlistRepository {
    /// Enqueue a student
    fn create_waitlist_entry(&self, entry: &WaitingListEntry) -> Result<()>;

    /// Find a student's queue entry for a slot
    fn find_waitlist_entry(
        &self,
        slot_id: Uuid,
        student_id: Uuid,
    ) -> Result<Option<WaitingListEntry>>;

    /// Remove a queue entry
    fn delete_waitlist_entry(&self, entry_id: Uuid) -> Result<()>;

    /// Oldest queue entry for a slot
    fn waitlist_front(&self, slot_id: Uuid) -> Result<Option<WaitingListEntry>>;

    /// Queue length for a slot
    fn waitlist_count(&self, slot_id: Uuid) -> Result<u64>;

    /// 1-indexed queue position for an enqueue time
    fn waitlist_position(&self, slot_id: Uuid, joined_at: DateTime<Utc>) -> Result<u64>;
}

/// Combined storage interface
///
/// Provides access to all repository operations.
/// Implementations may be backed by SQLite, mocks, or a document store.
pub trait Storage: SlotRepository + BookingRepository + WaitlistRepository {}

// Blanket implementation: any type implementing all traits implements Storage
impl<T> Storage for T where T: SlotRepository + BookingRepository + WaitlistRepository {}
