//! Waiting list operations
//!
//! Explicit join/leave plus position queries. Promotion on cancellation
//! lives in the booking engine; this covers the student-facing queue
//! surface.

use std::sync::{Arc, Mutex};

use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::event::{Event, Notifier};
use crate::models::{WaitingListEntry, WaitlistStatus};
use crate::storage::{BookingRepository, Database, SlotRepository, WaitlistRepository};

pub struct WaitlistEngine {
    db: Arc<Mutex<Database>>,
    notifier: Arc<dyn Notifier>,
}

impl WaitlistEngine {
    pub fn new(db: Arc<Mutex<Database>>, notifier: Arc<dyn Notifier>) -> Self {
        Self { db, notifier }
    }

    /// Join a slot's waiting list; returns the queue length
    #[instrument(skip(self), fields(slot_id = %slot_id, student_id = %student_id))]
    pub fn join(&self, slot_id: Uuid, student_id: Uuid) -> Result<u64> {
        let total_count = {
            let db = self.db.lock().unwrap();

            db.find_slot_by_id(slot_id)?
                .ok_or_else(|| Error::NotFound(format!("Slot {}", slot_id)))?;

            // A seated student has nothing to wait for
            if db.find_confirmed_booking(slot_id, student_id)?.is_some() {
                return Err(Error::AlreadyBooked(
                    "Student already holds a confirmed booking".into(),
                ));
            }

            if db.find_waitlist_entry(slot_id, student_id)?.is_some() {
                return Err(Error::AlreadyQueued(
                    "Student is already on the waiting list".into(),
                ));
            }

            let entry = WaitingListEntry::new(slot_id, student_id);
            db.create_waitlist_entry(&entry)?;
            db.waitlist_count(slot_id)?
        };

        info!(total_count, "Joined waiting list");
        self.notifier.broadcast(&Event::WaitingListUpdated {
            slot_id,
            total_count,
        });

        Ok(total_count)
    }

    /// Leave a slot's waiting list; returns the remaining queue length
    #[instrument(skip(self), fields(slot_id = %slot_id, student_id = %student_id))]
    pub fn leave(&self, slot_id: Uuid, student_id: Uuid) -> Result<u64> {
        let total_count = {
            let db = self.db.lock().unwrap();

            let entry = db
                .find_waitlist_entry(slot_id, student_id)?
                .ok_or_else(|| Error::NotQueued("Student is not on the waiting list".into()))?;

            db.delete_waitlist_entry(entry.id)?;
            db.waitlist_count(slot_id)?
        };

        info!(total_count, "Left waiting list");
        self.notifier.broadcast(&Event::WaitingListUpdated {
            slot_id,
            total_count,
        });

        Ok(total_count)
    }

    /// The caller's queue standing for a slot
    #[instrument(skip(self))]
    pub fn status(&self, slot_id: Uuid, student_id: Uuid) -> Result<WaitlistStatus> {
        let db = self.db.lock().unwrap();

        let total_count = db.waitlist_count(slot_id)?;
        let position = match db.find_waitlist_entry(slot_id, student_id)? {
            Some(entry) => Some(db.waitlist_position(slot_id, entry.joined_at)?),
            None => None,
        };

        Ok(WaitlistStatus {
            is_queued: position.is_some(),
            position,
            total_count,
        })
    }
}
