//! Booking engine
//!
//! Books seats against slot capacity, queues students on full slots, and
//! promotes the head of the waiting list when a cancellation frees a
//! seat. The multi-step sequences run inside a single transaction, so a
//! committed state never exceeds capacity and cancellation plus
//! promotion land together.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::local_now;
use crate::error::{Error, Result};
use crate::event::{Event, Notifier};
use crate::invariants::assert_capacity_invariant;
use crate::models::{Booking, BookingStatus, SlotStatus, WaitingListEntry};
use crate::storage::{BookingRepository, BookingStore, Database, SlotStore, WaitlistStore};

/// What a booking attempt produced
#[derive(Debug, Clone)]
pub enum BookingOutcome {
    /// A seat was free; the booking is confirmed
    Booked(Booking),
    /// The slot was full; the student joined the queue
    Waitlisted {
        entry: WaitingListEntry,
        position: u64,
    },
}

/// Result of a cancellation, including the promotion it may have caused
#[derive(Debug, Clone)]
pub struct CancellationOutcome {
    pub cancelled: Booking,
    pub promoted: Option<Booking>,
}

pub struct BookingEngine {
    db: Arc<Mutex<Database>>,
    notifier: Arc<dyn Notifier>,
}

impl BookingEngine {
    pub fn new(db: Arc<Mutex<Database>>, notifier: Arc<dyn Notifier>) -> Self {
        Self { db, notifier }
    }

    /// Book a seat on a slot, or join its waiting list when full
    #[instrument(skip(self), fields(student_id = %student_id, slot_id = %slot_id))]
    pub fn book_slot(&self, student_id: Uuid, slot_id: Uuid) -> Result<BookingOutcome> {
        let now = local_now();

        let (outcome, event) = {
            let db = self.db.lock().unwrap();
            db.with_transaction(|conn| {
                let slots = SlotStore::new(conn);
                let bookings = BookingStore::new(conn);
                let waitlist = WaitlistStore::new(conn);

                let slot = slots
                    .find_by_id(slot_id)?
                    .ok_or_else(|| Error::NotFound(format!("Slot {}", slot_id)))?;

                if slot.status.is_terminal() || slot.has_ended(now) {
                    return Err(Error::Unavailable(format!(
                        "Slot is {} and cannot be booked",
                        slot.status.as_str()
                    )));
                }

                if bookings.find_confirmed(slot_id, student_id)?.is_some() {
                    return Err(Error::AlreadyBooked(
                        "Student already holds a confirmed booking".into(),
                    ));
                }

                let confirmed = slots.confirmed_count(slot_id)?;

                if confirmed < u64::from(slot.max_participants) {
                    let booking = Booking::confirmed(slot_id, student_id, slot.mentor_id);
                    bookings.create(&booking)?;

                    let new_count = confirmed + 1;
                    assert_capacity_invariant(slot_id, new_count, slot.max_participants);

                    let slot_status = if new_count == u64::from(slot.max_participants) {
                        slots.update_status(slot_id, SlotStatus::Full)?;
                        SlotStatus::Full
                    } else {
                        slot.status
                    };

                    let event = Event::SlotBooked {
                        booking: booking.clone(),
                        slot_status,
                    };
                    Ok((BookingOutcome::Booked(booking), event))
                } else {
                    if waitlist.find(slot_id, student_id)?.is_some() {
                        return Err(Error::AlreadyQueued(
                            "Student is already on the waiting list".into(),
                        ));
                    }

                    let entry = WaitingListEntry::new(slot_id, student_id);
                    waitlist.create(&entry)?;
                    let position = waitlist.position(slot_id, entry.joined_at)?;
                    let total_count = waitlist.count_for_slot(slot_id)?;

                    let event = Event::WaitingListUpdated {
                        slot_id,
                        total_count,
                    };
                    Ok((BookingOutcome::Waitlisted { entry, position }, event))
                }
            })?
        };

        match &outcome {
            BookingOutcome::Booked(booking) => {
                info!(booking_id = %booking.id, "Slot booked");
            }
            BookingOutcome::Waitlisted { position, .. } => {
                info!(position, "Slot full, student waitlisted");
            }
        }
        self.notifier.broadcast(&event);

        Ok(outcome)
    }

    /// Cancel a booking and promote the oldest waiting student, if any
    #[instrument(skip(self), fields(student_id = %student_id, booking_id = %booking_id))]
    pub fn cancel_booking(
        &self,
        student_id: Uuid,
        booking_id: Uuid,
    ) -> Result<CancellationOutcome> {
        let (outcome, queue_len) = {
            let db = self.db.lock().unwrap();
            db.with_transaction(|conn| {
                let slots = SlotStore::new(conn);
                let bookings = BookingStore::new(conn);
                let waitlist = WaitlistStore::new(conn);

                let mut booking = bookings
                    .find_by_id(booking_id)?
                    .ok_or_else(|| Error::NotFound(format!("Booking {}", booking_id)))?;

                if booking.student_id != student_id {
                    return Err(Error::Forbidden("Not the booking owner".into()));
                }
                if booking.status == BookingStatus::Cancelled {
                    return Err(Error::AlreadyCancelled(booking_id.to_string()));
                }

                let cancelled_at = Utc::now();
                bookings.mark_cancelled(booking_id, cancelled_at)?;
                booking.status = BookingStatus::Cancelled;
                booking.cancelled_at = Some(cancelled_at);

                // The slot exists as long as the booking does (cascade)
                let slot = slots
                    .find_by_id(booking.slot_id)?
                    .ok_or_else(|| Error::NotFound(format!("Slot {}", booking.slot_id)))?;

                let mut promoted = None;
                let mut queue_len = None;

                if !slot.status.is_terminal() {
                    let confirmed = slots.confirmed_count(slot.id)?;
                    if slot.status == SlotStatus::Full
                        && confirmed < u64::from(slot.max_participants)
                    {
                        slots.update_status(slot.id, SlotStatus::Available)?;
                    }

                    // FIFO promotion of the freed seat. Entries whose
                    // student already holds a confirmed seat are stale
                    // and get dropped instead of promoted.
                    while let Some(entry) = waitlist.front_of_queue(slot.id)? {
                        waitlist.delete(entry.id)?;
                        queue_len = Some(waitlist.count_for_slot(slot.id)?);

                        if bookings.find_confirmed(slot.id, entry.student_id)?.is_some() {
                            continue;
                        }

                        let promotion =
                            Booking::confirmed(slot.id, entry.student_id, slot.mentor_id);
                        bookings.create(&promotion)?;

                        let new_count = slots.confirmed_count(slot.id)?;
                        assert_capacity_invariant(slot.id, new_count, slot.max_participants);
                        if new_count >= u64::from(slot.max_participants) {
                            slots.update_status(slot.id, SlotStatus::Full)?;
                        }

                        promoted = Some(promotion);
                        break;
                    }
                }

                Ok((
                    CancellationOutcome {
                        cancelled: booking,
                        promoted,
                    },
                    queue_len,
                ))
            })?
        };

        info!(
            promoted = outcome.promoted.is_some(),
            "Booking cancelled"
        );

        self.notifier.broadcast(&Event::BookingCancelled {
            booking: outcome.cancelled.clone(),
            promoted: outcome.promoted.clone(),
        });

        if let Some(promotion) = &outcome.promoted {
            // The promoted student gets a direct notification distinct
            // from the general broadcast
            self.notifier.notify_user(
                promotion.student_id,
                &Event::SlotAutoBooked {
                    booking: promotion.clone(),
                },
            );
        }
        if let Some(total_count) = queue_len {
            self.notifier.broadcast(&Event::WaitingListUpdated {
                slot_id: outcome.cancelled.slot_id,
                total_count,
            });
        }

        Ok(outcome)
    }

    /// A student's confirmed, not-yet-ended bookings
    #[instrument(skip(self))]
    pub fn list_student_bookings(&self, student_id: Uuid) -> Result<Vec<Booking>> {
        let db = self.db.lock().unwrap();
        db.list_upcoming_bookings_for_student(student_id, local_now())
    }
}
