//! Booking events and the notification seam
//!
//! Engines emit events through a [`Notifier`] injected at construction.
//! Delivery is fire-and-forget: an implementation may drop an event for a
//! disconnected user and must never fail the triggering operation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{AvailabilitySlot, Booking, SlotStatus};

/// A state change worth pushing to connected clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SlotCreated {
        slot: AvailabilitySlot,
    },
    SlotUpdated {
        slot: AvailabilitySlot,
    },
    SlotCompleted {
        slot_id: Uuid,
    },
    SlotDeleted {
        slot_id: Uuid,
    },
    SlotBooked {
        booking: Booking,
        slot_status: SlotStatus,
    },
    /// Broadcast after a cancellation, carrying the auto-promoted
    /// booking when the waiting list produced one
    BookingCancelled {
        booking: Booking,
        promoted: Option<Booking>,
    },
    /// Sent directly to the promoted student only
    SlotAutoBooked {
        booking: Booking,
    },
    WaitingListUpdated {
        slot_id: Uuid,
        total_count: u64,
    },
}

/// Delivery interface for booking events
///
/// Implementations are expected to be cheap to call from synchronous
/// engine code; anything slow belongs behind a channel.
pub trait Notifier: Send + Sync {
    /// Deliver to every connected user
    fn broadcast(&self, event: &Event);

    /// Deliver to one user; silently dropped if they are offline
    fn notify_user(&self, user_id: Uuid, event: &Event);
}

/// Notifier that discards everything (tests, offline tools)
#[derive(Debug, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn broadcast(&self, _event: &Event) {}

    fn notify_user(&self, _user_id: Uuid, _event: &Event) {}
}
