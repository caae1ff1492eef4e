//! Booking model - a student's reservation against a slot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

/// A student's reservation against an availability slot.
///
/// `mentor_id` is denormalized from the slot at write time for query
/// convenience; it is never mutated independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub slot_id: Uuid,
    pub student_id: Uuid,
    pub mentor_id: Uuid,
    pub status: BookingStatus,
    pub booked_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// Create a confirmed booking for a slot
    pub fn confirmed(slot_id: Uuid, student_id: Uuid, mentor_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            slot_id,
            student_id,
            mentor_id,
            status: BookingStatus::Confirmed,
            booked_at: Utc::now(),
            cancelled_at: None,
        }
    }
}
