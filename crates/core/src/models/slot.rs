//! Availability slot model - a mentor's bookable time window

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of an availability slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Available,
    Full,
    Completed,
    Cancelled,
}

impl SlotStatus {
    /// Terminal statuses never transition again and are ignored
    /// by overlap checks.
    pub fn is_terminal(self) -> bool {
        matches!(self, SlotStatus::Completed | SlotStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SlotStatus::Available => "available",
            SlotStatus::Full => "full",
            SlotStatus::Completed => "completed",
            SlotStatus::Cancelled => "cancelled",
        }
    }
}

/// A mentor-defined bookable time window on a given date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub id: Uuid,
    pub mentor_id: Uuid,
    pub date: NaiveDate,
    /// Start of the window, minute precision
    pub start_time: NaiveTime,
    /// End of the window, exclusive
    pub end_time: NaiveTime,
    pub max_participants: u32,
    pub description: Option<String>,
    pub status: SlotStatus,
    pub created_at: DateTime<Utc>,
}

impl AvailabilitySlot {
    pub fn new(
        mentor_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        max_participants: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            mentor_id,
            date,
            start_time,
            end_time,
            max_participants,
            description: None,
            status: SlotStatus::Available,
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }

    /// The moment this slot's window closes
    pub fn ends_at(&self) -> NaiveDateTime {
        self.date.and_time(self.end_time)
    }

    /// Whether the window has closed as of `now` (local wall clock)
    pub fn has_ended(&self, now: NaiveDateTime) -> bool {
        self.ends_at() <= now
    }
}

/// A slot together with its live confirmed-booking count,
/// as returned by the upcoming-slot listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotSummary {
    #[serde(flatten)]
    pub slot: AvailabilitySlot,
    pub current_booked: u64,
}
