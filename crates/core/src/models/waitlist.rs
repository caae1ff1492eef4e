//! Waiting list model - FIFO queue for full slots

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A student waiting for a seat on a full slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitingListEntry {
    pub id: Uuid,
    pub slot_id: Uuid,
    pub student_id: Uuid,
    pub joined_at: DateTime<Utc>,
}

impl WaitingListEntry {
    pub fn new(slot_id: Uuid, student_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            slot_id,
            student_id,
            joined_at: Utc::now(),
        }
    }
}

/// A student's view of their place in a slot's queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitlistStatus {
    pub is_queued: bool,
    /// 1-indexed position, present only when queued
    pub position: Option<u64>,
    pub total_count: u64,
}
