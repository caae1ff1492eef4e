//! Developer guardrails and invariants
//!
//! Debug assertions for detecting impossible states during development.
//! These checks are compiled out in release builds.

use uuid::Uuid;

use crate::models::{AvailabilitySlot, SlotStatus, WaitingListEntry};
use crate::schedule::windows_overlap;

/// Validate that a slot's state is internally consistent
pub fn assert_slot_invariants(slot: &AvailabilitySlot) {
    debug_assert!(
        slot.end_time > slot.start_time,
        "Slot {} ends at {} before it starts at {}",
        slot.id,
        slot.end_time,
        slot.start_time
    );

    debug_assert!(
        slot.max_participants >= 1,
        "Slot {} has zero capacity",
        slot.id
    );
}

/// Confirmed bookings must never exceed a slot's capacity at any
/// committed point.
pub fn assert_capacity_invariant(slot_id: Uuid, confirmed_count: u64, max_participants: u32) {
    debug_assert!(
        confirmed_count <= u64::from(max_participants),
        "Slot {} has {} confirmed bookings over capacity {}",
        slot_id,
        confirmed_count,
        max_participants
    );
}

/// Non-terminal slots of one mentor on one date must be pairwise
/// disjoint.
pub fn assert_slots_disjoint(slots: &[AvailabilitySlot]) {
    for (i, a) in slots.iter().enumerate() {
        if a.status.is_terminal() {
            continue;
        }
        for b in slots.iter().skip(i + 1) {
            if b.status.is_terminal() || a.mentor_id != b.mentor_id || a.date != b.date {
                continue;
            }
            debug_assert!(
                !windows_overlap(a.start_time, a.end_time, b.start_time, b.end_time),
                "Slots {} and {} overlap on {}",
                a.id,
                b.id,
                a.date
            );
        }
    }
}

/// A waiting list snapshot must be ordered FIFO by enqueue time
pub fn assert_queue_order(entries: &[WaitingListEntry]) {
    debug_assert!(
        entries.windows(2).all(|w| w[0].joined_at <= w[1].joined_at),
        "Waiting list is not in FIFO order"
    );
}

/// A full slot should only be full because capacity is reached
pub fn assert_full_means_at_capacity(
    slot: &AvailabilitySlot,
    confirmed_count: u64,
) {
    if slot.status == SlotStatus::Full {
        debug_assert!(
            confirmed_count >= u64::from(slot.max_participants),
            "Slot {} is marked full with {}/{} seats taken",
            slot.id,
            confirmed_count,
            slot.max_participants
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn make_slot(start: (u32, u32), end: (u32, u32)) -> AvailabilitySlot {
        AvailabilitySlot::new(
            Uuid::new_v4(),
            NaiveDate::from_ymd_opt(2026, 9, 15).unwrap(),
            NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
            2,
        )
    }

    #[test]
    fn test_valid_slot() {
        assert_slot_invariants(&make_slot((10, 0), (10, 30)));
    }

    #[test]
    fn test_capacity_within_bounds() {
        assert_capacity_invariant(Uuid::new_v4(), 2, 2);
        assert_capacity_invariant(Uuid::new_v4(), 0, 1);
    }

    #[test]
    #[should_panic(expected = "over capacity")]
    fn test_capacity_violation_detected() {
        assert_capacity_invariant(Uuid::new_v4(), 3, 2);
    }

    #[test]
    fn test_disjoint_slots_pass() {
        let mut a = make_slot((10, 0), (10, 30));
        let mut b = make_slot((10, 30), (11, 0));
        let mentor = Uuid::new_v4();
        a.mentor_id = mentor;
        b.mentor_id = mentor;
        assert_slots_disjoint(&[a, b]);
    }

    #[test]
    #[should_panic(expected = "overlap")]
    fn test_overlapping_slots_detected() {
        let mut a = make_slot((10, 0), (10, 30));
        let mut b = make_slot((10, 15), (10, 45));
        let mentor = Uuid::new_v4();
        a.mentor_id = mentor;
        b.mentor_id = mentor;
        assert_slots_disjoint(&[a, b]);
    }
}
