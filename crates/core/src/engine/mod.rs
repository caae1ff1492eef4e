//! Booking engines
//!
//! The engines own the business rules: slot lifecycle (validation,
//! overlap detection, expiry sweep), booking with capacity limits, and
//! FIFO waiting-list promotion. They share a database handle and push
//! state changes through an injected [`Notifier`](crate::event::Notifier).

mod booking;
mod slots;
mod waitlist;

pub use booking::{BookingEngine, BookingOutcome, CancellationOutcome};
pub use slots::{SlotDraft, SlotEngine};
pub use waitlist::WaitlistEngine;

use chrono::NaiveDateTime;

/// Current local wall-clock time. Slot dates and times are interpreted
/// in the server's local timezone.
pub(crate) fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::sync::{Arc, Mutex};

    use chrono::{Duration, Local};
    use uuid::Uuid;

    use crate::event::{Event, Notifier};
    use crate::storage::Database;

    /// Notifier that records every delivery for assertions
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub broadcasts: Mutex<Vec<Event>>,
        pub directs: Mutex<Vec<(Uuid, Event)>>,
    }

    impl RecordingNotifier {
        pub fn broadcast_types(&self) -> Vec<String> {
            self.broadcasts
                .lock()
                .unwrap()
                .iter()
                .map(event_type)
                .collect()
        }

        pub fn direct_types(&self) -> Vec<(Uuid, String)> {
            self.directs
                .lock()
                .unwrap()
                .iter()
                .map(|(id, e)| (*id, event_type(e)))
                .collect()
        }
    }

    fn event_type(event: &Event) -> String {
        serde_json::to_value(event).unwrap()["type"]
            .as_str()
            .unwrap()
            .to_string()
    }

    impl Notifier for RecordingNotifier {
        fn broadcast(&self, event: &Event) {
            self.broadcasts.lock().unwrap().push(event.clone());
        }

        fn notify_user(&self, user_id: Uuid, event: &Event) {
            self.directs.lock().unwrap().push((user_id, event.clone()));
        }
    }

    pub fn test_db() -> Arc<Mutex<Database>> {
        Arc::new(Mutex::new(Database::open_in_memory().unwrap()))
    }

    /// A date string safely in the future (tomorrow, ISO format)
    pub fn tomorrow() -> String {
        (Local::now().date_naive() + Duration::days(1))
            .format("%Y-%m-%d")
            .to_string()
    }

    /// A date string safely in the past (yesterday, ISO format)
    pub fn yesterday() -> String {
        (Local::now().date_naive() - Duration::days(1))
            .format("%Y-%m-%d")
            .to_string()
    }
}
