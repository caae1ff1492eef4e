//! Campusloop Core Library
//!
//! Models, storage, booking engines, and the notification seam for the
//! Campusloop mentorship slot-booking platform.

pub mod engine;
pub mod error;
pub mod event;
pub mod invariants;
pub mod models;
pub mod schedule;
pub mod storage;

pub use engine::{
    BookingEngine, BookingOutcome, CancellationOutcome, SlotDraft, SlotEngine, WaitlistEngine,
};
pub use error::{Error, Result};
pub use event::{Event, Notifier, NullNotifier};
pub use models::*;
pub use storage::{
    BookingRepository, BookingStore, Database, SlotRepository, SlotStore, Storage,
    WaitlistRepository, WaitlistStore,
};
