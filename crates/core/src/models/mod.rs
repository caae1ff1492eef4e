//! Data models for Campusloop

mod booking;
mod slot;
mod waitlist;

pub use booking::*;
pub use slot::*;
pub use waitlist::*;
