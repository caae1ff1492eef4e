//! Error types for Campusloop Core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Date is in the past: {0}")]
    PastDate(String),

    #[error("Start time is too soon: {0}")]
    TooSoon(String),

    #[error("Invalid time format: {0}")]
    InvalidFormat(String),

    #[error("Invalid time range: {0}")]
    InvalidRange(String),

    #[error("Time conflict: {0}")]
    TimeConflict(String),

    #[error("Slot unavailable: {0}")]
    Unavailable(String),

    #[error("Already booked: {0}")]
    AlreadyBooked(String),

    #[error("Already on waiting list: {0}")]
    AlreadyQueued(String),

    #[error("Not on waiting list: {0}")]
    NotQueued(String),

    #[error("Booking already cancelled: {0}")]
    AlreadyCancelled(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
