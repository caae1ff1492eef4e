//! Campusloop Notification Library
//!
//! Real-time fan-out of booking events to connected clients.
//!
//! # Architecture
//!
//! - **Registry**: one live connection per user id, last connection wins
//! - **Server**: accepts connections, handshakes, drains per-user queues
//! - **Protocol**: length-prefixed JSON messages
//!
//! The registry implements [`campusloop_core::Notifier`], so the booking
//! engines push events through it without knowing about sockets.
//!
//! # Usage
//!
//! ```ignore
//! let registry = Arc::new(ConnectionRegistry::new());
//! let server = NotifyServer::start(7410, registry.clone()).await?;
//!
//! // Engines receive the registry as their Notifier
//! let bookings = BookingEngine::new(db, registry.clone());
//! ```

pub mod error;
mod frame;
pub mod protocol;
pub mod registry;
pub mod server;

pub use error::{Error, Result};
pub use protocol::Message;
pub use registry::ConnectionRegistry;
pub use server::NotifyServer;

/// Default port for the notification server
pub const DEFAULT_PORT: u16 = 7410;
