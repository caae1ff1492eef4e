//! Notification protocol message types
//!
//! Everything on the wire is one of these, JSON-encoded inside a
//! length-prefixed frame.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use campusloop_core::Event;

/// Transport protocol messages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    /// First frame a client must send; identifies the user.
    /// Authentication happens upstream; the transport trusts the id.
    Hello { user_id: Uuid },

    /// Server accepts the connection
    Welcome,

    /// Server rejects the connection
    Rejected { reason: String },

    /// A booking event pushed to the client
    Event { event: Event },

    /// Ping to keep connection alive
    Ping,

    /// Pong response to ping
    Pong,
}

impl Message {
    /// Serialize message to JSON bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize message from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_roundtrip() {
        let msg = Message::Event {
            event: Event::SlotDeleted {
                slot_id: Uuid::new_v4(),
            },
        };

        let bytes = msg.to_bytes().unwrap();
        let decoded = Message::from_bytes(&bytes).unwrap();

        match decoded {
            Message::Event {
                event: Event::SlotDeleted { .. },
            } => {}
            other => panic!("Wrong message type: {:?}", other),
        }
    }

    #[test]
    fn test_hello_roundtrip() {
        let user_id = Uuid::new_v4();
        let bytes = Message::Hello { user_id }.to_bytes().unwrap();

        match Message::from_bytes(&bytes).unwrap() {
            Message::Hello { user_id: decoded } => assert_eq!(decoded, user_id),
            other => panic!("Wrong message type: {:?}", other),
        }
    }
}
