//! Realtime feed message types
//!
//! Shared between the client and the order feed server for both network
//! (TCP) and in-process (memory) transports.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use uuid::Uuid;

pub mod payload;
pub use payload::*;

use crate::order::{Order, OrderStatus};

/// Protocol version carried in the handshake.
pub const PROTOCOL_VERSION: u16 = 1;

/// Kinds of messages on the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedEventKind {
    /// Connection handshake
    Handshake = 0,
    /// Client joins a logical room
    JoinRoom = 1,
    /// Client leaves a logical room
    LeaveRoom = 2,
    /// Server push: a new order was created
    OrderCreated = 3,
    /// Server push: an order's status changed
    OrderStatusChanged = 4,
}

impl TryFrom<u8> for FeedEventKind {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FeedEventKind::Handshake),
            1 => Ok(FeedEventKind::JoinRoom),
            2 => Ok(FeedEventKind::LeaveRoom),
            3 => Ok(FeedEventKind::OrderCreated),
            4 => Ok(FeedEventKind::OrderStatusChanged),
            _ => Err(()),
        }
    }
}

impl fmt::Display for FeedEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedEventKind::Handshake => write!(f, "handshake"),
            FeedEventKind::JoinRoom => write!(f, "join_room"),
            FeedEventKind::LeaveRoom => write!(f, "leave_room"),
            FeedEventKind::OrderCreated => write!(f, "order_created"),
            FeedEventKind::OrderStatusChanged => write!(f, "order_status_changed"),
        }
    }
}

/// One framed message on the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedMessage {
    pub request_id: Uuid,
    pub kind: FeedEventKind,
    pub payload: Vec<u8>,
}

impl FeedMessage {
    pub fn new(kind: FeedEventKind, payload: Vec<u8>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            kind,
            payload,
        }
    }

    /// Connection handshake message.
    pub fn handshake(payload: &HandshakePayload) -> Self {
        Self::new(
            FeedEventKind::Handshake,
            serde_json::to_vec(payload).expect("Failed to serialize handshake payload"),
        )
    }

    /// Fire-and-forget room join.
    pub fn join_room(room: &str) -> Self {
        Self::new(
            FeedEventKind::JoinRoom,
            serde_json::to_vec(&RoomPayload {
                room: room.to_string(),
            })
            .expect("Failed to serialize room payload"),
        )
    }

    /// Fire-and-forget room leave.
    pub fn leave_room(room: &str) -> Self {
        Self::new(
            FeedEventKind::LeaveRoom,
            serde_json::to_vec(&RoomPayload {
                room: room.to_string(),
            })
            .expect("Failed to serialize room payload"),
        )
    }

    /// Server push carrying the full new order.
    pub fn order_created(order: &Order) -> Self {
        Self::new(
            FeedEventKind::OrderCreated,
            serde_json::to_vec(order).expect("Failed to serialize order"),
        )
    }

    /// Server push carrying an order id and its new status.
    pub fn order_status_changed(order_id: &str, status: OrderStatus) -> Self {
        Self::new(
            FeedEventKind::OrderStatusChanged,
            serde_json::to_vec(&StatusChangedPayload {
                order_id: order_id.to_string(),
                status,
            })
            .expect("Failed to serialize status payload"),
        )
    }

    /// Decode the JSON payload into its typed form.
    pub fn decode_payload<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kind_roundtrips_through_u8() {
        for kind in [
            FeedEventKind::Handshake,
            FeedEventKind::JoinRoom,
            FeedEventKind::LeaveRoom,
            FeedEventKind::OrderCreated,
            FeedEventKind::OrderStatusChanged,
        ] {
            assert_eq!(FeedEventKind::try_from(kind as u8), Ok(kind));
        }
        assert!(FeedEventKind::try_from(99).is_err());
    }

    #[test]
    fn status_changed_payload_decodes() {
        let msg = FeedMessage::order_status_changed("ord-9", OrderStatus::Ready);
        assert_eq!(msg.kind, FeedEventKind::OrderStatusChanged);
        let payload: StatusChangedPayload = msg.decode_payload().unwrap();
        assert_eq!(payload.order_id, "ord-9");
        assert_eq!(payload.status, OrderStatus::Ready);
    }
}
