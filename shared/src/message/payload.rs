//! Typed payloads carried by feed messages.

use serde::{Deserialize, Serialize};

use crate::order::OrderStatus;

/// Room joined by admin dashboard consumers.
pub const ROOM_DASHBOARD: &str = "dashboard";

/// Payload of a `Handshake` message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HandshakePayload {
    pub version: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_version: Option<String>,
}

/// Payload of `JoinRoom`/`LeaveRoom` messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomPayload {
    pub room: String,
}

/// Payload of an `OrderStatusChanged` push.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangedPayload {
    pub order_id: String,
    pub status: OrderStatus,
}
