//! Order lifecycle status machine
//!
//! The flow is fixed and forward-only in the admin UI:
//! `PENDING -> CONFIRMED -> PREPARING -> READY -> OUT_FOR_DELIVERY -> DELIVERED`,
//! with `CANCELLED` reachable from any non-terminal state as an absorbing
//! side-channel (never offered by the forward picker).

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Lifecycle status of a server-tracked order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Preparing,
    Ready,
    OutForDelivery,
    Delivered,
    Cancelled,
}

/// Rejected status transition.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid status transition {from} -> {to}")]
pub struct StatusError {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

impl OrderStatus {
    /// The fixed forward flow, in rank order. `Cancelled` is not part of it.
    pub const FLOW: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
    ];

    /// Position in the forward flow. `None` for `Cancelled`.
    pub fn rank(self) -> Option<usize> {
        Self::FLOW.iter().position(|s| *s == self)
    }

    /// Terminal states accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Statuses the forward picker may offer: every flow status whose rank
    /// is at or after the current one. Empty for `Cancelled`.
    pub fn forward_options(self) -> Vec<OrderStatus> {
        match self.rank() {
            Some(rank) => Self::FLOW[rank..].to_vec(),
            None => Vec::new(),
        }
    }

    /// Whether an admin-issued transition to `next` is allowed.
    ///
    /// Forward moves (rank >= current) are allowed; `Cancelled` is reachable
    /// from any non-terminal state through the cancellation side-channel.
    pub fn can_transition(self, next: OrderStatus) -> bool {
        if next == OrderStatus::Cancelled {
            return !self.is_terminal();
        }
        match (self.rank(), next.rank()) {
            (Some(from), Some(to)) => to >= from,
            _ => false,
        }
    }

    /// Validated transition, for callers that want the error detail.
    pub fn transition(self, next: OrderStatus) -> Result<OrderStatus, StatusError> {
        if self.can_transition(next) {
            Ok(next)
        } else {
            Err(StatusError {
                from: self,
                to: next,
            })
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Ready => "READY",
            OrderStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
