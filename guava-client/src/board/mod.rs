//! Admin order list reconciler.
//!
//! The board holds the authoritative in-memory order list: a full REST
//! fetch replaces it, realtime pushes patch it incrementally, and a
//! `seen` set guarantees at-most-once arrival notification per order id
//! even when the feed redelivers.

use std::collections::HashSet;

use thiserror::Error;

use shared::order::{Order, OrderStatus};

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("order {0} not found")]
    NotFound(String),

    #[error("order {order_id} cannot move from {from} to {to}")]
    InvalidTransition {
        order_id: String,
        from: OrderStatus,
        to: OrderStatus,
    },
}

/// Outcome of applying a realtime push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// New order inserted; the caller should notify.
    Inserted,
    /// Known order patched in place.
    Updated,
    /// Redelivery of an already-seen order; nothing changed.
    Duplicate,
    /// Status push for an order the board has never fetched; the next
    /// full sync will carry the correct state.
    Unknown,
}

/// Pure view filter; never mutates the underlying list.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    /// Case-insensitive substring match on order id or customer phone.
    pub query: Option<String>,
}

impl OrderFilter {
    fn matches(&self, order: &Order) -> bool {
        if let Some(status) = self.status
            && order.status != status
        {
            return false;
        }
        if let Some(query) = self.query.as_deref().filter(|q| !q.trim().is_empty()) {
            let needle = query.trim().to_lowercase();
            return order.order_id.to_lowercase().contains(&needle)
                || order.customer_phone.to_lowercase().contains(&needle);
        }
        true
    }
}

/// In-flight optimistic status edit. Must be either confirmed (dropped)
/// or reverted when the server rejects the change.
#[derive(Debug)]
#[must_use = "revert this edit if the server rejects the status change"]
pub struct StatusEdit {
    pub order_id: String,
    pub previous: OrderStatus,
}

#[derive(Debug, Default)]
pub struct OrderBoard {
    /// Newest first.
    orders: Vec<Order>,
    /// Order ids already announced to the operator.
    seen: HashSet<String>,
}

impl OrderBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the list with a full fetch. Fetched ids count as seen so
    /// a later push for them is a duplicate, not a new arrival.
    pub fn sync(&mut self, mut orders: Vec<Order>) {
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        for order in &orders {
            self.seen.insert(order.order_id.clone());
        }
        self.orders = orders;
    }

    /// Patch the list from a realtime order push.
    pub fn apply(&mut self, order: Order) -> Applied {
        if let Some(existing) = self
            .orders
            .iter_mut()
            .find(|o| o.order_id == order.order_id)
        {
            *existing = order;
            return Applied::Updated;
        }
        if !self.seen.insert(order.order_id.clone()) {
            // Announced before but no longer listed (e.g. filtered fetch).
            return Applied::Duplicate;
        }
        tracing::info!(order_id = %order.order_id, "New order arrived");
        self.orders.insert(0, order);
        Applied::Inserted
    }

    /// Patch a status push. Unknown ids are a no-op.
    pub fn apply_status(&mut self, order_id: &str, status: OrderStatus) -> Applied {
        match self.orders.iter_mut().find(|o| o.order_id == order_id) {
            Some(order) => {
                order.status = status;
                Applied::Updated
            }
            None => {
                tracing::debug!(order_id, "Status push for unknown order");
                Applied::Unknown
            }
        }
    }

    /// Start an optimistic status change: the list shows the new status
    /// immediately, and the returned edit can roll it back if the server
    /// rejects it.
    pub fn begin_status_update(
        &mut self,
        order_id: &str,
        to: OrderStatus,
    ) -> Result<StatusEdit, BoardError> {
        let order = self
            .orders
            .iter_mut()
            .find(|o| o.order_id == order_id)
            .ok_or_else(|| BoardError::NotFound(order_id.to_string()))?;
        if !order.status.can_transition(to) {
            return Err(BoardError::InvalidTransition {
                order_id: order_id.to_string(),
                from: order.status,
                to,
            });
        }
        let previous = order.status;
        order.status = to;
        Ok(StatusEdit {
            order_id: order_id.to_string(),
            previous,
        })
    }

    /// Roll back a rejected optimistic edit.
    pub fn revert(&mut self, edit: StatusEdit) {
        if let Some(order) = self.orders.iter_mut().find(|o| o.order_id == edit.order_id) {
            tracing::warn!(order_id = %edit.order_id, "Reverting rejected status change");
            order.status = edit.previous;
        }
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn get(&self, order_id: &str) -> Option<&Order> {
        self.orders.iter().find(|o| o.order_id == order_id)
    }

    /// Filtered view, newest first. Does not modify the list.
    pub fn filtered(&self, filter: &OrderFilter) -> Vec<&Order> {
        self.orders.iter().filter(|o| filter.matches(o)).collect()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}
