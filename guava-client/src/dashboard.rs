//! Admin dashboard facade.
//!
//! Joins the REST API and the realtime feed over one shared
//! [`OrderBoard`]: `refresh` replaces the list from a full fetch,
//! `apply_event` patches it from feed pushes, and `set_status` applies
//! the operator's change optimistically and rolls it back if the server
//! rejects it.

use std::sync::Mutex;

use crate::board::{Applied, OrderBoard, OrderFilter};
use crate::feed::OrderFeedEvent;
use crate::{ClientResult, HttpClient};
use shared::order::{Order, OrderStatus};

#[derive(Debug)]
pub struct Dashboard {
    http: HttpClient,
    board: Mutex<OrderBoard>,
}

impl Dashboard {
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            board: Mutex::new(OrderBoard::new()),
        }
    }

    /// Replace the order list from a full fetch.
    pub async fn refresh(&self) -> ClientResult<usize> {
        let orders = self.http.list_orders(None, None).await?;
        let mut board = self.board.lock().unwrap();
        board.sync(orders);
        Ok(board.len())
    }

    /// Patch the board from a realtime push. Returns what happened so
    /// the caller can decide whether to notify the operator.
    pub fn apply_event(&self, event: OrderFeedEvent) -> Applied {
        let mut board = self.board.lock().unwrap();
        match event {
            OrderFeedEvent::OrderCreated(order) => board.apply(order),
            OrderFeedEvent::OrderStatusChanged { order_id, status } => {
                board.apply_status(&order_id, status)
            }
        }
    }

    /// Change an order's status: the board shows the new status
    /// immediately, the server is asked to confirm, and a rejection rolls
    /// the board back before the error is returned.
    pub async fn set_status(&self, order_id: &str, to: OrderStatus) -> ClientResult<Order> {
        let edit = self.board.lock().unwrap().begin_status_update(order_id, to)?;

        match self.http.update_order_status(order_id, to).await {
            Ok(order) => {
                self.board.lock().unwrap().apply(order.clone());
                Ok(order)
            }
            Err(e) => {
                self.board.lock().unwrap().revert(edit);
                Err(e)
            }
        }
    }

    /// Snapshot of the current list, newest first.
    pub fn orders(&self) -> Vec<Order> {
        self.board.lock().unwrap().orders().to_vec()
    }

    /// Snapshot of a filtered view.
    pub fn filtered(&self, filter: &OrderFilter) -> Vec<Order> {
        self.board
            .lock()
            .unwrap()
            .filtered(filter)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Status values the picker should offer for an order: the current
    /// status and everything forward of it, plus cancellation while the
    /// order is still open.
    pub fn status_options(&self, order_id: &str) -> Vec<OrderStatus> {
        self.board
            .lock()
            .unwrap()
            .get(order_id)
            .map(|o| {
                let mut options = o.status.forward_options();
                if !o.status.is_terminal() {
                    options.push(OrderStatus::Cancelled);
                }
                options
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClientConfig;
    use shared::order::{DeliveryType, OrderItem, PaymentInfo, PaymentStatus};

    fn dashboard() -> Dashboard {
        Dashboard::new(HttpClient::new(&ClientConfig::new("http://localhost:8080")))
    }

    fn order(id: &str, created_at: i64) -> Order {
        Order {
            order_id: id.to_string(),
            customer_name: "Ana".to_string(),
            customer_phone: "5551234567".to_string(),
            items: vec![OrderItem {
                dish_name: "Guava Punch".to_string(),
                price: 15.0,
                quantity: 1,
                special_instructions: None,
            }],
            total_amount: 15.0,
            status: OrderStatus::Pending,
            delivery_type: DeliveryType::DineIn,
            payment: PaymentInfo {
                method: "CASH".to_string(),
                status: PaymentStatus::Pending,
                transaction_id: None,
            },
            created_at,
        }
    }

    #[test]
    fn feed_events_patch_the_shared_board() {
        let dash = dashboard();
        assert_eq!(
            dash.apply_event(OrderFeedEvent::OrderCreated(order("ord-1", 100))),
            Applied::Inserted
        );
        assert_eq!(
            dash.apply_event(OrderFeedEvent::OrderStatusChanged {
                order_id: "ord-1".to_string(),
                status: OrderStatus::Confirmed,
            }),
            Applied::Updated
        );
        assert_eq!(dash.orders()[0].status, OrderStatus::Confirmed);

        // Push for an unfetched order changes nothing.
        assert_eq!(
            dash.apply_event(OrderFeedEvent::OrderStatusChanged {
                order_id: "ghost".to_string(),
                status: OrderStatus::Ready,
            }),
            Applied::Unknown
        );
        assert_eq!(dash.orders().len(), 1);
    }

    #[test]
    fn status_options_follow_the_flow() {
        let dash = dashboard();
        dash.apply_event(OrderFeedEvent::OrderCreated(order("ord-1", 100)));
        let options = dash.status_options("ord-1");
        assert_eq!(options.first(), Some(&OrderStatus::Pending));
        assert!(options.contains(&OrderStatus::Cancelled));
        assert!(dash.status_options("missing").is_empty());
    }
}
