//! Server-owned order model
//!
//! Orders are created by the external order/payment service. The client
//! reads them, renders them and requests status transitions; it never
//! creates or deletes them directly.

mod status;

pub use status::{OrderStatus, StatusError};

use serde::{Deserialize, Serialize};

/// Whether the order is delivered or consumed on site.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryType {
    Delivery,
    #[default]
    DineIn,
}

/// Payment settlement state reported by the gateway.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
}

/// Payment block attached to an order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInfo {
    pub method: String,
    pub status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

/// One purchased line inside a submitted order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub dish_name: String,
    pub price: f64,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
}

/// A submitted, server-tracked purchase with a lifecycle status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Server-assigned, stable identifier.
    pub order_id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub delivery_type: DeliveryType,
    pub payment: PaymentInfo,
    /// Unix millis, server-assigned.
    pub created_at: i64,
}

impl Order {
    /// Total unit count across all lines.
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_serde_shape() {
        let order = Order {
            order_id: "ord-1".to_string(),
            customer_name: "Ana".to_string(),
            customer_phone: "5551234567".to_string(),
            items: vec![OrderItem {
                dish_name: "Mango Lassi".to_string(),
                price: 18.5,
                quantity: 2,
                special_instructions: None,
            }],
            total_amount: 37.0,
            status: OrderStatus::Pending,
            delivery_type: DeliveryType::Delivery,
            payment: PaymentInfo {
                method: "CASH".to_string(),
                status: PaymentStatus::Pending,
                transaction_id: None,
            },
            created_at: 1_700_000_000_000,
        };

        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["orderId"], "ord-1");
        assert_eq!(json["status"], "PENDING");
        assert_eq!(json["deliveryType"], "DELIVERY");
        assert_eq!(json["items"][0]["dishName"], "Mango Lassi");

        let back: Order = serde_json::from_value(json).unwrap();
        assert_eq!(back, order);
        assert_eq!(back.item_count(), 2);
    }
}
