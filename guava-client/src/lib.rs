//! Guava Client - ordering client core for the Guava juice bar platform
//!
//! Storefront side: cart state machine with durable local persistence and
//! checkout composition (charges, WhatsApp handoff, gateway return).
//! Admin side: realtime order feed, order list reconciliation, analytics
//! polling and the REST API client.

pub mod analytics;
pub mod board;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod feed;
pub mod http;
pub mod menu;
pub mod session;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::HttpClient;

// Re-export shared types for convenience
pub use shared::models::{AnalyticsSnapshot, FullMenu, Testimonial};
pub use shared::order::{DeliveryType, Order, OrderStatus};

// Core state re-exports
pub use board::{OrderBoard, OrderFilter};
pub use cart::{CartStore, Customization};
pub use feed::{FeedClient, FeedSubscription, OrderFeedEvent};
