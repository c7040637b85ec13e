//! Shared types for the Guava ordering platform
//!
//! Common types used by both the storefront and the admin dashboard sides
//! of the client: the server-owned order model, catalog models, analytics
//! shapes and the realtime feed message types.

pub mod message;
pub mod models;
pub mod order;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

// Feed message re-exports (for convenient access)
pub use message::{FeedEventKind, FeedMessage};
pub use order::{DeliveryType, Order, OrderStatus};
