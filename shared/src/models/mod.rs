//! Catalog, testimonial and analytics models read from the REST API.

mod analytics;
mod menu;
mod testimonial;

pub use analytics::{AnalyticsSnapshot, AnalyticsWindow, GrowthMetrics};
pub use menu::{Dish, FullMenu, MenuCategory, Subcategory};
pub use testimonial::Testimonial;
