//! Aggregate metrics returned by `GET /api/analytics/{today|week|month|growth}`.

use serde::{Deserialize, Serialize};

/// Metrics for one time window (today / week / month).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsWindow {
    pub total_orders: u64,
    pub total_revenue: f64,
    pub average_order_value: f64,
}

/// Period-over-period growth percentages.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GrowthMetrics {
    pub orders_growth_pct: f64,
    pub revenue_growth_pct: f64,
}

/// One complete poll result across all four endpoints.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    pub today: AnalyticsWindow,
    pub week: AnalyticsWindow,
    pub month: AnalyticsWindow,
    pub growth: GrowthMetrics,
    /// Unix millis at which the poll was issued. Zero until the first
    /// successful fetch.
    pub fetched_at: i64,
}
