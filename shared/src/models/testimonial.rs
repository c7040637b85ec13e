use serde::{Deserialize, Serialize};

/// Customer testimonial shown on the storefront and managed from the
/// admin dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub id: String,
    pub author: String,
    /// 1..=5 stars.
    pub rating: u8,
    pub text: String,
    #[serde(default)]
    pub approved: bool,
    /// Unix millis.
    pub created_at: i64,
}
