//! Catalog tree served by `GET /api/menu/full`.

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// A single orderable item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Dish {
    pub id: String,
    pub name: String,
    /// Non-negative unit price in currency units.
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    #[serde(default = "default_true")]
    pub available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subcategory {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub dishes: Vec<Dish>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MenuCategory {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subcategories: Vec<Subcategory>,
}

/// The full nested menu: categories -> subcategories -> dishes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FullMenu {
    #[serde(default)]
    pub categories: Vec<MenuCategory>,
}

impl FullMenu {
    /// Look a dish up anywhere in the tree.
    pub fn find_dish(&self, dish_id: &str) -> Option<&Dish> {
        self.categories
            .iter()
            .flat_map(|c| &c.subcategories)
            .flat_map(|s| &s.dishes)
            .find(|d| d.id == dish_id)
    }

    pub fn dish_count(&self) -> usize {
        self.categories
            .iter()
            .flat_map(|c| &c.subcategories)
            .map(|s| s.dishes.len())
            .sum()
    }
}
