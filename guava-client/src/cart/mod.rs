//! Cart store
//!
//! In-memory cart state machine with write-through local persistence.
//! Lines are keyed by `(item_id, customization key)`: adding the same item
//! with the same customization merges quantities, a different customization
//! opens a distinct line. Every operation is atomic - it either fully
//! applies (memory and cache) or leaves the cart untouched.

mod key;
mod storage;

pub use key::{Customization, OptionValue, customization_key};
pub use storage::{CART_CACHE_FILE, CartCache, CartCacheError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Catalog fields needed to add an item to the cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub item_id: String,
    pub title: String,
    pub unit_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

/// One (item, customization) pairing with a quantity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartLine {
    pub item_id: String,
    pub title: String,
    pub unit_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    /// Always positive; a line that would reach zero is removed instead.
    pub quantity: u32,
    #[serde(default)]
    pub customization: Customization,
    /// Canonical customization key, stored so identity survives reloads.
    pub key: String,
}

impl CartLine {
    pub fn line_total(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }
}

#[derive(Debug, Error)]
pub enum CartStoreError {
    /// Add rejects non-positive quantities outright (documented policy;
    /// `update_quantity` clamps instead).
    #[error("quantity must be a positive integer, got {0}")]
    InvalidQuantity(i64),

    #[error("unit price must be finite and non-negative, got {0}")]
    InvalidPrice(f64),

    #[error("cart cache error: {0}")]
    Cache(#[from] CartCacheError),
}

type AddedHook = Box<dyn Fn(&CartLine) + Send + Sync>;

/// The customer's in-progress order.
pub struct CartStore {
    lines: Vec<CartLine>,
    cache: Option<CartCache>,
    added_hook: Option<AddedHook>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("lines", &self.lines)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CartStore {
    /// Memory-only store (no persistence).
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            cache: None,
            added_hook: None,
        }
    }

    /// Store backed by a durable cache; previously persisted lines are
    /// loaded so the cart survives a reload.
    pub fn with_cache(cache: CartCache) -> Result<Self, CartStoreError> {
        let lines = cache.load()?;
        Ok(Self {
            lines,
            cache: Some(cache),
            added_hook: None,
        })
    }

    /// Observable hook point fired after each successful add (toast UI).
    pub fn set_added_hook(&mut self, hook: impl Fn(&CartLine) + Send + Sync + 'static) {
        self.added_hook = Some(Box::new(hook));
    }

    /// Add `quantity` of an item. Merges into the line with the same
    /// item id and customization if one exists, appends otherwise.
    pub fn add(
        &mut self,
        item: &CartItem,
        quantity: u32,
        customization: Option<Customization>,
    ) -> Result<&CartLine, CartStoreError> {
        if quantity == 0 {
            return Err(CartStoreError::InvalidQuantity(0));
        }
        if !item.unit_price.is_finite() || item.unit_price < 0.0 {
            return Err(CartStoreError::InvalidPrice(item.unit_price));
        }

        let customization = customization.unwrap_or_default();
        let line_key = customization_key(Some(&customization));

        let mut next = self.lines.clone();
        let idx = match next
            .iter()
            .position(|l| l.item_id == item.item_id && l.key == line_key)
        {
            Some(idx) => {
                next[idx].quantity = next[idx].quantity.saturating_add(quantity);
                idx
            }
            None => {
                next.push(CartLine {
                    item_id: item.item_id.clone(),
                    title: item.title.clone(),
                    unit_price: item.unit_price,
                    image_ref: item.image_ref.clone(),
                    quantity,
                    customization,
                    key: line_key,
                });
                next.len() - 1
            }
        };

        self.commit(next)?;
        let line = &self.lines[idx];
        if let Some(hook) = &self.added_hook {
            hook(line);
        }
        Ok(line)
    }

    /// Remove lines for an item. With no customization this is bulk
    /// removal (every variant of the item); with one, only the exact
    /// matching variant goes. Returns how many lines were removed.
    pub fn remove_line(
        &mut self,
        item_id: &str,
        customization: Option<&Customization>,
    ) -> Result<usize, CartStoreError> {
        let mut next = self.lines.clone();
        let before = next.len();
        match customization {
            None => next.retain(|l| l.item_id != item_id),
            Some(custom) => {
                let line_key = customization_key(Some(custom));
                next.retain(|l| !(l.item_id == item_id && l.key == line_key));
            }
        }
        let removed = before - next.len();
        if removed > 0 {
            self.commit(next)?;
        }
        Ok(removed)
    }

    /// Set the quantity for the matching line(s). Negative input clamps to
    /// zero; lines reaching zero are pruned, never kept as placeholders.
    pub fn update_quantity(
        &mut self,
        item_id: &str,
        new_quantity: i64,
        customization: Option<&Customization>,
    ) -> Result<(), CartStoreError> {
        let clamped = new_quantity.clamp(0, u32::MAX as i64) as u32;
        let line_key = customization.map(|c| customization_key(Some(c)));

        let mut next = self.lines.clone();
        let mut touched = false;
        for line in next.iter_mut() {
            let matches = line.item_id == item_id
                && line_key.as_deref().is_none_or(|k| k == line.key);
            if matches && line.quantity != clamped {
                line.quantity = clamped;
                touched = true;
            }
        }
        if !touched {
            return Ok(());
        }
        next.retain(|l| l.quantity > 0);
        self.commit(next)
    }

    /// Empty the cart. Called once after a successful order hand-off,
    /// never implicitly.
    pub fn clear(&mut self) -> Result<(), CartStoreError> {
        self.commit(Vec::new())
    }

    /// Sum of unit price x quantity over all lines.
    pub fn subtotal(&self) -> f64 {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Sum of quantities over all lines.
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |acc, l| acc.saturating_add(l.quantity))
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Persist the candidate line set, then swap it in. A cache failure
    /// leaves the in-memory cart unchanged.
    fn commit(&mut self, next: Vec<CartLine>) -> Result<(), CartStoreError> {
        if let Some(cache) = &self.cache {
            cache.save(&next)?;
        }
        self.lines = next;
        Ok(())
    }
}
