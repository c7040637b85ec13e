//! Durable cart cache.
//!
//! The cart is owned by the browser/session side alone until checkout, and
//! must survive a reload. Every mutation writes through to a JSON file
//! under the storage directory; writes are synchronous from the caller's
//! perspective.

use std::path::{Path, PathBuf};
use thiserror::Error;

use super::CartLine;

/// File name under the storage directory.
pub const CART_CACHE_FILE: &str = "guava_cart.json";

#[derive(Debug, Error)]
pub enum CartCacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// JSON-file persistence for the cart line set.
#[derive(Debug, Clone)]
pub struct CartCache {
    file_path: PathBuf,
}

impl CartCache {
    pub fn new(storage_dir: &Path) -> Self {
        Self {
            file_path: storage_dir.join(CART_CACHE_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Load the persisted line set; a missing file is an empty cart.
    pub fn load(&self) -> Result<Vec<CartLine>, CartCacheError> {
        if !self.file_path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.file_path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Persist the full line set.
    pub fn save(&self, lines: &[CartLine]) -> Result<(), CartCacheError> {
        if let Some(parent) = self.file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(lines)?;
        std::fs::write(&self.file_path, content)?;
        tracing::debug!(lines = lines.len(), "Cart cache written");
        Ok(())
    }

    pub fn clear(&self) -> Result<(), CartCacheError> {
        if self.file_path.exists() {
            std::fs::remove_file(&self.file_path)?;
        }
        Ok(())
    }
}
