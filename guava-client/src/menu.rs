//! Menu cache.
//!
//! The storefront renders from the last known menu immediately and
//! refreshes from the network in the background. A fetch failure keeps
//! the cached copy; a fetch success replaces it on disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::{ClientResult, HttpClient};
use shared::models::FullMenu;
use shared::util::now_millis;

const MENU_CACHE_FILE: &str = "guava_menu.json";

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct CachedMenu {
    menu: FullMenu,
    /// Unix millis of the fetch that produced this copy.
    fetched_at: i64,
}

/// Disk-backed menu store.
#[derive(Debug)]
pub struct MenuStore {
    file_path: PathBuf,
    current: Option<CachedMenu>,
}

impl MenuStore {
    /// Open the store, loading any cached copy. A corrupt cache file is
    /// ignored; the next refresh overwrites it.
    pub fn open(storage_dir: impl AsRef<Path>) -> Self {
        let file_path = storage_dir.as_ref().join(MENU_CACHE_FILE);
        let current = match fs::read_to_string(&file_path) {
            Ok(data) => match serde_json::from_str(&data) {
                Ok(cached) => Some(cached),
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring corrupt menu cache");
                    None
                }
            },
            Err(_) => None,
        };
        Self { file_path, current }
    }

    /// The last known menu, cached or freshly fetched.
    pub fn menu(&self) -> Option<&FullMenu> {
        self.current.as_ref().map(|c| &c.menu)
    }

    /// Unix millis of the copy currently held, if any.
    pub fn fetched_at(&self) -> Option<i64> {
        self.current.as_ref().map(|c| c.fetched_at)
    }

    /// Fetch the menu and replace the cached copy. On failure the cached
    /// copy survives and the error is returned for display.
    pub async fn refresh(&mut self, http: &HttpClient) -> ClientResult<&FullMenu> {
        let menu = http.full_menu().await?;
        let cached = CachedMenu {
            menu,
            fetched_at: now_millis(),
        };
        self.persist(&cached);
        Ok(&self.current.insert(cached).menu)
    }

    fn persist(&self, cached: &CachedMenu) {
        // Cache write failure is not a refresh failure.
        let result = (|| -> std::io::Result<()> {
            if let Some(parent) = self.file_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let json = serde_json::to_string_pretty(cached)
                .expect("Failed to serialize menu cache");
            fs::write(&self.file_path, json)
        })();
        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to write menu cache");
        }
    }
}
