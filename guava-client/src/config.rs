//! Client configuration

use std::path::PathBuf;

/// Configuration for connecting to the ordering backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST API base URL (e.g., "http://localhost:8080")
    pub base_url: String,

    /// Realtime order feed address (host:port), if live updates are wanted
    pub feed_addr: Option<String>,

    /// Admin JWT token for authenticated endpoints
    pub token: Option<String>,

    /// Request timeout in seconds
    pub timeout: u64,

    /// WhatsApp destination number for the checkout handoff
    pub whatsapp_destination: Option<String>,

    /// Directory for durable local state (cart, menu cache, session)
    pub storage_dir: Option<PathBuf>,
}

impl ClientConfig {
    /// Create a new configuration with defaults.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            feed_addr: None,
            token: None,
            timeout: 30,
            whatsapp_destination: None,
            storage_dir: None,
        }
    }

    /// Set the realtime feed address.
    pub fn with_feed_addr(mut self, addr: impl Into<String>) -> Self {
        self.feed_addr = Some(addr.into());
        self
    }

    /// Set the admin JWT token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the request timeout in seconds.
    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the WhatsApp destination number.
    pub fn with_whatsapp_destination(mut self, number: impl Into<String>) -> Self {
        self.whatsapp_destination = Some(number.into());
        self
    }

    /// Set the durable storage directory.
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }
}
