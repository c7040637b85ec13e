//! Durable admin session.
//!
//! The admin token is cached on disk so a restart does not force a new
//! login. Expiry is read from the JWT's `exp` claim (decoded without
//! signature verification; the server re-checks on every request), and
//! an expired cached token is treated as logged out and discarded.

use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared::util::now_millis;

const SESSION_FILE: &str = "guava_admin_session.json";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session file IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session file corrupt: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed token: {0}")]
    MalformedToken(String),
}

/// A cached admin login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdminSession {
    pub token: String,
    /// Unix millis from the JWT `exp` claim; `None` for tokens without one.
    pub expires_at: Option<i64>,
    /// Unix millis.
    pub logged_in_at: i64,
}

impl AdminSession {
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now_millis())
    }
}

/// Extract the `exp` claim (unix seconds) from a JWT, without verifying
/// the signature.
pub fn parse_jwt_exp(token: &str) -> Result<Option<i64>, SessionError> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| SessionError::MalformedToken("missing payload segment".to_string()))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| SessionError::MalformedToken(e.to_string()))?;

    #[derive(Deserialize)]
    struct Claims {
        exp: Option<i64>,
    }

    let claims: Claims = serde_json::from_slice(&bytes)?;
    Ok(claims.exp)
}

/// File-backed session store.
#[derive(Debug, Clone)]
pub struct SessionStore {
    file_path: PathBuf,
}

impl SessionStore {
    pub fn new(storage_dir: impl AsRef<Path>) -> Self {
        Self {
            file_path: storage_dir.as_ref().join(SESSION_FILE),
        }
    }

    /// Persist a fresh login. Expiry comes from the token itself.
    pub fn store_login(&self, token: &str) -> Result<AdminSession, SessionError> {
        let expires_at = parse_jwt_exp(token)?.map(|exp_secs| exp_secs * 1000);
        let session = AdminSession {
            token: token.to_string(),
            expires_at,
            logged_in_at: now_millis(),
        };
        self.save(&session)?;
        Ok(session)
    }

    fn save(&self, session: &AdminSession) -> Result<(), SessionError> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(session)?;
        fs::write(&self.file_path, json)?;
        tracing::debug!(path = %self.file_path.display(), "Admin session saved");
        Ok(())
    }

    /// Load the cached session, if any. A corrupt file is treated as
    /// absent and removed.
    pub fn load(&self) -> Result<Option<AdminSession>, SessionError> {
        if !self.file_path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&self.file_path)?;
        match serde_json::from_str(&data) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding corrupt session file");
                self.clear()?;
                Ok(None)
            }
        }
    }

    /// A valid, unexpired cached token. Expired sessions are cleared as
    /// a side effect.
    pub fn authenticated(&self) -> Result<Option<AdminSession>, SessionError> {
        match self.load()? {
            Some(session) if session.is_expired() => {
                tracing::info!("Cached admin session expired, clearing");
                self.clear()?;
                Ok(None)
            }
            other => Ok(other),
        }
    }

    pub fn clear(&self) -> Result<(), SessionError> {
        if self.file_path.exists() {
            fs::remove_file(&self.file_path)?;
        }
        Ok(())
    }
}
