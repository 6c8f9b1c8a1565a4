use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::types::Principal;

const CONFLICT_RETRY_WAIT: Duration = Duration::from_millis(500);

/// An authenticated session handed out by the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub principal: Principal,
    pub token: String,
}

#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("login failed: {0}")]
    Login(String),
    #[error("transport error: {0}")]
    Transport(String),
}

enum LoginFailure {
    AlreadyAuthenticated,
    Other(SessionError),
}

/// Boundary to the external identity provider. Owns the login/logout
/// lifecycle and the on-disk session token so a restart can pick up an
/// existing session.
pub struct SessionManager {
    base: String,
    http: reqwest::Client,
    store_path: PathBuf,
}

impl SessionManager {
    pub fn new(base: &str, store_path: PathBuf) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            store_path,
        }
    }

    /// Restore a persisted session, validating it against the provider.
    /// Returns None when there is no token or the token is no longer valid;
    /// a stale token file is removed on the spot.
    pub async fn restore(&self) -> Option<Session> {
        let session = load_session(&self.store_path)?;
        let url = format!("{}/auth/session", self.base);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&session.token)
            .send()
            .await;
        match response {
            Ok(resp) if resp.status().is_success() => {
                debug!(principal = %session.principal, "restored session");
                Some(session)
            }
            Ok(_) => {
                clear_session(&self.store_path);
                None
            }
            Err(e) => {
                warn!("session validation failed: {}", e);
                None
            }
        }
    }

    /// Run the login flow. A provider-side "already authenticated" conflict
    /// is resolved by clearing the stale session and retrying once,
    /// automatically; any second conflict surfaces as a plain login error.
    pub async fn login(&self) -> Result<Session, SessionError> {
        match self.attempt_login().await {
            Ok(session) => {
                self.persist(&session);
                Ok(session)
            }
            Err(LoginFailure::AlreadyAuthenticated) => {
                debug!("login conflict, clearing stale session and retrying");
                self.clear().await;
                tokio::time::sleep(CONFLICT_RETRY_WAIT).await;
                match self.attempt_login().await {
                    Ok(session) => {
                        self.persist(&session);
                        Ok(session)
                    }
                    Err(LoginFailure::AlreadyAuthenticated) => Err(SessionError::Login(
                        "identity provider reports a conflicting session".to_string(),
                    )),
                    Err(LoginFailure::Other(e)) => Err(e),
                }
            }
            Err(LoginFailure::Other(e)) => Err(e),
        }
    }

    async fn attempt_login(&self) -> Result<Session, LoginFailure> {
        let url = format!("{}/auth/login", self.base);
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "client": "amity-tui" }))
            .send()
            .await
            .map_err(|e| LoginFailure::Other(SessionError::Transport(e.to_string())))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<Session>()
                .await
                .map_err(|e| LoginFailure::Other(SessionError::Login(e.to_string())));
        }

        let body = response.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::CONFLICT || body.contains("already authenticated") {
            return Err(LoginFailure::AlreadyAuthenticated);
        }
        let message = if body.trim().is_empty() {
            format!("identity provider returned {}", status)
        } else {
            body.trim().to_string()
        };
        Err(LoginFailure::Other(SessionError::Login(message)))
    }

    /// End the session with the provider and forget the persisted token.
    /// Callers must clear cached query data BEFORE invoking this.
    pub async fn logout(&self, session: &Session) {
        let url = format!("{}/auth/logout", self.base);
        if let Err(e) = self
            .http
            .post(&url)
            .bearer_auth(&session.token)
            .send()
            .await
        {
            warn!("logout request failed: {}", e);
        }
        clear_session(&self.store_path);
    }

    /// Drop whatever session state exists on either side, using the stale
    /// token when one is still on disk.
    async fn clear(&self) {
        let url = format!("{}/auth/logout", self.base);
        let mut request = self.http.post(&url);
        if let Some(stale) = load_session(&self.store_path) {
            request = request.bearer_auth(stale.token);
        }
        if let Err(e) = request.send().await {
            warn!("clearing stale session failed: {}", e);
        }
        clear_session(&self.store_path);
    }

    fn persist(&self, session: &Session) {
        persist_session(&self.store_path, session);
    }
}

fn load_session(path: &Path) -> Option<Session> {
    let raw = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&raw) {
        Ok(session) => Some(session),
        Err(e) => {
            warn!("ignoring unreadable session file: {}", e);
            None
        }
    }
}

fn persist_session(path: &Path, session: &Session) {
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    match toml::to_string(session) {
        Ok(raw) => {
            if let Err(e) = std::fs::write(path, raw) {
                warn!("failed to persist session: {}", e);
            }
        }
        Err(e) => warn!("failed to encode session: {}", e),
    }
}

fn clear_session(path: &Path) {
    let _ = std::fs::remove_file(path);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_round_trips_through_store_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        let session = Session {
            principal: Principal("w7x7r-cok77-xa".to_string()),
            token: "tok-123".to_string(),
        };
        persist_session(&path, &session);
        assert_eq!(load_session(&path), Some(session));

        clear_session(&path);
        assert_eq!(load_session(&path), None);
    }

    #[test]
    fn missing_store_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        assert_eq!(load_session(&path), None);
        // Clearing an absent file is a no-op.
        clear_session(&path);
    }

    #[test]
    fn corrupt_store_file_is_treated_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        std::fs::write(&path, "not valid toml [").unwrap();
        assert_eq!(load_session(&path), None);
    }
}
