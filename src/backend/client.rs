use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use super::types::{Friend, Message, Principal, UserProfile, UserRole};

/// Failure of a single backend operation. `Rejected` carries the backend's
/// own wording so callers can distinguish known rejection reasons.
#[derive(Debug, Clone, Error)]
pub enum RpcError {
    #[error("{0}")]
    Rejected(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid response: {0}")]
    Decode(String),
}

impl RpcError {
    pub fn is_duplicate_friend(&self) -> bool {
        matches!(self, RpcError::Rejected(msg) if msg.contains("already added"))
    }

    pub fn is_empty_username(&self) -> bool {
        matches!(self, RpcError::Rejected(msg) if msg.contains("empty"))
    }
}

/// Typed proxy for the friends backend. One method per backend operation;
/// every call is request/response JSON over HTTP with a bearer token.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base: String,
    token: String,
}

impl BackendClient {
    pub fn new(base: &str, token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    async fn call<B, R>(&self, method: &str, body: &B) -> Result<R, RpcError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/api/{}", self.base, method);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(RpcError::Rejected(rejection_message(status, &text)));
        }

        response
            .json()
            .await
            .map_err(|e| RpcError::Decode(e.to_string()))
    }

    /// Variant for confirmation-only operations; the response body is ignored.
    async fn call_unit<B>(&self, method: &str, body: &B) -> Result<(), RpcError>
    where
        B: Serialize + ?Sized,
    {
        let url = format!("{}/api/{}", self.base, method);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(RpcError::Rejected(rejection_message(status, &text)));
        }
        Ok(())
    }

    pub async fn get_caller_user_profile(&self) -> Result<Option<UserProfile>, RpcError> {
        self.call("getCallerUserProfile", &json!({})).await
    }

    pub async fn save_caller_user_profile(&self, profile: &UserProfile) -> Result<(), RpcError> {
        self.call_unit("saveCallerUserProfile", &json!({ "profile": profile }))
            .await
    }

    pub async fn get_caller_user_role(&self) -> Result<UserRole, RpcError> {
        self.call("getCallerUserRole", &json!({})).await
    }

    pub async fn is_caller_admin(&self) -> Result<bool, RpcError> {
        self.call("isCallerAdmin", &json!({})).await
    }

    /// Admin-only capability; exposed on the proxy but not wired to any screen.
    pub async fn assign_caller_user_role(
        &self,
        user: &Principal,
        role: UserRole,
    ) -> Result<(), RpcError> {
        self.call_unit("assignCallerUserRole", &json!({ "user": user, "role": role }))
            .await
    }

    pub async fn get_friends_list(&self) -> Result<Vec<Friend>, RpcError> {
        self.call("getFriendsList", &json!({})).await
    }

    pub async fn add_friend(&self, username: &str) -> Result<(), RpcError> {
        self.call_unit("addFriend", &json!({ "username": username }))
            .await
    }

    pub async fn remove_friend(&self, username: &str) -> Result<(), RpcError> {
        self.call_unit("removeFriend", &json!({ "friendName": username }))
            .await
    }

    pub async fn get_messages_with_friend(&self, username: &str) -> Result<Vec<Message>, RpcError> {
        self.call("getMessagesWithFriend", &json!({ "friendUsername": username }))
            .await
    }

    pub async fn send_message(&self, username: &str, content: &str) -> Result<(), RpcError> {
        self.call_unit(
            "sendMessage",
            &json!({ "friendUsername": username, "messageContent": content }),
        )
        .await
    }

    pub async fn get_user_profile(&self, user: &Principal) -> Result<Option<UserProfile>, RpcError> {
        self.call("getUserProfile", &json!({ "user": user })).await
    }
}

/// Prefer the backend's own `message` field, then the raw body, then the
/// status line, so rejection wording survives intact for classification.
fn rejection_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(msg) = value.get("message").and_then(|m| m.as_str()) {
            if !msg.trim().is_empty() {
                return msg.trim().to_string();
            }
        }
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    format!("backend returned {}", status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_friend_rejection_is_classified() {
        let err = RpcError::Rejected("Friend already added".to_string());
        assert!(err.is_duplicate_friend());
        assert!(!err.is_empty_username());
    }

    #[test]
    fn empty_username_rejection_is_classified() {
        let err = RpcError::Rejected("Username cannot be empty".to_string());
        assert!(err.is_empty_username());
        assert!(!err.is_duplicate_friend());
    }

    #[test]
    fn transport_errors_are_never_classified_as_rejections() {
        let err = RpcError::Transport("connection refused".to_string());
        assert!(!err.is_duplicate_friend());
        assert!(!err.is_empty_username());
    }

    #[test]
    fn rejection_message_prefers_structured_body() {
        let status = reqwest::StatusCode::BAD_REQUEST;
        assert_eq!(
            rejection_message(status, r#"{"message":"Friend already added"}"#),
            "Friend already added"
        );
        assert_eq!(rejection_message(status, "plain failure"), "plain failure");
        assert_eq!(
            rejection_message(status, ""),
            "backend returned 400 Bad Request"
        );
    }
}
