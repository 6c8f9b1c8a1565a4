use serde::{Deserialize, Serialize};

/// Opaque authenticated identifier issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(pub String);

impl Principal {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
}

impl UserProfile {
    /// First whitespace-separated word of the display name, for greetings.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Friend {
    pub username: String,
    pub online: bool,
}

/// One chat message. `timestamp` is nanoseconds since the Unix epoch;
/// 0 means the backend has not assigned a timestamp yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub content: String,
    pub sender: Principal,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
    Guest,
}

pub const MAX_DISPLAY_NAME_LEN: usize = 50;

/// Client-side check applied before `saveCallerUserProfile`.
pub fn validate_display_name(raw: &str) -> Result<String, &'static str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("Display name cannot be empty");
    }
    if trimmed.chars().count() > MAX_DISPLAY_NAME_LEN {
        return Err("Display name must be 50 characters or fewer");
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_decodes_backend_json() {
        let raw = r#"{"content":"hey","sender":"aaaaa-aa","timestamp":1700000000000000000}"#;
        let msg: Message = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.content, "hey");
        assert_eq!(msg.sender.as_str(), "aaaaa-aa");
        assert_eq!(msg.timestamp, 1_700_000_000_000_000_000);
    }

    #[test]
    fn zero_timestamp_sentinel_survives_decode() {
        let msg: Message =
            serde_json::from_str(r#"{"content":"x","sender":"p","timestamp":0}"#).unwrap();
        assert_eq!(msg.timestamp, 0);
    }

    #[test]
    fn role_uses_lowercase_wire_names() {
        assert_eq!(serde_json::to_string(&UserRole::Admin).unwrap(), r#""admin""#);
        let role: UserRole = serde_json::from_str(r#""guest""#).unwrap();
        assert_eq!(role, UserRole::Guest);
    }

    #[test]
    fn absent_profile_is_null() {
        let profile: Option<UserProfile> = serde_json::from_str("null").unwrap();
        assert!(profile.is_none());
        let profile: Option<UserProfile> =
            serde_json::from_str(r#"{"name":"Alex Johnson"}"#).unwrap();
        assert_eq!(profile.unwrap().first_name(), "Alex");
    }

    #[test]
    fn display_name_is_trimmed_and_bounded() {
        assert_eq!(validate_display_name("  Alex  ").unwrap(), "Alex");
        assert!(validate_display_name("   ").is_err());
        assert!(validate_display_name(&"x".repeat(51)).is_err());
        assert!(validate_display_name(&"x".repeat(50)).is_ok());
    }
}
