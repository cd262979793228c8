use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::exchange::now_iso8601;

pub const UNKNOWN_AGENT: &str = "Unknown Agent";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }

    /// Map a remote role name onto a local role.
    ///
    /// The platform labels its agents' turns with names other than "assistant" in some
    /// deployments, so anything that is not a user or system turn counts as an assistant turn.
    pub fn from_remote(role: &str) -> Self {
        match role.to_ascii_lowercase().as_str() {
            "user" => Role::User,
            "system" => Role::System,
            _ => Role::Assistant,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A chat message of the local agent system
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: String,
}

impl ChatMessage {
    /// Create a message with a fresh id, stamped with the current time
    pub fn new<S: Into<String>>(role: Role, content: S) -> Self {
        ChatMessage {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: now_iso8601(),
        }
    }

    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system<S: Into<String>>(content: S) -> Self {
        Self::new(Role::System, content)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A message as served by the team platform
pub struct RemoteMessage {
    #[serde(deserialize_with = "crate::models::string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "crate::models::string_or_number")]
    pub session_id: String,
    pub role: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl RemoteMessage {
    pub fn is_assistant(&self) -> bool {
        self.role == "assistant"
    }

    /// The team member that authored this message, `"Unknown Agent"` when not reported
    pub fn agent_name(&self) -> &str {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("agentName"))
            .and_then(|v| v.as_str())
            .unwrap_or(UNKNOWN_AGENT)
    }
}
