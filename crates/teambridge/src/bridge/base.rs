use async_trait::async_trait;

use crate::errors::{BridgeError, BridgeResult};
use crate::models::exchange::MultiAgentExchangeFormat;
use crate::models::message::RemoteMessage;

/// Session surface of a remote team platform
#[async_trait]
pub trait TeamPlatform: Send + Sync {
    /// Start a session of `team_id` working on `task`, returning the session id
    async fn create_team_session(&self, team_id: &str, task: &str) -> BridgeResult<String>;

    /// Start a single-agent session, returning the session id
    async fn create_session(&self, agent_id: &str, task: &str) -> BridgeResult<String>;

    /// Post a message into an existing session
    async fn send_message(
        &self,
        session_id: &str,
        message: &MultiAgentExchangeFormat,
    ) -> BridgeResult<()>;

    /// Fetch every message of a session in platform order
    async fn get_messages(&self, session_id: &str) -> BridgeResult<Vec<RemoteMessage>>;
}

/// Collapse a remote failure into the neutral value of the call's return type, logging it.
///
/// Remote calls are fallible but must never fail the caller; this is the one place where
/// their errors are swallowed.
pub trait FailSoft<T> {
    /// `None` on failure
    fn or_none(self, operation: &str) -> Option<T>;

    /// The type's default (an empty list, say) on failure
    fn or_empty(self, operation: &str) -> T
    where
        T: Default;

    /// Whether the call went through
    fn succeeded(self, operation: &str) -> bool;
}

impl<T> FailSoft<T> for BridgeResult<T> {
    fn or_none(self, operation: &str) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(e) => {
                log_failure(operation, &e);
                None
            }
        }
    }

    fn or_empty(self, operation: &str) -> T
    where
        T: Default,
    {
        self.or_none(operation).unwrap_or_default()
    }

    fn succeeded(self, operation: &str) -> bool {
        self.or_none(operation).is_some()
    }
}

fn log_failure(operation: &str, error: &BridgeError) {
    match error {
        BridgeError::Validation(_) => {
            tracing::warn!(operation, error = %error, "rejected before reaching the team platform")
        }
        _ => tracing::error!(operation, error = %error, "team platform call failed"),
    }
}
