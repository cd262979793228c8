use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use super::base::TeamPlatform;
use super::config::BridgeConfig;
use crate::errors::{BridgeError, BridgeResult};
use crate::models::exchange::MultiAgentExchangeFormat;
use crate::models::message::RemoteMessage;
use crate::models::team::{Agent, AgentSpec, SessionCreated, Team, TeamConfig};

/// HTTP client for the team platform's REST API.
///
/// Every call is a single request; errors are returned, not logged. Wrap results with
/// [`FailSoft`](super::base::FailSoft) where a neutral value is wanted instead.
pub struct RemoteBridgeClient {
    client: Client,
    config: BridgeConfig,
}

impl RemoteBridgeClient {
    pub fn new(config: BridgeConfig) -> BridgeResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    fn url(&self, segments: &[&str]) -> String {
        let path = segments
            .iter()
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/{}", self.config.host.trim_end_matches('/'), path)
    }

    async fn get(&self, url: String) -> BridgeResult<Value> {
        tracing::debug!(%url, "GET");
        self.send(self.client.get(&url).header(CONTENT_TYPE, "application/json"))
            .await
    }

    async fn post<B: Serialize + ?Sized>(&self, url: String, body: &B) -> BridgeResult<Value> {
        tracing::debug!(%url, "POST");
        self.send(
            self.client
                .post(&url)
                .header(CONTENT_TYPE, "application/json")
                .json(body),
        )
        .await
    }

    async fn send(&self, request: RequestBuilder) -> BridgeResult<Value> {
        let response = request.send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(BridgeError::Status { status, body });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        let value: Value = serde_json::from_str(&body)
            .map_err(|e| BridgeError::Protocol(format!("response is not JSON: {}", e)))?;
        Ok(unwrap_envelope(value))
    }

    pub async fn list_teams(&self) -> BridgeResult<Vec<Team>> {
        let value = self.get(self.url(&["teams"])).await?;
        decode_list(value, "teams")
    }

    pub async fn get_team(&self, team_id: &str) -> BridgeResult<Team> {
        require("team id", team_id)?;
        let value = self.get(self.url(&["teams", team_id])).await?;
        decode(value, "team")
    }

    /// Import a team definition; the shape is checked locally first
    pub async fn import_team(&self, team: &TeamConfig) -> BridgeResult<Team> {
        team.validate().map_err(BridgeError::Validation)?;
        let value = self.post(self.url(&["teams", "import"]), team).await?;
        decode(value, "team")
    }

    pub async fn list_agents(&self) -> BridgeResult<Vec<Agent>> {
        let value = self.get(self.url(&["agents"])).await?;
        decode_list(value, "agents")
    }

    pub async fn get_agent(&self, agent_id: &str) -> BridgeResult<Agent> {
        require("agent id", agent_id)?;
        let value = self.get(self.url(&["agents", agent_id])).await?;
        decode(value, "agent")
    }

    pub async fn create_agent(&self, spec: &AgentSpec) -> BridgeResult<Agent> {
        require("agent name", &spec.name)?;
        require("system message", &spec.system_message)?;
        let value = self.post(self.url(&["agents"]), spec).await?;
        decode(value, "agent")
    }

    pub async fn add_skill(&self, agent_id: &str, skill_id: &str) -> BridgeResult<()> {
        require("agent id", agent_id)?;
        require("skill id", skill_id)?;
        self.post(
            self.url(&["agents", agent_id, "skills"]),
            &json!({ "skill_id": skill_id }),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl TeamPlatform for RemoteBridgeClient {
    async fn create_team_session(&self, team_id: &str, task: &str) -> BridgeResult<String> {
        require("team id", team_id)?;
        require("task", task)?;
        let value = self
            .post(
                self.url(&["teams", team_id, "sessions"]),
                &json!({ "task": task }),
            )
            .await?;
        extract_session_id(value)
    }

    async fn create_session(&self, agent_id: &str, task: &str) -> BridgeResult<String> {
        require("agent id", agent_id)?;
        require("task", task)?;
        let value = self
            .post(
                self.url(&["sessions"]),
                &json!({ "agent_id": agent_id, "task": task }),
            )
            .await?;
        extract_session_id(value)
    }

    async fn send_message(
        &self,
        session_id: &str,
        message: &MultiAgentExchangeFormat,
    ) -> BridgeResult<()> {
        require("session id", session_id)?;
        require("content", &message.exchange.content)?;
        self.post(self.url(&["sessions", session_id, "messages"]), message)
            .await?;
        Ok(())
    }

    async fn get_messages(&self, session_id: &str) -> BridgeResult<Vec<RemoteMessage>> {
        require("session id", session_id)?;
        let value = self
            .get(self.url(&["sessions", session_id, "messages"]))
            .await?;
        decode_list(value, "messages")
    }
}

fn require(field: &str, value: &str) -> BridgeResult<()> {
    if value.trim().is_empty() {
        Err(BridgeError::Validation(format!("{} must not be empty", field)))
    } else {
        Ok(())
    }
}

/// Some platform deployments wrap payloads as `{"status": .., "data": ..}`
fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("status") && map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn decode<T: DeserializeOwned>(value: Value, what: &str) -> BridgeResult<T> {
    serde_json::from_value(value)
        .map_err(|e| BridgeError::Protocol(format!("unexpected {} payload: {}", what, e)))
}

fn decode_list<T: DeserializeOwned>(value: Value, what: &str) -> BridgeResult<Vec<T>> {
    if !value.is_array() {
        return Err(BridgeError::Protocol(format!(
            "expected a JSON array of {}",
            what
        )));
    }
    decode(value, what)
}

fn extract_session_id(value: Value) -> BridgeResult<String> {
    let id = match value.get("id") {
        Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    };
    match id {
        Some(id) => Ok(id),
        None => decode::<SessionCreated>(value, "session").map(|s| s.id),
    }
}
