//! Team sessions on top of the converter and a [`TeamPlatform`]
//!
//! A session moves through `Created -> ResultsSent? -> MessagesExchanged* -> Exported`.
//! Nothing about that progression is stored here: every call is independent and stateless,
//! the platform owns the session.
//!
//! Remote failures never escape this module. They are logged and turned into `None`,
//! `false` or an empty list through [`FailSoft`]. Only malformed local input is an error.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::bridge::base::{FailSoft, TeamPlatform};
use crate::converter::{remote_metadata, results_to_exchange, ExchangeOptions};
use crate::errors::ExchangeResult;
use crate::models::content::ContentBlock;
use crate::models::exchange::{
    Contribution, ExchangeFormat, ExchangeMetadata, MultiAgentExchangeFormat, TeamContext,
};
use crate::models::message::RemoteMessage;
use crate::models::result_item::{ResultItem, ResultType};
use crate::parser::{detect_content_type, parse_content_blocks};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResponse {
    pub agent_name: String,
    pub content: String,
    pub timestamp: String,
    pub structured_content: Vec<ContentBlock>,
}

/// All replies of one agent, in session order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResponses {
    pub agent_name: String,
    pub responses: Vec<AgentResponse>,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// One result per agent message
    Individual,
    /// One result holding the whole transcript
    Raw,
    /// One result per agent
    #[default]
    Combined,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportOptions {
    pub format: ExportFormat,
    /// Restrict the export to these agents; `None` keeps everyone
    pub include_agents: Option<Vec<String>>,
}

pub struct SessionOrchestrator<P: TeamPlatform> {
    platform: P,
    options: ExchangeOptions,
}

impl<P: TeamPlatform> SessionOrchestrator<P> {
    pub fn new(platform: P) -> Self {
        Self::with_options(platform, ExchangeOptions::default())
    }

    /// Use `options` for every exchange this orchestrator builds
    pub fn with_options(platform: P, options: ExchangeOptions) -> Self {
        Self { platform, options }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Create a session for `team_id` and, if given, send `results` as its first message.
    ///
    /// Results are converted before anything goes over the wire, so invalid input is an
    /// error and no session is created. A session whose first message fails is left in place.
    pub async fn create_team_session(
        &self,
        team_id: &str,
        task: &str,
        results: Option<&[ResultItem]>,
    ) -> ExchangeResult<Option<String>> {
        let initial = self.initial_exchange(results)?;
        let created = self
            .platform
            .create_team_session(team_id, task)
            .await
            .or_none("create team session");
        Ok(self.deliver_initial(created, initial).await)
    }

    /// Single-agent counterpart of [`create_team_session`](Self::create_team_session)
    pub async fn create_agent_session(
        &self,
        agent_id: &str,
        task: &str,
        results: Option<&[ResultItem]>,
    ) -> ExchangeResult<Option<String>> {
        let initial = self.initial_exchange(results)?;
        let created = self
            .platform
            .create_session(agent_id, task)
            .await
            .or_none("create session");
        Ok(self.deliver_initial(created, initial).await)
    }

    fn initial_exchange(
        &self,
        results: Option<&[ResultItem]>,
    ) -> ExchangeResult<Option<ExchangeFormat>> {
        results
            .map(|results| results_to_exchange(results, &self.options))
            .transpose()
    }

    async fn deliver_initial(
        &self,
        created: Option<String>,
        initial: Option<ExchangeFormat>,
    ) -> Option<String> {
        let session_id = created?;
        info!(session_id = %session_id, "created session");

        if let Some(exchange) = initial {
            let message = MultiAgentExchangeFormat::from(exchange);
            let delivered = self
                .platform
                .send_message(&session_id, &message)
                .await
                .succeeded("send initial results");
            if !delivered {
                warn!(session_id = %session_id, "session was created but its initial results were not delivered");
                return None;
            }
        }

        Some(session_id)
    }

    /// Send `content` to the team, optionally addressed to some of its agents only
    pub async fn send_to_team_session(
        &self,
        session_id: &str,
        content: &str,
        target_agents: Option<&[String]>,
    ) -> bool {
        let metadata = ExchangeMetadata::new(self.options.source.clone())
            .with("messageType", json!("team_message"));
        let exchange = ExchangeFormat::new(content, detect_content_type(content), metadata)
            .with_blocks(parse_content_blocks(content));

        let mut message = MultiAgentExchangeFormat::from(exchange);
        if let Some(agents) = target_agents {
            message = message.with_target_agents(agents.iter().cloned());
        }

        self.send_exchange(session_id, &message).await
    }

    /// Send a prepared exchange, e.g. one carrying a team context
    pub async fn send_exchange(&self, session_id: &str, message: &MultiAgentExchangeFormat) -> bool {
        self.platform
            .send_message(session_id, message)
            .await
            .succeeded("send team message")
    }

    /// Assistant replies grouped by agent, groups in order of each agent's first reply
    pub async fn process_team_responses(&self, session_id: &str) -> Vec<AgentResponses> {
        let messages = self.fetch(session_id).await;

        let mut groups: Vec<AgentResponses> = Vec::new();
        for message in messages.iter().filter(|m| m.is_assistant()) {
            let agent_name = message.agent_name();
            let response = AgentResponse {
                agent_name: agent_name.to_string(),
                content: message.content.clone(),
                timestamp: message.timestamp.clone(),
                structured_content: parse_content_blocks(&message.content),
            };

            match groups.iter_mut().find(|g| g.agent_name == agent_name) {
                Some(group) => group.responses.push(response),
                None => groups.push(AgentResponses {
                    agent_name: agent_name.to_string(),
                    responses: vec![response],
                }),
            }
        }
        groups
    }

    /// Export the session's assistant output as local results.
    ///
    /// The agent filter is applied first; when nothing survives it the export is empty
    /// whatever the format.
    pub async fn export_team_results(
        &self,
        session_id: &str,
        options: &ExportOptions,
    ) -> Vec<ResultItem> {
        let messages = self.fetch(session_id).await;

        let included = |message: &RemoteMessage| match &options.include_agents {
            Some(agents) => agents.iter().any(|a| a == message.agent_name()),
            None => true,
        };
        let retained: Vec<&RemoteMessage> = messages
            .iter()
            .filter(|m| m.is_assistant() && included(*m))
            .collect();

        if retained.is_empty() {
            return Vec::new();
        }

        match options.format {
            ExportFormat::Individual => export_individual(&retained),
            ExportFormat::Combined => export_combined(session_id, &retained),
            ExportFormat::Raw => {
                let transcript: Vec<&RemoteMessage> = messages
                    .iter()
                    .filter(|m| !m.is_assistant() || included(*m))
                    .collect();
                vec![export_raw(session_id, &transcript)]
            }
        }
    }

    /// The session's assistant replies as a team context for a follow-up message
    pub async fn build_team_context(&self, team_id: &str, session_id: &str) -> TeamContext {
        let previous_contributions = self
            .fetch(session_id)
            .await
            .into_iter()
            .filter(|m| m.is_assistant())
            .map(|m| Contribution {
                agent_name: m.agent_name().to_string(),
                content: m.content,
                timestamp: m.timestamp,
            })
            .collect();

        TeamContext {
            team_id: team_id.to_string(),
            conversation_id: session_id.to_string(),
            previous_contributions,
        }
    }

    async fn fetch(&self, session_id: &str) -> Vec<RemoteMessage> {
        self.platform
            .get_messages(session_id)
            .await
            .or_empty("get session messages")
    }
}

fn export_individual(messages: &[&RemoteMessage]) -> Vec<ResultItem> {
    messages
        .iter()
        .enumerate()
        .map(|(index, message)| {
            ResultItem::new(
                &message.id,
                format!("{} - Response {}", message.agent_name(), index + 1),
                &message.content,
                ResultType::Text,
            )
            .with_metadata(remote_metadata(message))
        })
        .collect()
}

fn export_combined(session_id: &str, messages: &[&RemoteMessage]) -> Vec<ResultItem> {
    let mut agents: Vec<(&str, Vec<&RemoteMessage>)> = Vec::new();
    for message in messages.iter().copied() {
        let name = message.agent_name();
        match agents.iter_mut().find(|(agent, _)| *agent == name) {
            Some((_, grouped)) => grouped.push(message),
            None => agents.push((name, vec![message])),
        }
    }

    agents
        .into_iter()
        .enumerate()
        .map(|(index, (agent, grouped))| {
            let body = grouped
                .iter()
                .map(|m| m.content.as_str())
                .collect::<Vec<_>>()
                .join("\n\n");

            let mut metadata = serde_json::Map::new();
            metadata.insert("sessionId".to_string(), json!(session_id));
            metadata.insert("agentName".to_string(), json!(agent));
            metadata.insert("messageCount".to_string(), json!(grouped.len()));

            ResultItem::new(
                format!("{}-agent-{}", session_id, index),
                format!("{} Contributions", agent),
                format!("## {}\n\n{}", agent, body),
                ResultType::Text,
            )
            .with_metadata(metadata)
        })
        .collect()
}

fn export_raw(session_id: &str, messages: &[&RemoteMessage]) -> ResultItem {
    let transcript = messages
        .iter()
        .map(|m| {
            let speaker = if m.is_assistant() {
                m.agent_name().to_string()
            } else {
                m.role.to_uppercase()
            };
            format!("**{}** ({}):\n{}", speaker, m.role, m.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut metadata = serde_json::Map::new();
    metadata.insert("sessionId".to_string(), json!(session_id));
    metadata.insert("messageCount".to_string(), json!(messages.len()));

    ResultItem::new(
        format!("{}-transcript", session_id),
        format!("Team Session {} Transcript", session_id),
        transcript,
        ResultType::Text,
    )
    .with_metadata(metadata)
}
