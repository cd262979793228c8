use std::collections::BTreeSet;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::content::ContentBlock;

/// Current time as an ISO-8601 string with millisecond precision
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Markdown,
    Code,
    Structured,
    Mixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Envelope metadata. `source` and `timestamp` are always present, everything else is additive.
pub struct ExchangeMetadata {
    pub source: String,
    pub timestamp: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExchangeMetadata {
    /// Create metadata stamped with the current time
    pub fn new<S: Into<String>>(source: S) -> Self {
        ExchangeMetadata {
            source: source.into(),
            timestamp: now_iso8601(),
            extra: Map::new(),
        }
    }

    /// Set a field, replacing any previous value under the same key.
    ///
    /// `source` and `timestamp` land on the typed fields so they can never go missing.
    pub fn insert<K: Into<String>>(&mut self, key: K, value: Value) {
        let key = key.into();
        match key.as_str() {
            "source" => self.source = value_to_string(value),
            "timestamp" => self.timestamp = value_to_string(value),
            _ => {
                self.extra.insert(key, value);
            }
        }
    }

    pub fn with<K: Into<String>>(mut self, key: K, value: Value) -> Self {
        self.insert(key, value);
        self
    }

    /// Merge every entry of `other` into this metadata, `other` winning on collision
    pub fn merge(&mut self, other: &Map<String, Value>) {
        for (key, value) in other {
            self.insert(key.clone(), value.clone());
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        match key {
            "source" => Some(Value::String(self.source.clone())),
            "timestamp" => Some(Value::String(self.timestamp.clone())),
            _ => self.extra.get(key).cloned(),
        }
    }
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Neutral envelope moved between the local system and the team platform.
///
/// `content` is always the fully rendered text; `blocks` is only a structured view of it.
pub struct ExchangeFormat {
    pub content: String,
    pub content_type: ContentType,
    pub metadata: ExchangeMetadata,
    /// Sent as `null` when no structured view was requested
    #[serde(default)]
    pub blocks: Option<Vec<ContentBlock>>,
}

impl ExchangeFormat {
    pub fn new<S: Into<String>>(
        content: S,
        content_type: ContentType,
        metadata: ExchangeMetadata,
    ) -> Self {
        ExchangeFormat {
            content: content.into(),
            content_type,
            metadata,
            blocks: None,
        }
    }

    pub fn with_blocks(mut self, blocks: Vec<ContentBlock>) -> Self {
        self.blocks = Some(blocks);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contribution {
    pub agent_name: String,
    pub content: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamContext {
    pub team_id: String,
    pub conversation_id: String,
    #[serde(default)]
    pub previous_contributions: Vec<Contribution>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// An exchange addressed to a team, optionally scoped to some of its agents
pub struct MultiAgentExchangeFormat {
    #[serde(flatten)]
    pub exchange: ExchangeFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_agents: Option<BTreeSet<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_context: Option<TeamContext>,
}

impl From<ExchangeFormat> for MultiAgentExchangeFormat {
    fn from(exchange: ExchangeFormat) -> Self {
        MultiAgentExchangeFormat {
            exchange,
            target_agents: None,
            team_context: None,
        }
    }
}

impl MultiAgentExchangeFormat {
    /// Scope the exchange to the given agents; an empty list leaves it addressed to the whole team
    pub fn with_target_agents<I, S>(mut self, agents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let agents: BTreeSet<String> = agents.into_iter().map(Into::into).collect();
        self.target_agents = if agents.is_empty() { None } else { Some(agents) };
        self
    }

    pub fn with_team_context(mut self, team_context: TeamContext) -> Self {
        self.team_context = Some(team_context);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metadata_custom_fields_override() {
        let mut metadata = ExchangeMetadata::new("local").with("resultCount", json!(2));
        let mut custom = Map::new();
        custom.insert("resultCount".to_string(), json!(99));
        custom.insert("source".to_string(), json!("override"));
        metadata.merge(&custom);

        assert_eq!(metadata.source, "override");
        assert_eq!(metadata.get("resultCount"), Some(json!(99)));
    }

    #[test]
    fn test_metadata_flattens_on_the_wire() -> anyhow::Result<()> {
        let metadata = ExchangeMetadata {
            source: "local".to_string(),
            timestamp: "2024-01-01T00:00:00.000Z".to_string(),
            extra: Map::new(),
        }
        .with("resultCount", json!(3));

        let value = serde_json::to_value(&metadata)?;
        assert_eq!(
            value,
            json!({
                "source": "local",
                "timestamp": "2024-01-01T00:00:00.000Z",
                "resultCount": 3
            })
        );
        Ok(())
    }

    #[test]
    fn test_multi_agent_wire_shape() -> anyhow::Result<()> {
        let exchange = ExchangeFormat::new(
            "hello team",
            ContentType::Text,
            ExchangeMetadata::new("local"),
        );
        let message = MultiAgentExchangeFormat::from(exchange)
            .with_target_agents(["reviewer", "coder", "reviewer"])
            .with_team_context(TeamContext {
                team_id: "team-1".to_string(),
                conversation_id: "sess-1".to_string(),
                previous_contributions: vec![],
            });

        let value = serde_json::to_value(&message)?;
        assert_eq!(value["content"], json!("hello team"));
        assert_eq!(value["contentType"], json!("text"));
        assert_eq!(value["targetAgents"], json!(["coder", "reviewer"]));
        assert_eq!(value["teamContext"]["teamId"], json!("team-1"));
        assert_eq!(value.get("blocks"), Some(&Value::Null));
        Ok(())
    }

    #[test]
    fn test_empty_targets_address_whole_team() {
        let exchange = ExchangeFormat::new("x", ContentType::Text, ExchangeMetadata::new("local"));
        let message = MultiAgentExchangeFormat::from(exchange).with_target_agents(Vec::<String>::new());
        assert!(message.target_agents.is_none());
    }
}
