use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const TEAM_COMPONENT_TYPE: &str = "team";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamComponentConfig {
    #[serde(default)]
    pub participants: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Team definition accepted by `POST /teams/import`
pub struct TeamConfig {
    pub component_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub config: TeamComponentConfig,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TeamConfig {
    pub fn new<S: Into<String>>(name: S, participants: Vec<Value>) -> Self {
        TeamConfig {
            component_type: TEAM_COMPONENT_TYPE.to_string(),
            name: Some(name.into()),
            description: None,
            config: TeamComponentConfig {
                participants,
                extra: Map::new(),
            },
            extra: Map::new(),
        }
    }

    /// Check the shape the platform requires before anything is sent
    pub fn validate(&self) -> Result<(), String> {
        if self.component_type != TEAM_COMPONENT_TYPE {
            return Err(format!(
                "component_type must be \"{}\", got \"{}\"",
                TEAM_COMPONENT_TYPE, self.component_type
            ));
        }
        if self.config.participants.is_empty() {
            return Err("config.participants must not be empty".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    #[serde(deserialize_with = "crate::models::string_or_number")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    #[serde(deserialize_with = "crate::models::string_or_number")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Body of `POST /agents`
pub struct AgentSpec {
    pub name: String,
    pub system_message: String,
    pub model: String,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCreated {
    #[serde(deserialize_with = "crate::models::string_or_number")]
    pub id: String,
}
