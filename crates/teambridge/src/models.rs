//! These models represent the values passed across the exchange layer
//!
//! There are two sides we need to interact with:
//! - local result items and chat messages, produced by the local agent system
//! - remote messages, teams and agents, as served by the team platform's REST API
//!
//! Neither side is converted into the other directly. Local values are first turned into
//! the neutral exchange format (see [`exchange`]), which is what travels over the wire,
//! and remote replies are projected back into the local shapes by the converter.
pub mod content;
pub mod exchange;
pub mod message;
pub mod result_item;
pub mod team;

use serde::{Deserialize, Deserializer};

/// Platform ids arrive as JSON strings or numbers; both are kept as strings
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(id) => id,
        Id::Number(id) => id.to_string(),
    })
}
