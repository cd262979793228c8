use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::content::BlockType;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    Text,
    Image,
    Link,
    Code,
    File,
}

impl ResultType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultType::Text => "text",
            ResultType::Image => "image",
            ResultType::Link => "link",
            ResultType::Code => "code",
            ResultType::File => "file",
        }
    }
}

impl From<BlockType> for ResultType {
    fn from(block_type: BlockType) -> Self {
        match block_type {
            BlockType::Text | BlockType::Table => ResultType::Text,
            BlockType::Code => ResultType::Code,
            BlockType::Image => ResultType::Image,
            BlockType::Link => ResultType::Link,
            BlockType::File => ResultType::File,
        }
    }
}

impl From<ResultType> for BlockType {
    fn from(result_type: ResultType) -> Self {
        match result_type {
            ResultType::Text => BlockType::Text,
            ResultType::Code => BlockType::Code,
            ResultType::Image => BlockType::Image,
            ResultType::Link => BlockType::Link,
            ResultType::File => BlockType::File,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A result produced by the local agent system. Uniqueness of `id` is up to the caller.
pub struct ResultItem {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub result_type: ResultType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl ResultItem {
    pub fn new<I, T, C>(id: I, title: T, content: C, result_type: ResultType) -> Self
    where
        I: Into<String>,
        T: Into<String>,
        C: Into<String>,
    {
        ResultItem {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            result_type,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// The `metadata.language` hint, if present
    pub fn language(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("language"))
            .and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_blocks_become_text_results() {
        assert_eq!(ResultType::from(BlockType::Table), ResultType::Text);
        assert_eq!(ResultType::from(BlockType::Code), ResultType::Code);
    }

    #[test]
    fn test_language_hint() -> anyhow::Result<()> {
        let item: ResultItem = serde_json::from_value(json!({
            "id": "r1",
            "title": "Snippet",
            "content": "print(1)",
            "type": "code",
            "metadata": {"language": "python"}
        }))?;

        assert_eq!(item.result_type, ResultType::Code);
        assert_eq!(item.language(), Some("python"));
        Ok(())
    }
}
