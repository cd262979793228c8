use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Text,
    Code,
    Image,
    Link,
    File,
    Table,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// A typed segment of a larger document; position in the parent sequence is document order
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl ContentBlock {
    pub fn new<S: Into<String>>(block_type: BlockType, content: S) -> Self {
        ContentBlock {
            block_type,
            content: content.into(),
            language: None,
            title: None,
            metadata: None,
        }
    }

    pub fn text<S: Into<String>>(content: S) -> Self {
        Self::new(BlockType::Text, content)
    }

    pub fn code<S: Into<String>>(content: S, language: Option<String>) -> Self {
        ContentBlock {
            language,
            ..Self::new(BlockType::Code, content)
        }
    }

    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_language<S: Into<String>>(mut self, language: S) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Get the content if this is a text block
    pub fn as_text(&self) -> Option<&str> {
        match self.block_type {
            BlockType::Text => Some(&self.content),
            _ => None,
        }
    }

    /// Get the content and language if this is a code block
    pub fn as_code(&self) -> Option<(&str, Option<&str>)> {
        match self.block_type {
            BlockType::Code => Some((&self.content, self.language.as_deref())),
            _ => None,
        }
    }
}
