//! Conversion between local results/messages and the neutral exchange format
//!
//! Outgoing conversions validate their input and fail with [`ExchangeError::InvalidInput`];
//! incoming projections of remote messages never fail.

use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::errors::{ExchangeError, ExchangeResult};
use crate::models::content::{BlockType, ContentBlock};
use crate::models::exchange::{ContentType, ExchangeFormat, ExchangeMetadata};
use crate::models::message::{ChatMessage, RemoteMessage, Role};
use crate::models::result_item::{ResultItem, ResultType};
use crate::parser::{code_fence, parse_content_blocks};

pub const DEFAULT_SOURCE: &str = "teambridge";

#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeOptions {
    /// Value of `metadata.source`
    pub source: String,
    /// Render results as markdown sections even when they all share one type
    pub preserve_formatting: bool,
    /// Render chat messages as markdown sections
    pub format_as_markdown: bool,
    /// Attach a structured block view
    pub include_blocks: bool,
    /// Merged into the metadata last, overriding computed fields
    pub custom_metadata: Map<String, Value>,
}

impl Default for ExchangeOptions {
    fn default() -> Self {
        ExchangeOptions {
            source: DEFAULT_SOURCE.to_string(),
            preserve_formatting: true,
            format_as_markdown: false,
            include_blocks: false,
            custom_metadata: Map::new(),
        }
    }
}

impl ExchangeOptions {
    pub fn with_source<S: Into<String>>(mut self, source: S) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_blocks(mut self) -> Self {
        self.include_blocks = true;
        self
    }

    pub fn plain(mut self) -> Self {
        self.preserve_formatting = false;
        self.format_as_markdown = false;
        self
    }

    pub fn markdown(mut self) -> Self {
        self.format_as_markdown = true;
        self
    }

    pub fn with_metadata<K: Into<String>>(mut self, key: K, value: Value) -> Self {
        self.custom_metadata.insert(key.into(), value);
        self
    }
}

/// Uniform `code` results are code, any other uniform type is text, and a mix is markdown.
///
/// Heterogeneous sets collapse to markdown even when none of the items is prose.
pub fn content_type_for_results(results: &[ResultItem]) -> ContentType {
    let Some(first) = results.first() else {
        return ContentType::Text;
    };

    if results.iter().all(|r| r.result_type == first.result_type) {
        match first.result_type {
            ResultType::Code => ContentType::Code,
            _ => ContentType::Text,
        }
    } else {
        ContentType::Markdown
    }
}

/// Convert local results into an exchange envelope
pub fn results_to_exchange(
    results: &[ResultItem],
    options: &ExchangeOptions,
) -> ExchangeResult<ExchangeFormat> {
    if results.is_empty() {
        return Err(ExchangeError::InvalidInput(
            "results must be a non-empty list of result items".to_string(),
        ));
    }

    let content_type = content_type_for_results(results);
    let content = if content_type == ContentType::Markdown || options.preserve_formatting {
        results
            .iter()
            .map(render_result_section)
            .collect::<Vec<_>>()
            .join("\n\n")
    } else {
        results
            .iter()
            .map(|r| format!("{}: {}", r.title, r.content))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let mut content_types: Vec<&str> = Vec::new();
    for result in results {
        let name = result.result_type.as_str();
        if !content_types.contains(&name) {
            content_types.push(name);
        }
    }

    let mut metadata = ExchangeMetadata::new(options.source.clone())
        .with("resultCount", json!(results.len()))
        .with("contentTypes", json!(content_types));
    metadata.merge(&options.custom_metadata);

    let exchange = ExchangeFormat::new(content, content_type, metadata);
    if options.include_blocks {
        Ok(exchange.with_blocks(results.iter().map(result_to_block).collect()))
    } else {
        Ok(exchange)
    }
}

fn render_result_section(result: &ResultItem) -> String {
    let body = match result.result_type {
        ResultType::Code => code_fence(&result.content, result.language()),
        ResultType::Link => format!("[{}]({})", result.title, result.content),
        ResultType::Image => format!("![{}]({})", result.title, result.content),
        ResultType::Text | ResultType::File => result.content.clone(),
    };
    format!("## {}\n\n{}", result.title, body)
}

fn result_to_block(result: &ResultItem) -> ContentBlock {
    let mut block = ContentBlock::new(BlockType::from(result.result_type), &result.content)
        .with_title(&result.title);
    if let Some(language) = result.language() {
        block = block.with_language(language);
    }
    if let Some(metadata) = &result.metadata {
        block = block.with_metadata(metadata.clone());
    }
    block
}

/// Convert a local conversation into an exchange envelope
pub fn messages_to_exchange(
    messages: &[ChatMessage],
    options: &ExchangeOptions,
) -> ExchangeResult<ExchangeFormat> {
    if messages.is_empty() {
        return Err(ExchangeError::InvalidInput(
            "messages must be a non-empty list of chat messages".to_string(),
        ));
    }

    let (content, content_type) = if options.format_as_markdown {
        let content = messages
            .iter()
            .map(|m| format!("### {}\n\n{}", m.role.as_str().to_uppercase(), m.content))
            .collect::<Vec<_>>()
            .join("\n\n");
        (content, ContentType::Markdown)
    } else {
        let content = messages
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n");
        (content, ContentType::Text)
    };

    let mut roles: Vec<&str> = Vec::new();
    for message in messages {
        if !roles.contains(&message.role.as_str()) {
            roles.push(message.role.as_str());
        }
    }

    let mut metadata = ExchangeMetadata::new(options.source.clone())
        .with("messageCount", json!(messages.len()))
        .with("roles", json!(roles));
    metadata.merge(&options.custom_metadata);

    let exchange = ExchangeFormat::new(content, content_type, metadata);
    if options.include_blocks {
        let blocks = messages
            .iter()
            .map(|m| ContentBlock::text(&m.content).with_title(m.role.as_str()))
            .collect();
        Ok(exchange.with_blocks(blocks))
    } else {
        Ok(exchange)
    }
}

/// Project assistant replies into local results, splitting multi-block replies into one
/// result per block.
pub fn remote_messages_to_result_items(messages: &[RemoteMessage]) -> Vec<ResultItem> {
    let mut results = Vec::new();

    for message in messages.iter().filter(|m| m.is_assistant()) {
        let agent = message.agent_name();
        let blocks = parse_content_blocks(&message.content);

        if blocks.len() <= 1 {
            let mut metadata = remote_metadata(message);
            // A lone fenced block keeps only its interior so it can be fenced again later
            let (result_type, content) = match blocks.into_iter().next() {
                Some(block) if block.block_type == BlockType::Code => {
                    if let Some(language) = &block.language {
                        metadata.insert("language".to_string(), json!(language));
                    }
                    (ResultType::Code, block.content)
                }
                _ => (ResultType::Text, message.content.clone()),
            };
            results.push(
                ResultItem::new(
                    &message.id,
                    format!("Response from {}", agent),
                    content,
                    result_type,
                )
                .with_metadata(metadata),
            );
            continue;
        }

        for (index, block) in blocks.into_iter().enumerate() {
            let result_type = ResultType::from(block.block_type);
            let mut metadata = remote_metadata(message);
            metadata.insert("blockIndex".to_string(), json!(index));
            if let Some(language) = &block.language {
                metadata.insert("language".to_string(), json!(language));
            }
            let title = block
                .title
                .clone()
                .unwrap_or_else(|| format!("{} ({} {})", agent, result_type.as_str(), index + 1));
            results.push(
                ResultItem::new(
                    format!("{}-{}", message.id, index),
                    title,
                    block.content,
                    result_type,
                )
                .with_metadata(metadata),
            );
        }
    }

    results
}

pub(crate) fn remote_metadata(message: &RemoteMessage) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("messageId".to_string(), json!(message.id));
    metadata.insert("sessionId".to_string(), json!(message.session_id));
    metadata.insert("agentName".to_string(), json!(message.agent_name()));
    metadata.insert("timestamp".to_string(), json!(message.timestamp));
    metadata
}

/// One chat message per remote message, roles preserved.
///
/// Roles the platform reports beyond user, assistant and system (such as `tool`) become
/// [`Role::Assistant`].
pub fn remote_messages_to_chat_messages(messages: &[RemoteMessage]) -> Vec<ChatMessage> {
    messages
        .iter()
        .map(|m| ChatMessage {
            id: m.id.clone(),
            role: Role::from_remote(&m.role),
            content: m.content.clone(),
            timestamp: m.timestamp.clone(),
        })
        .collect()
}

/// Turn an exchange back into local results, from its blocks when present or by parsing
/// its rendered content otherwise
pub fn exchange_to_result_items(exchange: &ExchangeFormat) -> Vec<ResultItem> {
    let blocks = match &exchange.blocks {
        Some(blocks) => blocks.clone(),
        None => parse_content_blocks(&exchange.content),
    };

    blocks
        .into_iter()
        .enumerate()
        .map(|(index, block)| {
            let result_type = ResultType::from(block.block_type);
            let mut metadata = block.metadata.clone().unwrap_or_default();
            metadata.insert("source".to_string(), json!(exchange.metadata.source));
            if let Some(language) = &block.language {
                metadata.insert("language".to_string(), json!(language));
            }
            let title = block
                .title
                .clone()
                .unwrap_or_else(|| format!("Block {}", index + 1));
            ResultItem::new(Uuid::new_v4().to_string(), title, block.content, result_type)
                .with_metadata(metadata)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_item(id: &str, title: &str, content: &str) -> ResultItem {
        ResultItem::new(id, title, content, ResultType::Text)
    }

    fn remote(id: &str, role: &str, agent: Option<&str>, content: &str) -> RemoteMessage {
        RemoteMessage {
            id: id.to_string(),
            session_id: "sess-1".to_string(),
            role: role.to_string(),
            content: content.to_string(),
            timestamp: "2024-05-01T10:00:00Z".to_string(),
            metadata: agent.map(|name| {
                let mut metadata = Map::new();
                metadata.insert("agentName".to_string(), json!(name));
                metadata
            }),
        }
    }

    #[test]
    fn test_uniform_text_results_render_as_sections() -> anyhow::Result<()> {
        let results = vec![
            text_item("1", "Summary", "All good"),
            text_item("2", "Notes", "Nothing else"),
        ];
        let exchange = results_to_exchange(&results, &ExchangeOptions::default())?;

        assert_eq!(exchange.content_type, ContentType::Text);
        assert_eq!(
            exchange.content,
            "## Summary\n\nAll good\n\n## Notes\n\nNothing else"
        );
        assert!(exchange.blocks.is_none());
        Ok(())
    }

    #[test]
    fn test_plain_rendering() -> anyhow::Result<()> {
        let results = vec![
            text_item("1", "Summary", "All good"),
            text_item("2", "Notes", "Nothing else"),
        ];
        let exchange = results_to_exchange(&results, &ExchangeOptions::default().plain())?;
        assert_eq!(exchange.content, "Summary: All good\nNotes: Nothing else");
        Ok(())
    }

    #[test]
    fn test_mixed_types_are_markdown() -> anyhow::Result<()> {
        let mut language = Map::new();
        language.insert("language".to_string(), json!("python"));
        let results = vec![
            text_item("1", "Intro", "Here is the fix"),
            ResultItem::new("2", "Patch", "print(1)", ResultType::Code).with_metadata(language),
        ];

        let exchange = results_to_exchange(&results, &ExchangeOptions::default().plain())?;
        assert_eq!(exchange.content_type, ContentType::Markdown);
        assert_eq!(
            exchange.content,
            "## Intro\n\nHere is the fix\n\n## Patch\n\n```python\nprint(1)\n```"
        );
        Ok(())
    }

    #[test]
    fn test_uniform_code_is_code_and_other_uniform_types_are_text() {
        let code = vec![ResultItem::new("1", "a", "x", ResultType::Code)];
        assert_eq!(content_type_for_results(&code), ContentType::Code);

        let links = vec![
            ResultItem::new("1", "a", "https://a", ResultType::Link),
            ResultItem::new("2", "b", "https://b", ResultType::Link),
        ];
        assert_eq!(content_type_for_results(&links), ContentType::Text);

        let media = vec![
            ResultItem::new("1", "a", "https://a", ResultType::Link),
            ResultItem::new("2", "b", "https://b.png", ResultType::Image),
        ];
        assert_eq!(content_type_for_results(&media), ContentType::Markdown);
    }

    #[test]
    fn test_link_and_image_sections() -> anyhow::Result<()> {
        let results = vec![
            ResultItem::new("1", "Docs", "https://example.com", ResultType::Link),
            ResultItem::new("2", "Chart", "https://example.com/c.png", ResultType::Image),
        ];
        let exchange = results_to_exchange(&results, &ExchangeOptions::default())?;
        assert_eq!(
            exchange.content,
            "## Docs\n\n[Docs](https://example.com)\n\n## Chart\n\n![Chart](https://example.com/c.png)"
        );
        Ok(())
    }

    #[test]
    fn test_empty_results_are_rejected() {
        let err = results_to_exchange(&[], &ExchangeOptions::default()).unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidInput(_)));
    }

    #[test]
    fn test_result_metadata() -> anyhow::Result<()> {
        let results = vec![
            text_item("1", "a", "x"),
            ResultItem::new("2", "b", "y", ResultType::Code),
            text_item("3", "c", "z"),
        ];
        let options = ExchangeOptions::default()
            .with_source("local-agent")
            .with_metadata("resultCount", json!("custom"))
            .with_metadata("project", json!("demo"));

        let exchange = results_to_exchange(&results, &options)?;
        let metadata = &exchange.metadata;

        assert_eq!(metadata.source, "local-agent");
        assert!(chrono::DateTime::parse_from_rfc3339(&metadata.timestamp).is_ok());
        assert_eq!(metadata.get("resultCount"), Some(json!("custom")));
        assert_eq!(metadata.get("contentTypes"), Some(json!(["text", "code"])));
        assert_eq!(metadata.get("project"), Some(json!("demo")));
        Ok(())
    }

    #[test]
    fn test_result_blocks_map_one_to_one() -> anyhow::Result<()> {
        let results = vec![
            text_item("1", "Intro", "Some prose\n```sh\nls\n```"),
            ResultItem::new("2", "Site", "https://example.com", ResultType::Link),
        ];
        let exchange = results_to_exchange(&results, &ExchangeOptions::default().with_blocks())?;
        let blocks = exchange.blocks.expect("blocks requested");

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].block_type, BlockType::Text);
        assert_eq!(blocks[0].content, "Some prose\n```sh\nls\n```");
        assert_eq!(blocks[1].block_type, BlockType::Link);
        assert_eq!(blocks[1].title.as_deref(), Some("Site"));
        Ok(())
    }

    #[test]
    fn test_messages_to_exchange() -> anyhow::Result<()> {
        let messages = vec![
            ChatMessage::user("What changed?"),
            ChatMessage::assistant("Two files."),
        ];

        let plain = messages_to_exchange(&messages, &ExchangeOptions::default())?;
        assert_eq!(plain.content_type, ContentType::Text);
        assert_eq!(plain.content, "user: What changed?\nassistant: Two files.");

        let markdown =
            messages_to_exchange(&messages, &ExchangeOptions::default().markdown().with_blocks())?;
        assert_eq!(markdown.content_type, ContentType::Markdown);
        assert_eq!(
            markdown.content,
            "### USER\n\nWhat changed?\n\n### ASSISTANT\n\nTwo files."
        );
        assert_eq!(markdown.metadata.get("messageCount"), Some(json!(2)));
        assert_eq!(
            markdown.metadata.get("roles"),
            Some(json!(["user", "assistant"]))
        );
        assert_eq!(markdown.blocks.map(|b| b.len()), Some(2));
        Ok(())
    }

    #[test]
    fn test_empty_messages_are_rejected() {
        assert!(messages_to_exchange(&[], &ExchangeOptions::default()).is_err());
    }

    #[test]
    fn test_remote_messages_split_into_blocks() {
        let messages = vec![
            remote("m1", "user", None, "please fix"),
            remote(
                "m2",
                "assistant",
                Some("coder"),
                "Fixed:\n```rust\nfn main() {}\n```\nDone.",
            ),
            remote("m3", "assistant", Some("reviewer"), "Looks fine"),
        ];

        let results = remote_messages_to_result_items(&messages);
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["m2-0", "m2-1", "m2-2", "m3"]);

        assert_eq!(results[0].result_type, ResultType::Text);
        assert_eq!(results[0].content, "Fixed:");
        assert_eq!(results[1].result_type, ResultType::Code);
        assert_eq!(results[1].content, "fn main() {}");
        assert_eq!(results[1].language(), Some("rust"));
        assert_eq!(results[3].title, "Response from reviewer");
        assert_eq!(results[3].content, "Looks fine");
    }

    #[test]
    fn test_remote_message_without_content_is_kept_whole() {
        let results = remote_messages_to_result_items(&[remote("m1", "assistant", None, "")]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "m1");
        assert_eq!(results[0].title, "Response from Unknown Agent");
    }

    #[test]
    fn test_fenced_only_reply_keeps_interior() -> anyhow::Result<()> {
        let results = remote_messages_to_result_items(&[remote(
            "m1",
            "assistant",
            Some("coder"),
            "```rust\nfn main() {}\n```",
        )]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "m1");
        assert_eq!(results[0].result_type, ResultType::Code);
        assert_eq!(results[0].content, "fn main() {}");
        assert_eq!(results[0].language(), Some("rust"));

        let exchange = results_to_exchange(&results, &ExchangeOptions::default())?;
        assert_eq!(
            exchange.content,
            "## Response from coder\n\n```rust\nfn main() {}\n```"
        );

        let reparsed = parse_content_blocks(&exchange.content);
        assert_eq!(reparsed.len(), 2);
        assert_eq!(reparsed[0].as_text(), Some("## Response from coder"));
        assert_eq!(reparsed[1].as_code(), Some(("fn main() {}", Some("rust"))));
        Ok(())
    }

    #[test]
    fn test_single_text_reply_is_kept_whole() {
        let results =
            remote_messages_to_result_items(&[remote("m1", "assistant", None, "  all good\n")]);
        assert_eq!(results[0].result_type, ResultType::Text);
        assert_eq!(results[0].content, "  all good\n");
        assert_eq!(results[0].language(), None);
    }

    #[test]
    fn test_remote_messages_to_chat_messages() {
        assert!(remote_messages_to_chat_messages(&[]).is_empty());

        let chat = remote_messages_to_chat_messages(&[
            remote("m1", "user", None, "hi"),
            remote("m2", "assistant", Some("coder"), "hello"),
            remote("m3", "system", None, "reset"),
        ]);
        let roles: Vec<Role> = chat.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::System]);
        assert_eq!(chat[1].id, "m2");
        assert_eq!(chat[1].content, "hello");

        let tool = remote_messages_to_chat_messages(&[remote("m4", "tool", None, "42")]);
        assert_eq!(tool[0].role, Role::Assistant);
    }

    #[test]
    fn test_exchange_back_to_results() -> anyhow::Result<()> {
        let results = vec![
            text_item("1", "Intro", "prose"),
            ResultItem::new("2", "Patch", "x = 1", ResultType::Code),
        ];
        let with_blocks =
            results_to_exchange(&results, &ExchangeOptions::default().with_blocks())?;
        let restored = exchange_to_result_items(&with_blocks);
        assert_eq!(restored.len(), 2);
        assert_eq!(restored[0].title, "Intro");
        assert_eq!(restored[1].result_type, ResultType::Code);

        let without_blocks = ExchangeFormat::new(
            "Run:\n```sh\nmake\n```",
            ContentType::Mixed,
            ExchangeMetadata::new("remote"),
        );
        let parsed = exchange_to_result_items(&without_blocks);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].content, "make");
        assert_eq!(parsed[1].language(), Some("sh"));
        Ok(())
    }
}
