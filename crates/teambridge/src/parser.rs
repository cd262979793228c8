//! Segmentation of free text into typed content blocks

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::models::content::{BlockType, ContentBlock};
use crate::models::exchange::ContentType;

lazy_static! {
    // The newline closing the opening fence line and the one before the closing fence are
    // part of the fence, not of the code.
    static ref FENCE: Regex = Regex::new(r"```([\w+#.-]*)[ \t]*\r?\n([\s\S]*?)\r?\n?```").unwrap();
    static ref MARKDOWN_SIGNALS: Vec<Regex> = vec![
        Regex::new(r"(?m)^#{1,6}\s+\S").unwrap(),
        Regex::new(r"(?m)^\s*[*-]\s+\S").unwrap(),
        Regex::new(r"\[[^\]]+\]\([^)]+\)").unwrap(),
        Regex::new(r"!\[[^\]]*\]\([^)]+\)").unwrap(),
        Regex::new(r"`[^`\n]+`").unwrap(),
        Regex::new(r"(?m)^>\s+\S").unwrap(),
    ];
}

/// Split `text` into prose and fenced code blocks, in document order.
///
/// Prose between fences is trimmed and dropped when blank; code is kept verbatim.
/// Blank input yields no blocks at all.
pub fn parse_content_blocks(text: &str) -> Vec<ContentBlock> {
    let mut blocks = Vec::new();
    let mut cursor = 0;

    for captures in FENCE.captures_iter(text) {
        let Some(fence) = captures.get(0) else {
            continue;
        };

        push_text(&mut blocks, &text[cursor..fence.start()]);

        let language = captures
            .get(1)
            .map(|m| m.as_str())
            .filter(|tag| !tag.is_empty())
            .map(String::from);
        let code = captures.get(2).map(|m| m.as_str()).unwrap_or_default();
        blocks.push(ContentBlock::code(code, language));

        cursor = fence.end();
    }

    push_text(&mut blocks, &text[cursor..]);
    blocks
}

fn push_text(blocks: &mut Vec<ContentBlock>, span: &str) {
    let trimmed = span.trim();
    if !trimmed.is_empty() {
        blocks.push(ContentBlock::text(trimmed));
    }
}

/// Classify free text into the coarse exchange content types
pub fn detect_content_type(text: &str) -> ContentType {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return ContentType::Text;
    }

    if let Some(fence) = FENCE.find(trimmed) {
        if fence.start() == 0 && fence.end() == trimmed.len() {
            return ContentType::Code;
        }
    }

    if matches!(
        serde_json::from_str::<Value>(trimmed),
        Ok(Value::Object(_)) | Ok(Value::Array(_))
    ) {
        return ContentType::Structured;
    }

    let blocks = parse_content_blocks(trimmed);
    let has_code = blocks.iter().any(|b| b.block_type == BlockType::Code);
    let has_text = blocks.iter().any(|b| b.block_type == BlockType::Text);
    if has_code && has_text {
        return ContentType::Mixed;
    }

    let signals = MARKDOWN_SIGNALS
        .iter()
        .filter(|pattern| pattern.is_match(trimmed))
        .count();
    if signals >= 2 {
        ContentType::Markdown
    } else {
        ContentType::Text
    }
}

/// Render a fenced code block, tagging it with `language` when known
pub fn code_fence(code: &str, language: Option<&str>) -> String {
    format!("```{}\n{}\n```", language.unwrap_or_default(), code)
}

/// Render blocks back into a single markdown document
pub fn render_blocks(blocks: &[ContentBlock]) -> String {
    blocks
        .iter()
        .map(render_block)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn render_block(block: &ContentBlock) -> String {
    let title = block.title.as_deref();
    match block.block_type {
        BlockType::Code => code_fence(&block.content, block.language.as_deref()),
        BlockType::Link | BlockType::File => {
            format!("[{}]({})", title.unwrap_or(block.content.as_str()), block.content)
        }
        BlockType::Image => format!("![{}]({})", title.unwrap_or_default(), block.content),
        BlockType::Text | BlockType::Table => block.content.clone(),
    }
}
