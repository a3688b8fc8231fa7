use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single content segment of a [`GenericMessage`](super::GenericMessage), tagged by `type`
/// the way Anthropic's `/v1/messages` content blocks are.
///
/// Mirrors the shape of `ContentPart` in the teacher crate, but tagged exactly as the wire
/// format requires (`#[serde(tag = "type")]`) since this crate decodes client JSON directly
/// rather than constructing these blocks in Rust.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
	Text {
		text: String,
	},
	Thinking {
		thinking: String,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		signature: Option<String>,
	},
	ToolUse {
		id: String,
		name: String,
		input: Value,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		signature: Option<String>,
	},
	ToolResult {
		tool_use_id: String,
		content: Value,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		is_error: Option<bool>,
	},
}

impl ContentBlock {
	pub fn text(text: impl Into<String>) -> Self {
		ContentBlock::Text { text: text.into() }
	}

	pub fn as_text(&self) -> Option<&str> {
		match self {
			ContentBlock::Text { text } => Some(text),
			_ => None,
		}
	}

	pub fn as_tool_use(&self) -> Option<(&str, &str, &Value)> {
		match self {
			ContentBlock::ToolUse { id, name, input, .. } => Some((id, name, input)),
			_ => None,
		}
	}
}
