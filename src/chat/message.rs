use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::chat::ContentBlock;

/// The four roles the generic request vocabulary recognizes (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
	System,
	User,
	Assistant,
	Tool,
}

/// `GenericMessage.content` is either a scalar string or an ordered array of content blocks.
/// Untagged, matching how Anthropic- and OpenAI-shaped clients both send this field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
	Text(String),
	Blocks(Vec<ContentBlock>),
}

impl MessageContent {
	/// All `text` blocks (or the scalar string) concatenated, ignoring other block kinds.
	pub fn joined_text(&self) -> String {
		match self {
			MessageContent::Text(s) => s.clone(),
			MessageContent::Blocks(blocks) => blocks
				.iter()
				.filter_map(ContentBlock::as_text)
				.collect::<Vec<_>>()
				.join(""),
		}
	}

	pub fn blocks(&self) -> Option<&[ContentBlock]> {
		match self {
			MessageContent::Blocks(b) => Some(b),
			MessageContent::Text(_) => None,
		}
	}
}

/// OpenAI-shaped tool call carried on an assistant `GenericMessage` (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRef {
	pub id: String,
	#[serde(default = "default_function_type")]
	#[serde(rename = "type")]
	pub kind: String,
	pub function: ToolCallFunction,
}

fn default_function_type() -> String {
	"function".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallFunction {
	pub name: String,
	/// Raw JSON-encoded arguments string, as OpenAI's wire format carries it.
	pub arguments: String,
}

/// A single message in a [`GenericRequest`](super::GenericRequest).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenericMessage {
	pub role: Role,
	pub content: MessageContent,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tool_calls: Option<Vec<ToolCallRef>>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tool_call_id: Option<String>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
}

impl GenericMessage {
	pub fn user(text: impl Into<String>) -> Self {
		Self {
			role: Role::User,
			content: MessageContent::Text(text.into()),
			tool_calls: None,
			tool_call_id: None,
			name: None,
		}
	}

	pub fn assistant(text: impl Into<String>) -> Self {
		Self {
			role: Role::Assistant,
			content: MessageContent::Text(text.into()),
			tool_calls: None,
			tool_call_id: None,
			name: None,
		}
	}
}

/// Builds the `{"result": ...}`/passthrough object a Gemini `functionResponse.response`
/// (or OpenAI `tool` message content) is built from, per spec.md §4.1.1.
pub fn tool_result_response_value(content: &Value) -> Value {
	match content {
		Value::String(s) => {
			// If the string itself parses as a JSON object, use that object directly.
			if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(s) {
				Value::Object(map)
			} else {
				serde_json::json!({ "result": s })
			}
		}
		Value::Object(_) => content.clone(),
		_ => serde_json::json!({ "result": "ok" }),
	}
}
