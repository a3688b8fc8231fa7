use serde_json::Value;
use value_ext::JsonValueExt;

use crate::chat::{ContentBlock, Usage};
use crate::error::{Error, Result};

/// The decoded form of an OpenAI-compatible Chat Completions response, ready for
/// `translate::envelope` to wrap into the Anthropic-style reply (spec.md §4.1.4).
pub struct DecodedResponse {
	pub content: Vec<ContentBlock>,
	pub stop_reason: &'static str,
	pub usage: Usage,
}

/// Decodes `choices[0].message` into the generic content-block vocabulary (spec.md §4.1.4).
pub fn decode(body: &Value) -> Result<DecodedResponse> {
	if body.get("error").is_some() {
		return Err(Error::UpstreamUnparseable(body.to_string()));
	}

	let choice = body.pointer("/choices/0").ok_or(Error::UpstreamEmpty("choices"))?;
	let message = choice.get("message").ok_or(Error::UpstreamEmpty("choices"))?;

	let mut content = Vec::new();

	if let Some(reasoning) = message.get("reasoning_content").and_then(Value::as_str).filter(|s| !s.is_empty()) {
		content.push(ContentBlock::Thinking { thinking: reasoning.to_string(), signature: None });
	}

	if let Some(text) = message.get("content").and_then(Value::as_str).filter(|s| !s.is_empty()) {
		content.push(ContentBlock::Text { text: text.to_string() });
	}

	let tool_calls = message.get("tool_calls").and_then(Value::as_array).cloned().unwrap_or_default();
	let has_tool_calls = !tool_calls.is_empty();
	for call in &tool_calls {
		let id = call.get("id").and_then(Value::as_str).unwrap_or_default().to_string();
		let name = call.pointer("/function/name").and_then(Value::as_str).unwrap_or_default().to_string();
		let arguments_str = call.pointer("/function/arguments").and_then(Value::as_str).unwrap_or("{}");
		let input = serde_json::from_str(arguments_str).unwrap_or_else(|_| serde_json::json!({}));
		content.push(ContentBlock::ToolUse { id, name, input, signature: None });
	}

	let stop_reason = if has_tool_calls { "tool_use" } else { "end_turn" };
	let usage = body.get("usage").map(decode_usage).unwrap_or_default();

	Ok(DecodedResponse { content, stop_reason, usage })
}

fn decode_usage(usage: &Value) -> Usage {
	Usage {
		prompt_tokens: usage.x_get("prompt_tokens").unwrap_or(0),
		completion_tokens: usage.x_get("completion_tokens").unwrap_or(0),
		total_tokens: usage.x_get("total_tokens").unwrap_or(0),
	}
}
