use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{Value, json};

use crate::chat::{ContentBlock, Usage};

/// Builds the Anthropic-style response envelope returned to the client (spec.md §4.6 step
/// 10): `{id, type, role, model, content, stop_reason, usage, base_resp}`. Grounded on the
/// teacher's accessor-style `ChatResponse` and its usage-normalization idiom, but assembled
/// with `json!` rather than a dedicated `Serialize` struct — the shape is wire JSON end to
/// end and the teacher's adapters favor `Value` trees at exactly this kind of seam.
///
/// `serde_json` never HTML-escapes string content, so spec.md's "JSON encoding disables
/// HTML-escaping" requirement holds with no extra configuration.
pub fn build_response(model: &str, content: Vec<ContentBlock>, stop_reason: &'static str, usage: Usage) -> Value {
	json!({
		"id": message_id(),
		"type": "message",
		"role": "assistant",
		"model": model,
		"content": content,
		"stop_reason": stop_reason,
		"usage": {
			"input_tokens": usage.prompt_tokens,
			"output_tokens": usage.completion_tokens,
		},
		"base_resp": {
			"status_code": 0,
			"status_msg": "",
		},
	})
}

/// A hex-encoded nanosecond timestamp, per spec.md §4.6 step 10.
fn message_id() -> String {
	let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
	format!("{nanos:x}")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn builds_the_expected_shape() {
		let content = vec![ContentBlock::text("hello")];
		let usage = Usage { prompt_tokens: 5, completion_tokens: 1, total_tokens: 6 };
		let envelope = build_response("gemini-3-flash-preview", content, "end_turn", usage);

		assert_eq!(envelope["type"], "message");
		assert_eq!(envelope["role"], "assistant");
		assert_eq!(envelope["stop_reason"], "end_turn");
		assert_eq!(envelope["usage"]["input_tokens"], 5);
		assert_eq!(envelope["usage"]["output_tokens"], 1);
		assert_eq!(envelope["content"][0]["type"], "text");
		assert!(envelope["id"].as_str().is_some());
	}
}
