use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use regex::Regex;
use serde_json::Value;
use value_ext::JsonValueExt;

use crate::cache::SignatureCache;
use crate::chat::{ContentBlock, Usage};
use crate::error::{Error, Result};

/// The decoded form of a Gemini `generateContent` response, ready for
/// `translate::envelope` to wrap into the Anthropic-style reply (spec.md §4.1.3).
pub struct DecodedResponse {
	pub content: Vec<ContentBlock>,
	pub stop_reason: &'static str,
	pub usage: Usage,
}

/// Decodes a Gemini response body into the generic content-block vocabulary
/// (spec.md §4.1.3, scenarios S1/S2/S5).
pub fn decode(body: &Value, signatures: &SignatureCache) -> Result<DecodedResponse> {
	if body.get("error").is_some() {
		return Err(Error::UpstreamUnparseable(body.to_string()));
	}

	let candidate = body.pointer("/candidates/0").ok_or(Error::UpstreamEmpty("candidates"))?;
	let parts = candidate.pointer("/content/parts").and_then(Value::as_array).cloned().unwrap_or_default();

	let mut thinking_text: Option<String> = None;
	let mut thinking_signature: Option<String> = None;
	let mut text_buf = String::new();
	let mut tool_use_blocks: Vec<ContentBlock> = Vec::new();
	let ts = unix_timestamp();
	let mut call_seq = 0u32;

	for part in &parts {
		let thought = part.get("thought").and_then(Value::as_bool).unwrap_or(false);
		let signature = part.get("thoughtSignature").and_then(Value::as_str).map(str::to_string);

		if let Some(text) = part.get("text").and_then(Value::as_str) {
			if thought {
				if thinking_text.is_none() {
					thinking_text = Some(text.to_string());
				}
			} else {
				text_buf.push_str(text);
			}
		}

		if thinking_signature.is_none() {
			thinking_signature = signature.clone();
		}

		if let Some(function_call) = part.get("functionCall") {
			call_seq += 1;
			let id = format!("call_function_{ts}_{call_seq}");
			let name = function_call.get("name").and_then(Value::as_str).unwrap_or_default().to_string();
			let input = function_call.get("args").cloned().unwrap_or_else(|| Value::Object(Default::default()));

			if let Some(sig) = &signature {
				signatures.record(id.clone(), sig.clone());
			}

			tool_use_blocks.push(ContentBlock::ToolUse { id, name, input, signature });
		}
	}

	let finish_reason = candidate.get("finishReason").and_then(Value::as_str);
	if finish_reason == Some("MALFORMED_FUNCTION_CALL") {
		if let Some(finish_message) = candidate.get("finishMessage").and_then(Value::as_str) {
			recover_malformed_call(finish_message, &mut tool_use_blocks, &mut text_buf, &ts, &mut call_seq);
		}
	}

	let mut content = Vec::new();
	if let Some(thinking) = thinking_text {
		content.push(ContentBlock::Thinking { thinking, signature: thinking_signature });
	}
	if !text_buf.is_empty() {
		content.push(ContentBlock::Text { text: text_buf });
	}
	let has_tool_use = !tool_use_blocks.is_empty();
	content.extend(tool_use_blocks);

	let stop_reason = if has_tool_use { "tool_use" } else { "end_turn" };
	let usage = body.get("usageMetadata").map(decode_usage).unwrap_or_default();

	Ok(DecodedResponse { content, stop_reason, usage })
}

fn unix_timestamp() -> String {
	SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs().to_string()
}

fn decode_usage(usage_metadata: &Value) -> Usage {
	let prompt_tokens: i64 = usage_metadata.x_get("promptTokenCount").unwrap_or(0);
	let candidate_tokens: i64 = usage_metadata.x_get("candidatesTokenCount").unwrap_or(0);
	// Gemini reports thinking tokens separately from `candidatesTokenCount`; fold them into
	// `completion_tokens` so downstream accounting matches the OpenAI-style usage shape
	// (spec.md §4.1.5, grounded on `GeminiAdapter::into_usage`'s thoughtsTokenCount rule).
	let thoughts_tokens: i64 = usage_metadata.x_get("thoughtsTokenCount").unwrap_or(0);
	let total_tokens: i64 = usage_metadata.x_get("totalTokenCount").unwrap_or(0);

	Usage { prompt_tokens, completion_tokens: candidate_tokens + thoughts_tokens, total_tokens }
}

/// Parses `Malformed function call: call:<name>(<args_json>)` (spec.md §4.1.3, property 9).
fn recover_malformed_call(message: &str, tool_use_blocks: &mut Vec<ContentBlock>, text_buf: &mut String, ts: &str, call_seq: &mut u32) {
	let Some(after_prefix) = message.strip_prefix("Malformed function call: ") else {
		return;
	};
	let Some(after_call) = after_prefix.strip_prefix("call:") else {
		return;
	};
	let Some(open_brace) = after_call.find('{') else {
		return;
	};
	let Some(close_brace) = after_call.rfind('}') else {
		return;
	};

	let name = after_call[..open_brace].trim_end_matches(|c: char| c == '(' || c.is_whitespace()).replace(':', "_");
	let args_str = &after_call[open_brace..=close_brace];

	let parsed = serde_json::from_str::<Value>(args_str).or_else(|_| repair_bareword_keys(args_str));

	match parsed {
		Ok(input) => {
			*call_seq += 1;
			let id = format!("call_function_{ts}_{call_seq}");
			tool_use_blocks.push(ContentBlock::ToolUse { id, name, input, signature: None });
		}
		Err(_) => {
			text_buf.push_str(args_str.trim_matches(|c| c == '{' || c == '}'));
		}
	}
}

fn repair_bareword_keys(s: &str) -> serde_json::Result<Value> {
	static RE: OnceLock<Regex> = OnceLock::new();
	let re = RE.get_or_init(|| Regex::new(r"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)\s*:").expect("valid regex"));
	let repaired = re.replace_all(s, "$1\"$2\":");
	serde_json::from_str(&repaired)
}
