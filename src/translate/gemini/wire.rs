use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One turn in a Gemini `contents` array. `role` is either `"user"` or `"model"`
/// (spec.md §3) — Gemini has no `system`/`tool` role; both are folded into `user` by the
/// encoder (system → `systemInstruction`, tool results → `user` turns).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleContent {
	pub role: String,
	pub parts: Vec<GooglePart>,
}

impl GoogleContent {
	pub fn user(parts: Vec<GooglePart>) -> Self {
		Self { role: "user".to_string(), parts }
	}

	pub fn model(parts: Vec<GooglePart>) -> Self {
		Self { role: "model".to_string(), parts }
	}
}

/// A single part of a [`GoogleContent`] turn. Only one of `text` / `function_call` /
/// `function_response` is populated per part, matching the upstream's tagged-union wire
/// shape (genai's `GeminiAdapter` builds the same shapes via raw `json!` trees; this crate
/// keeps them as a struct since the turn-rewriting passes in `translate::gemini` need to
/// pattern-match and splice parts, not just forward them).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GooglePart {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub text: Option<String>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub function_call: Option<GoogleFunctionCall>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub function_response: Option<GoogleFunctionResponse>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub thought: Option<bool>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub thought_signature: Option<String>,
}

impl GooglePart {
	pub fn text(text: impl Into<String>) -> Self {
		Self { text: Some(text.into()), ..Default::default() }
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleFunctionCall {
	pub name: String,
	pub args: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleFunctionResponse {
	pub name: String,
	pub response: Value,
}

/// The outbound `generateContent` request body (spec.md §3, §6). `tools` and
/// `generation_config` are left as raw `Value` — their shape is small and mostly
/// pass-through, matching how `GeminiAdapter::to_web_request_data` builds them with
/// `json!`/`x_insert` rather than dedicated structs.
#[derive(Debug, Clone, Serialize)]
pub struct GoogleRequest {
	pub contents: Vec<GoogleContent>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub tools: Option<Value>,

	#[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
	pub system_instruction: Option<Value>,

	#[serde(rename = "cachedContent", skip_serializing_if = "Option::is_none")]
	pub cached_content: Option<String>,

	#[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
	pub generation_config: Option<Value>,
}

impl GoogleRequest {
	pub fn new(contents: Vec<GoogleContent>) -> Self {
		Self {
			contents,
			tools: None,
			system_instruction: None,
			cached_content: None,
			generation_config: None,
		}
	}
}
