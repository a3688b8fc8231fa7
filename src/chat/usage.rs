use serde::{Deserialize, Serialize};

/// Token usage as reported by either upstream, normalized to the OpenAI-style field names
/// the Anthropic-style response envelope is built from (spec.md §4.1.4, §4.6).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
	pub prompt_tokens: i64,
	pub completion_tokens: i64,
	pub total_tokens: i64,
}
