//! Client ⇄ OpenAI-compatible Chat Completions wire translation (spec.md §4.1.2, §4.1.4).
//!
//! Unlike the Gemini path (`translate::gemini::wire`), there is no dedicated struct tree for
//! the outbound body — grounded on the teacher's own `OpenAIAdapter::util_to_web_request_data`
//! / `into_openai_messages`, which build the payload with `serde_json::json!` directly since
//! the Chat Completions shape is mostly pass-through rather than something genai round-trips
//! structurally.

mod decode;
mod encode;

pub use decode::{DecodedResponse, decode};
pub use encode::encode;
