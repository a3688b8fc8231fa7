use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool definition, normalized from either of the two shapes a client may send
/// (spec.md §3):
///
/// - OpenAI shape: `{ type:"function", function:{ name, description?, parameters } }`
/// - Anthropic shape: `{ name, description?, input_schema }` (no `type`)
///
/// Deserialization accepts either wire shape and normalizes into this one struct, the way
/// the teacher's `Tool` (`chat/tool/tool_base.rs`) holds a single `schema: Option<Value>`
/// regardless of which provider it is eventually projected to.
#[derive(Debug, Clone, Serialize)]
pub struct GenericTool {
	pub name: String,
	pub description: Option<String>,
	pub schema: Value,
}

impl<'de> Deserialize<'de> for GenericTool {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		let mut raw = Value::deserialize(deserializer)?;

		// OpenAI shape: has a nested "function" object.
		if let Some(function) = raw.get_mut("function").map(Value::take) {
			let name = function
				.get("name")
				.and_then(Value::as_str)
				.unwrap_or_default()
				.to_string();
			let description = function
				.get("description")
				.and_then(Value::as_str)
				.map(str::to_string);
			let schema = function.get("parameters").cloned().unwrap_or_else(|| serde_json::json!({}));
			return Ok(GenericTool { name, description, schema });
		}

		// Anthropic shape: name/description/input_schema at the top level.
		let name = raw.get("name").and_then(Value::as_str).unwrap_or_default().to_string();
		let description = raw.get("description").and_then(Value::as_str).map(str::to_string);
		let schema = raw.get("input_schema").cloned().unwrap_or_else(|| serde_json::json!({}));

		Ok(GenericTool { name, description, schema })
	}
}
