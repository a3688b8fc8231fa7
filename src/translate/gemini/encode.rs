use std::collections::HashMap;

use serde_json::{Value, json};

use crate::cache::SignatureCache;
use crate::chat::{ContentBlock, GenericMessage, GenericRequest, MessageContent, Role, tool_result_response_value};
use crate::translate::gemini::wire::{GoogleContent, GoogleFunctionCall, GoogleFunctionResponse, GooglePart, GoogleRequest};

/// Sentinel `thoughtSignature` the relay attaches to a `functionCall` part when no real
/// signature is known (spec.md §4.1.1). Accepted by the upstream as "skip validation".
pub const SKIP_THOUGHT_SIGNATURE: &str = "skip_thought_signature_validator";

/// Translates a [`GenericRequest`] into the Gemini wire shape (spec.md §4.1.1).
///
/// `signatures` supplies reattachment for `tool_use` blocks the client echoes back without
/// their original `thoughtSignature`; any signature discovered directly on a block takes
/// precedence over the cache.
pub fn encode(req: &GenericRequest, signatures: &SignatureCache) -> GoogleRequest {
	let id_to_name = build_id_to_name_map(&req.messages);

	let mut system_text = req.system.clone().filter(|s| !s.is_empty());
	let mut contents: Vec<GoogleContent> = Vec::new();

	for msg in &req.messages {
		match msg.role {
			Role::System => {
				if system_text.is_none() {
					let text = msg.content.joined_text();
					if !text.is_empty() {
						system_text = Some(text);
					}
				}
			}
			Role::User => contents.push(encode_user(msg, &id_to_name)),
			Role::Assistant => {
				if let Some(content) = encode_assistant(msg, signatures) {
					contents.push(content);
				}
			}
			Role::Tool => contents.push(encode_tool(msg)),
		}
	}

	merge_adjacent(&mut contents);
	prepend_continue_if_needed(&mut contents);

	let mut request = GoogleRequest::new(contents);
	request.tools = encode_tools(req.tools.as_deref());
	request.system_instruction = system_text.map(|text| json!({ "parts": [{ "text": text }] }));
	request
}

/// Scans every assistant message for `tool_use` blocks and OpenAI-shape `tool_calls`,
/// recording the id → function-name correlation used to resolve `tool_result`/`tool`
/// messages back to their originating function (spec.md §4.1.1, property 2).
fn build_id_to_name_map(messages: &[GenericMessage]) -> HashMap<String, String> {
	let mut map = HashMap::new();
	for msg in messages {
		if msg.role != Role::Assistant {
			continue;
		}
		if let Some(blocks) = msg.content.blocks() {
			for block in blocks {
				if let Some((id, name, ..)) = block.as_tool_use() {
					map.insert(id.to_string(), name.to_string());
				}
			}
		}
		if let Some(tool_calls) = &msg.tool_calls {
			for call in tool_calls {
				map.insert(call.id.clone(), call.function.name.clone());
			}
		}
	}
	map
}

fn encode_user(msg: &GenericMessage, id_to_name: &HashMap<String, String>) -> GoogleContent {
	let parts = match &msg.content {
		MessageContent::Blocks(blocks) => blocks
			.iter()
			.filter_map(|block| match block {
				ContentBlock::Text { text } => Some(GooglePart::text(text.clone())),
				ContentBlock::ToolResult { tool_use_id, content, .. } => {
					let name = id_to_name.get(tool_use_id).cloned().unwrap_or_else(|| tool_use_id.clone());
					Some(function_response_part(name, content))
				}
				_ => None,
			})
			.collect(),
		MessageContent::Text(text) => vec![GooglePart::text(text.clone())],
	};
	GoogleContent::user(parts)
}

fn encode_tool(msg: &GenericMessage) -> GoogleContent {
	let name = msg
		.name
		.clone()
		.or_else(|| msg.tool_call_id.clone())
		.unwrap_or_default();
	let content = Value::String(msg.content.joined_text());
	GoogleContent::user(vec![function_response_part(name, &content)])
}

fn function_response_part(name: String, content: &Value) -> GooglePart {
	GooglePart {
		function_response: Some(GoogleFunctionResponse { name, response: tool_result_response_value(content) }),
		..Default::default()
	}
}

fn encode_assistant(msg: &GenericMessage, signatures: &SignatureCache) -> Option<GoogleContent> {
	let mut parts: Vec<GooglePart> = Vec::new();

	match &msg.content {
		MessageContent::Blocks(blocks) => {
			for block in blocks {
				match block {
					ContentBlock::Text { text } => parts.push(GooglePart::text(text.clone())),
					ContentBlock::ToolUse { id, name, input, signature } => {
						let thought_signature = signature.clone().or_else(|| signatures.get(id)).unwrap_or_else(|| SKIP_THOUGHT_SIGNATURE.to_string());
						parts.push(GooglePart {
							function_call: Some(GoogleFunctionCall { name: name.clone(), args: input.clone() }),
							thought_signature: Some(thought_signature),
							..Default::default()
						});
					}
					// `thinking`/`tool_result` blocks carry no Gemini-side representation on an
					// assistant turn (spec.md §4.1.1 only describes `text`/`tool_use` here).
					ContentBlock::Thinking { .. } | ContentBlock::ToolResult { .. } => {}
				}
			}
		}
		MessageContent::Text(text) => parts.push(GooglePart::text(text.clone())),
	}

	if let Some(tool_calls) = &msg.tool_calls {
		for call in tool_calls {
			let args = serde_json::from_str::<Value>(&call.function.arguments).unwrap_or_else(|_| json!({}));
			let thought_signature = signatures.get(&call.id).unwrap_or_else(|| SKIP_THOUGHT_SIGNATURE.to_string());
			parts.push(GooglePart {
				function_call: Some(GoogleFunctionCall { name: call.function.name.clone(), args }),
				thought_signature: Some(thought_signature),
				..Default::default()
			});
		}
	}

	if parts.is_empty() { None } else { Some(GoogleContent::model(parts)) }
}

/// Merges adjacent same-role turns by concatenating their parts in order (spec.md §4.1.1
/// post-condition 1, property 1).
fn merge_adjacent(contents: &mut Vec<GoogleContent>) {
	let mut merged: Vec<GoogleContent> = Vec::with_capacity(contents.len());
	for content in contents.drain(..) {
		match merged.last_mut() {
			Some(prev) if prev.role == content.role => prev.parts.extend(content.parts),
			_ => merged.push(content),
		}
	}
	*contents = merged;
}

/// Prepends a synthetic `user` "continue" turn if the first turn would be `model`
/// (spec.md §4.1.1 post-condition 2, property 1, scenario S3).
fn prepend_continue_if_needed(contents: &mut Vec<GoogleContent>) {
	if matches!(contents.first(), Some(c) if c.role == "model") {
		contents.insert(0, GoogleContent::user(vec![GooglePart::text("continue")]));
	}
}

fn encode_tools(tools: Option<&[crate::chat::GenericTool]>) -> Option<Value> {
	let tools = tools?;
	let declarations: Vec<Value> = tools
		.iter()
		.filter(|tool| !tool.name.is_empty())
		.map(|tool| {
			json!({
				"name": tool.name,
				"description": tool.description,
				"parameters": tool.schema,
			})
		})
		.collect();
	if declarations.is_empty() {
		None
	} else {
		Some(json!([{ "functionDeclarations": declarations }]))
	}
}
