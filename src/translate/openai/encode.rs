use std::collections::HashMap;

use serde_json::{Value, json};

use crate::chat::{ContentBlock, GenericMessage, GenericRequest, GenericTool, MessageContent, Role};

/// Translates a [`GenericRequest`] into an OpenAI-compatible Chat Completions request body
/// (spec.md §4.1.2). Returns the full `{model, messages, tools?}` JSON, ready to POST.
pub fn encode(req: &GenericRequest) -> Value {
	let id_to_name = build_id_to_name_map(&req.messages);
	let mut messages: Vec<Value> = Vec::new();

	if let Some(system) = req.system.as_deref().filter(|s| !s.is_empty()) {
		messages.push(json!({ "role": "system", "content": system }));
	}

	for msg in &req.messages {
		match msg.role {
			Role::System => {
				// A `system` message only becomes a wire message if `req.system` didn't
				// already supply the instruction (spec.md §4.1.2 mirrors §4.1.1 here).
				if req.system.as_deref().filter(|s| !s.is_empty()).is_none() {
					let text = msg.content.joined_text();
					if !text.is_empty() {
						messages.push(json!({ "role": "system", "content": text }));
					}
				}
			}
			Role::User => messages.extend(encode_user(msg, &id_to_name)),
			Role::Assistant => messages.push(encode_assistant(msg)),
			Role::Tool => messages.push(encode_tool_passthrough(msg)),
		}
	}

	let mut body = json!({ "model": req.model, "messages": messages });
	if let Some(tools) = encode_tools(req.tools.as_deref()) {
		body["tools"] = tools;
	}
	body
}

/// Same correlation scan as `translate::gemini::encode::build_id_to_name_map` — kept as a
/// separate copy rather than shared, since the two translators otherwise have no common
/// dependency and the teacher's own per-adapter modules don't share helpers across
/// providers either.
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

fn encode_user(msg: &GenericMessage, id_to_name: &HashMap<String, String>) -> Vec<Value> {
	match &msg.content {
		MessageContent::Blocks(blocks) => {
			let mut out = Vec::new();
			for block in blocks {
				if let ContentBlock::ToolResult { tool_use_id, content, .. } = block {
					let name = id_to_name.get(tool_use_id).cloned().unwrap_or_else(|| tool_use_id.clone());
					out.push(json!({
						"role": "tool",
						"content": content_to_string(content),
						"tool_call_id": tool_use_id,
						"name": name,
					}));
				}
			}
			let text = blocks.iter().filter_map(ContentBlock::as_text).collect::<Vec<_>>().join("");
			if !text.is_empty() {
				out.push(json!({ "role": "user", "content": text }));
			}
			out
		}
		MessageContent::Text(text) => vec![json!({ "role": "user", "content": text })],
	}
}

/// Builds the single assistant message (spec.md §4.1.2): joined text (or `null`) plus
/// `tool_calls` from both `tool_use` content blocks and any already-OpenAI-shape
/// `tool_calls` on the message. `thinking` blocks are dropped — the OpenAI family generates
/// its own reasoning, so there's nothing to carry.
fn encode_assistant(msg: &GenericMessage) -> Value {
	let mut tool_calls: Vec<Value> = Vec::new();
	let mut text = String::new();

	match &msg.content {
		MessageContent::Blocks(blocks) => {
			for block in blocks {
				match block {
					ContentBlock::Text { text: t } => text.push_str(t),
					ContentBlock::ToolUse { id, name, input, .. } => {
						tool_calls.push(json!({
							"id": id,
							"type": "function",
							"function": { "name": name, "arguments": input.to_string() },
						}));
					}
					ContentBlock::Thinking { .. } | ContentBlock::ToolResult { .. } => {}
				}
			}
		}
		MessageContent::Text(t) => text.push_str(t),
	}

	if let Some(existing) = &msg.tool_calls {
		for call in existing {
			tool_calls.push(json!({
				"id": call.id,
				"type": call.kind,
				"function": { "name": call.function.name, "arguments": call.function.arguments },
			}));
		}
	}

	let content = if text.is_empty() { Value::Null } else { Value::String(text) };
	let mut value = json!({ "role": "assistant", "content": content });
	if !tool_calls.is_empty() {
		value["tool_calls"] = Value::Array(tool_calls);
	}
	value
}

/// A `role:"tool"` message is already OpenAI-shaped on the generic model — passed through
/// unchanged (spec.md §4.1.2).
fn encode_tool_passthrough(msg: &GenericMessage) -> Value {
	json!({
		"role": "tool",
		"content": msg.content.joined_text(),
		"tool_call_id": msg.tool_call_id,
		"name": msg.name,
	})
}

fn content_to_string(content: &Value) -> String {
	match content {
		Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}

/// Tool definitions projected to `{type:"function", function:{name, description,
/// parameters}}` regardless of which of the two input shapes populated them (spec.md
/// §4.1.2).
fn encode_tools(tools: Option<&[GenericTool]>) -> Option<Value> {
	let tools = tools?;
	let declarations: Vec<Value> = tools
		.iter()
		.filter(|tool| !tool.name.is_empty())
		.map(|tool| {
			json!({
				"type": "function",
				"function": { "name": tool.name, "description": tool.description, "parameters": tool.schema },
			})
		})
		.collect();
	if declarations.is_empty() { None } else { Some(Value::Array(declarations)) }
}
