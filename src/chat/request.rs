use serde::{Deserialize, Serialize};

use crate::chat::{GenericMessage, GenericTool};

/// The client-facing input, and the pivot the translator reasons about (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenericRequest {
	pub model: String,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub system: Option<String>,

	#[serde(default)]
	pub messages: Vec<GenericMessage>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tools: Option<Vec<GenericTool>>,
}
