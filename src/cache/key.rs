use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Replaces the single dynamic substring the source prompts are known to carry — a
/// human-readable "current date and time" stamp — with a fixed sentinel, so the cache key
/// derived from an otherwise-stable system prompt doesn't change every second
/// (spec.md §4.4, §9 design note, property 4).
pub fn normalize_system(system: &str) -> String {
	static RE: OnceLock<Regex> = OnceLock::new();
	let re = RE.get_or_init(|| {
		Regex::new(r"Current date and time: \d{4}-\d{2}-\d{2} \([A-Za-z]+\) \d{2}:\d{2}:\d{2}").expect("valid regex")
	});
	re.replace_all(system, "Current date and time: [NORMALIZED]").into_owned()
}

/// `cache_key = SHA-256(normalize(system) || json(tools))[:16]` hex (spec.md §4.4).
pub fn cache_key(system: Option<&str>, tools: Option<&Value>) -> String {
	let normalized_system = system.map(normalize_system).unwrap_or_default();
	let tools_json = tools.map(|t| t.to_string()).unwrap_or_default();

	let mut hasher = Sha256::new();
	hasher.update(normalized_system.as_bytes());
	hasher.update(tools_json.as_bytes());
	let digest = hasher.finalize();
	hex::encode(digest)[..16].to_string()
}

/// `digest(contents) = SHA-256(json_canonical(contents))[:32]` hex (spec.md §4.4). `contents`
/// is the translator's own `Vec<GoogleContent>` JSON rendering — `serde_json::Value`'s default
/// object ordering is stable for a given input, which is all the incremental-prefix match
/// (spec.md property 5) needs.
pub fn digest(contents: &[Value]) -> String {
	let canonical = serde_json::to_string(contents).unwrap_or_default();
	let mut hasher = Sha256::new();
	hasher.update(canonical.as_bytes());
	hex::encode(hasher.finalize())[..32].to_string()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cache_key_is_stable_across_timestamps() {
		let a = "Prompt.\nCurrent date and time: 2026-02-09 (Monday) 21:15:02\nrest";
		let b = "Prompt.\nCurrent date and time: 2027-12-31 (Friday) 00:00:00\nrest";
		let tools = serde_json::json!([{"name": "bash"}]);
		assert_eq!(cache_key(Some(a), Some(&tools)), cache_key(Some(b), Some(&tools)));
	}

	#[test]
	fn cache_key_changes_with_tools() {
		let system = "Prompt.";
		let tools_a = serde_json::json!([{"name": "bash"}]);
		let tools_b = serde_json::json!([{"name": "web_search"}]);
		assert_ne!(cache_key(Some(system), Some(&tools_a)), cache_key(Some(system), Some(&tools_b)));
	}

	#[test]
	fn digest_matches_for_identical_prefix() {
		let contents = vec![serde_json::json!({"role": "user", "parts": [{"text": "hi"}]})];
		assert_eq!(digest(&contents), digest(&contents.clone()));
	}
}
