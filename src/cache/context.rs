use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde_json::{Value, json};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::cache::key::{cache_key, digest};
use crate::error::{Error, Result};
use crate::translate::gemini::wire::GoogleRequest;
use crate::webc::UpstreamClient;

const SERVER_TTL: &str = "1800s";
const CLIENT_SIDE_TTL: Duration = Duration::from_secs(25 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
	handle_name: String,
	expire_at: Instant,
	cached_message_count: usize,
	cached_messages_digest: String,
}

/// Gemini-path-only keyed cache of server-side `cachedContents` handles (spec.md §4.4).
///
/// The outer table is guarded by one `tokio::sync::Mutex` rather than a per-key scheme —
/// the lock is held across the occasional create/delete network call so that racing
/// first-turn requests for the same `(system, tools)` key can't both create a handle
/// (spec.md §5's at-most-one-handle-per-key guarantee), which is exactly the "coarse write
/// lock" spec.md sanctions as an alternative to per-key locking.
///
/// The client's API key is pass-through per request (spec.md §1 Non-goals: no client
/// authentication of its own), so it is never baked into this manager — `apply` takes the
/// resolved key as an argument and remembers the most recently seen one for
/// `shutdown_cleanup`, which has no live request to resolve a key from.
#[derive(Debug)]
pub struct ContextCacheManager {
	client: UpstreamClient,
	base_url: String,
	entries: Mutex<HashMap<String, CacheEntry>>,
	last_api_key: Mutex<Option<String>>,
}

impl ContextCacheManager {
	pub fn new(client: UpstreamClient, base_url: String) -> Self {
		Self { client, base_url, entries: Mutex::new(HashMap::new()), last_api_key: Mutex::new(None) }
	}

	/// Applies the cache protocol to an already-encoded Gemini request in place. No-op
	/// unless the request carries a `systemInstruction` or at least one tool (the CCM
	/// precondition). On any create/delete failure, logs and leaves `request` untouched so
	/// the caller falls back to a normal, uncached call (spec.md §4.4 failure semantics).
	pub async fn apply(&self, model: &str, api_key: &str, request: &mut GoogleRequest) {
		*self.last_api_key.lock().await = Some(api_key.to_string());

		if request.system_instruction.is_none() && request.tools.is_none() {
			return;
		}

		let system_text = request
			.system_instruction
			.as_ref()
			.and_then(|v| v.pointer("/parts/0/text"))
			.and_then(Value::as_str);
		let key = cache_key(system_text, request.tools.as_ref());

		let contents_json: Vec<Value> = request.contents.iter().map(|c| serde_json::to_value(c).unwrap_or(Value::Null)).collect();

		let mut entries = self.entries.lock().await;

		if let Some(entry) = entries.get(&key).cloned() {
			if entry.expire_at > Instant::now() {
				let prefix_len = entry.cached_message_count;
				if prefix_len <= contents_json.len() && digest(&contents_json[..prefix_len]) == entry.cached_messages_digest {
					debug!(cache_key = %key, prefix_len, "context cache incremental hit");
					request.cached_content = Some(entry.handle_name.clone());
					request.system_instruction = None;
					request.tools = None;
					request.contents = request.contents.split_off(prefix_len);
					return;
				}
			}
			debug!(cache_key = %key, handle = %entry.handle_name, "context cache prefix diverged, rebuilding");
			self.delete_handle(api_key, &entry.handle_name).await;
			entries.remove(&key);
		}

		if contents_json.len() <= 1 {
			return;
		}

		let prefix_len = contents_json.len() - 1;
		let body = json!({
			"model": format!("models/{model}"),
			"systemInstruction": request.system_instruction,
			"tools": request.tools,
			"contents": contents_json[..prefix_len],
			"ttl": SERVER_TTL,
		});

		match self.create_handle(api_key, &body).await {
			Ok(handle_name) => {
				entries.insert(
					key,
					CacheEntry {
						handle_name: handle_name.clone(),
						expire_at: Instant::now() + CLIENT_SIDE_TTL,
						cached_message_count: prefix_len,
						cached_messages_digest: digest(&contents_json[..prefix_len]),
					},
				);
				request.cached_content = Some(handle_name);
				request.system_instruction = None;
				request.tools = None;
				request.contents = request.contents.split_off(prefix_len);
			}
			Err(err) => {
				warn!(error = %err, "context cache create failed, proceeding without cache");
			}
		}
	}

	/// Deletes every tracked handle, best-effort, on graceful shutdown (spec.md §4.4, §4.6).
	/// Uses the last API key observed via `apply` — there is no live request to resolve one
	/// from at shutdown, and the single-user assumption (spec.md §1 Non-goals) makes that
	/// key stable for the process lifetime.
	pub async fn shutdown_cleanup(&self) {
		let Some(api_key) = self.last_api_key.lock().await.clone() else {
			return;
		};
		let mut entries = self.entries.lock().await;
		for (key, entry) in entries.drain() {
			debug!(cache_key = %key, handle = %entry.handle_name, "deleting context cache handle on shutdown");
			self.delete_handle(&api_key, &entry.handle_name).await;
		}
	}

	async fn create_handle(&self, api_key: &str, body: &Value) -> Result<String> {
		let url = format!("{}cachedContents?key={}", self.base_url, api_key);
		let response = self.client.post_json(&url, &[], body).await?;
		if !response.status.is_success() {
			return Err(Error::custom(format!("context cache create returned {}: {}", response.status, response.body)));
		}
		response
			.body
			.get("name")
			.and_then(Value::as_str)
			.map(str::to_string)
			.ok_or_else(|| Error::custom("context cache create response missing name"))
	}

	async fn delete_handle(&self, api_key: &str, handle_name: &str) {
		let url = format!("{}{}?key={}", self.base_url, handle_name, api_key);
		if let Err(err) = self.client.delete(&url, &[]).await {
			warn!(handle = %handle_name, error = %err, "context cache delete failed");
		}
	}
}
