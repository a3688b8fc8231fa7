use dashmap::DashMap;

/// Concurrent map from a relay-minted `tool_use` id to the opaque "thought signature" the
/// upstream attached to the `functionCall` that produced it (spec.md §3, §4.5).
///
/// Writes happen on response decode when a signature accompanies a function call. Reads
/// happen on request encode, when a later turn echoes that `tool_use` without its
/// signature. There is no eviction (spec.md §9 open question) — entries live for the
/// process, same as the teacher's model-name/auth caches in `src/resolver/`.
#[derive(Debug, Default)]
pub struct SignatureCache {
	inner: DashMap<String, String>,
}

impl SignatureCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records (or overwrites) the signature observed for `tool_use_id`.
	pub fn record(&self, tool_use_id: impl Into<String>, signature: impl Into<String>) {
		self.inner.insert(tool_use_id.into(), signature.into());
	}

	/// Looks up a previously recorded signature, if any.
	pub fn get(&self, tool_use_id: &str) -> Option<String> {
		self.inner.get(tool_use_id).map(|entry| entry.value().clone())
	}

	pub fn len(&self) -> usize {
		self.inner.len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}
}
