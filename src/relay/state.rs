use std::sync::Arc;

use crate::cache::{ContextCacheManager, SignatureCache};
use crate::limiter::AdaptiveEstimator;
use crate::throttle::ThrottleGate;
use crate::webc::UpstreamClient;

/// Fixed per spec.md §6 — Gemini's REST base, not flag-configurable.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";

/// The per-process upstream wiring the handler dispatches on. Built once at startup from
/// `config::RelayConfig` (spec.md §2 data flow: `client → RH → MGT(encode) → ... → UC`).
#[derive(Debug, Clone)]
pub enum UpstreamTarget {
	/// `cache`: the optional Context Cache Manager (spec.md §4.4), present only when
	/// `--cache` was passed. `base_url`: always [`GEMINI_BASE_URL`] in production — not
	/// flag-configurable (spec.md §6) — but kept as a field rather than a call-site constant
	/// so integration tests can point the relay at a mock server.
	Gemini { context_cache: Option<Arc<ContextCacheManager>>, throttle: Arc<ThrottleGate>, base_url: String },
	/// `url`: the configured Chat Completions endpoint. `fallback_key`: `--key` (spec.md §6).
	OpenAi { url: String, fallback_key: Option<String> },
}

/// Shared state handed to every `relay::handler::handle` call via axum's `State` extractor
/// (spec.md §5 concurrency model: one process-global instance of each guarded structure).
#[derive(Clone)]
pub struct RelayState {
	pub upstream: UpstreamTarget,
	pub client: UpstreamClient,
	pub signatures: Arc<SignatureCache>,
	pub estimator: Option<Arc<AdaptiveEstimator>>,
}
