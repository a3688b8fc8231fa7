//! Relay-owned cross-request state: the Signature Cache and the Gemini Context Cache
//! Manager (spec.md §3 "Relay-owned state", §4.4, §4.5).

mod context;
mod key;
mod signature;

pub use context::ContextCacheManager;
pub use key::{cache_key, digest, normalize_system};
pub use signature::SignatureCache;
