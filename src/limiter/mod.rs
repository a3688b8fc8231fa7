//! Token-Bucket TPM limiter with post-hoc correction (spec.md §4.2).
//!
//! `TokenBucket` is the raw rate-limiting primitive; `AdaptiveEstimator` wraps it with the
//! EMA ratio that maps payload bytes to actual upstream tokens and the two correction
//! policies spec.md §9's design note calls for (`Conservative` for Gemini, `Symmetric` for
//! OpenAI) — one shared function, policy as data, not duplicated code per upstream.

mod adaptive;
mod bucket;

pub use adaptive::{AdaptiveEstimator, PostHocPolicy};
pub use bucket::{ConsumeOutcome, TokenBucket};
