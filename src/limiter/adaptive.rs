use std::time::Duration;

use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::limiter::bucket::{ConsumeOutcome, TokenBucket};

/// Post-hoc correction policy (spec.md §4.2, §9 design note): the Gemini path keeps a
/// safety margin on over-estimates (`Conservative`), the OpenAI path reconciles both
/// directions (`Symmetric`). A single `correct` function branches on this instead of two
/// copies of the reconciliation logic.
#[derive(Debug, Clone, Copy)]
pub enum PostHocPolicy {
	Conservative,
	Symmetric,
}

/// Wraps a [`TokenBucket`] with the EMA ratio mapping payload bytes to actual upstream
/// tokens (spec.md §3 `AdaptiveRatio`, §4.2). The ratio starts at `1.0` and is nudged by
/// `0.2` of each observed sample per response.
#[derive(Debug)]
pub struct AdaptiveEstimator {
	bucket: TokenBucket,
	ratio: RwLock<f64>,
}

impl AdaptiveEstimator {
	pub fn new(capacity: f64) -> Self {
		Self { bucket: TokenBucket::new(capacity), ratio: RwLock::new(1.0) }
	}

	pub fn capacity(&self) -> f64 {
		self.bucket.capacity()
	}

	/// Runs the admission loop of spec.md §4.2: estimate from payload bytes, retry against
	/// the bucket until admitted, sleeping the reported wait between tries. Fails outright
	/// (no sleep) when the estimate alone exceeds capacity. Returns `(raw_estimate,
	/// estimated)` so the caller can apply post-hoc correction once actual usage is known.
	pub async fn admit(&self, body_len: usize) -> Result<(f64, f64)> {
		let raw_estimate = body_len as f64 / 3.0;
		let ratio = *self.ratio.read().await;
		let estimated = raw_estimate * ratio;
		loop {
			match self.bucket.consume(estimated).await {
				ConsumeOutcome::Admitted => return Ok((raw_estimate, estimated)),
				ConsumeOutcome::Impossible => return Err(Error::RequestTooLargeForTpm),
				ConsumeOutcome::Wait(secs) => tokio::time::sleep(Duration::from_secs_f64(secs.max(0.0))).await,
			}
		}
	}

	/// Post-hoc correction (spec.md §4.2): reconciles the bucket against `actual` per
	/// `policy`, then updates the adaptive ratio whenever `raw_estimate > 0`.
	pub async fn correct(&self, policy: PostHocPolicy, raw_estimate: f64, estimated: f64, actual: f64) {
		let diff = actual - estimated;
		match policy {
			// Over-estimate retained as safety margin; only under-estimates are reconciled.
			PostHocPolicy::Conservative => {
				if diff > 0.0 {
					self.bucket.consume_extra(diff).await;
				}
			}
			PostHocPolicy::Symmetric => {
				if diff > 0.0 {
					self.bucket.consume_extra(diff).await;
				} else if diff < 0.0 {
					self.bucket.refund(-diff).await;
				}
			}
		}

		if raw_estimate > 0.0 {
			let sample = actual / raw_estimate;
			let mut ratio = self.ratio.write().await;
			*ratio = 0.8 * *ratio + 0.2 * sample;
		}
	}
}
