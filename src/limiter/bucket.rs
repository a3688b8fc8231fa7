use std::time::Instant;

use tokio::sync::Mutex;

/// Outcome of a [`TokenBucket::consume`] call (spec.md §4.2).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConsumeOutcome {
	/// Admitted; the amount has already been deducted.
	Admitted,
	/// Not enough credit yet; retry after sleeping this many seconds.
	Wait(f64),
	/// The request alone exceeds capacity — no amount of waiting will admit it.
	Impossible,
}

#[derive(Debug)]
struct BucketState {
	tokens: f64,
	last_update: Instant,
}

/// Classical token bucket (spec.md §4.2). Refill accrues continuously at `capacity/60`
/// tokens/sec and saturates at `capacity`; `tokens` may go negative as a deficit after
/// [`TokenBucket::consume_extra`], so the next admission call blocks until the deficit
/// refills away. Guarded by a single mutex (spec.md §5) — `consume` never sleeps while
/// holding it; callers release between tries and sleep outside.
#[derive(Debug)]
pub struct TokenBucket {
	capacity: f64,
	refill_rate: f64,
	state: Mutex<BucketState>,
}

impl TokenBucket {
	pub fn new(capacity: f64) -> Self {
		Self {
			capacity,
			refill_rate: capacity / 60.0,
			state: Mutex::new(BucketState { tokens: capacity, last_update: Instant::now() }),
		}
	}

	pub fn capacity(&self) -> f64 {
		self.capacity
	}

	/// Refills, then admits `amount` if enough credit is available (spec.md §4.2 `Consume`).
	pub async fn consume(&self, amount: f64) -> ConsumeOutcome {
		if amount > self.capacity {
			return ConsumeOutcome::Impossible;
		}
		let mut state = self.state.lock().await;
		self.refill(&mut state);
		if state.tokens >= amount {
			state.tokens -= amount;
			ConsumeOutcome::Admitted
		} else {
			let wait = (amount - state.tokens) / self.refill_rate;
			ConsumeOutcome::Wait(wait)
		}
	}

	/// Credits `amount` back, never exceeding capacity (spec.md §3 invariant).
	pub async fn refund(&self, amount: f64) {
		let mut state = self.state.lock().await;
		self.refill(&mut state);
		state.tokens = (state.tokens + amount).min(self.capacity);
	}

	/// Deducts `amount` with no floor (spec.md §4.2 `ConsumeExtra`), widening a deficit so
	/// post-hoc under-estimates are reconciled by blocking the next admission.
	pub async fn consume_extra(&self, amount: f64) {
		let mut state = self.state.lock().await;
		self.refill(&mut state);
		state.tokens -= amount;
	}

	/// Current token count after refilling, for callers that need to observe bucket state
	/// (e.g. tests asserting conservation, spec.md property 6).
	pub async fn available(&self) -> f64 {
		let mut state = self.state.lock().await;
		self.refill(&mut state);
		state.tokens
	}

	fn refill(&self, state: &mut BucketState) {
		let now = Instant::now();
		let elapsed = now.duration_since(state.last_update).as_secs_f64();
		state.tokens = (state.tokens + elapsed * self.refill_rate).min(self.capacity);
		state.last_update = now;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn admits_when_enough_tokens() {
		let bucket = TokenBucket::new(100.0);
		assert_eq!(bucket.consume(50.0).await, ConsumeOutcome::Admitted);
	}

	#[tokio::test]
	async fn reports_wait_when_insufficient() {
		let bucket = TokenBucket::new(60.0); // refill_rate = 1 token/sec
		assert_eq!(bucket.consume(60.0).await, ConsumeOutcome::Admitted);
		match bucket.consume(30.0).await {
			ConsumeOutcome::Wait(secs) => assert!((secs - 30.0).abs() < 0.5),
			other => panic!("expected Wait, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn single_request_larger_than_capacity_is_impossible() {
		let bucket = TokenBucket::new(10.0);
		assert_eq!(bucket.consume(11.0).await, ConsumeOutcome::Impossible);
	}

	#[tokio::test]
	async fn refund_never_exceeds_capacity() {
		let bucket = TokenBucket::new(10.0);
		bucket.consume(10.0).await;
		bucket.refund(1000.0).await;
		assert_eq!(bucket.available().await, 10.0);
	}

	#[tokio::test]
	async fn consume_extra_allows_deficit() {
		let bucket = TokenBucket::new(10.0);
		bucket.consume_extra(5.0).await;
		assert_eq!(bucket.available().await, -5.0);
		match bucket.consume(1.0).await {
			ConsumeOutcome::Wait(secs) => assert!(secs > 0.0),
			other => panic!("expected Wait while in deficit, got {other:?}"),
		}
	}
}
