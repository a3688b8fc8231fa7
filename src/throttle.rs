//! Throttle Gate — Gemini-path only (spec.md §4.3): a minimum 61s inter-request spacing
//! enforced for 30 minutes after the upstream reports `Resource has been exhausted`.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

const MIN_SPACING: Duration = Duration::from_secs(61);
const THROTTLE_DURATION: Duration = Duration::from_secs(30 * 60);

/// The literal substring spec.md §4.3 keys activation on — Google's own wording for a `429`
/// caused by exhausting a quota window, distinct from other `429` causes.
pub const RESOURCE_EXHAUSTED_MARKER: &str = "Resource has been exhausted";

#[derive(Debug, Default)]
struct ThrottleState {
	until: Option<Instant>,
	last_request: Option<Instant>,
}

/// Guarded by a single mutex held across the sleep itself (spec.md §5) — concurrent
/// requests racing a throttled window serialize through `pre_dispatch` rather than all
/// deciding to proceed at once. Uses `tokio::time::Instant` rather than `std::time::Instant`
/// so spacing is observable under a paused test clock.
#[derive(Debug, Default)]
pub struct ThrottleGate {
	state: Mutex<ThrottleState>,
}

impl ThrottleGate {
	pub fn new() -> Self {
		Self::default()
	}

	/// Pre-dispatch check (spec.md §4.3): while an active throttle window is in effect,
	/// enforces at least 61s between requests, sleeping out the remainder if needed.
	pub async fn pre_dispatch(&self) {
		let mut state = self.state.lock().await;
		let now = Instant::now();
		if let Some(until) = state.until {
			if now < until {
				let elapsed = state.last_request.map(|last| now.saturating_duration_since(last)).unwrap_or(MIN_SPACING);
				if elapsed < MIN_SPACING {
					tokio::time::sleep(MIN_SPACING - elapsed).await;
				}
				state.last_request = Some(Instant::now());
			}
		}
	}

	/// Activates a 30-minute throttle window (spec.md §4.3 Activation), to be called on a
	/// `429` whose body contains [`RESOURCE_EXHAUSTED_MARKER`].
	pub async fn activate(&self) {
		let mut state = self.state.lock().await;
		let now = Instant::now();
		state.until = Some(now + THROTTLE_DURATION);
		state.last_request = Some(now);
	}
}
