use std::time::Duration;

use tokio::signal as tokio_signal;
use tracing::{info, warn};

use crate::relay::state::UpstreamTarget;

const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(5);

/// Waits for SIGINT/SIGTERM, then drains the Gemini context cache (if any) best-effort under
/// a 5s deadline before `axum::serve`'s graceful shutdown completes (spec.md §4.6, §6).
pub async fn signal(upstream: UpstreamTarget) {
	wait_for_signal().await;
	info!("shutdown signal received, draining relay-owned state");

	if let UpstreamTarget::Gemini { context_cache: Some(ccm), .. } = upstream {
		if tokio::time::timeout(SHUTDOWN_DEADLINE, ccm.shutdown_cleanup()).await.is_err() {
			warn!("context cache drain exceeded the shutdown deadline, proceeding anyway");
		}
	}
}

async fn wait_for_signal() {
	let ctrl_c = async {
		tokio_signal::ctrl_c().await.expect("failed to install SIGINT handler");
	};

	#[cfg(unix)]
	let terminate = async {
		tokio_signal::unix::signal(tokio_signal::unix::SignalKind::terminate())
			.expect("failed to install SIGTERM handler")
			.recv()
			.await;
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}
}
