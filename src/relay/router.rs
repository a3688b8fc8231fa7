use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::relay::handler;
use crate::relay::state::RelayState;

/// Builds the full router: `POST /v1/messages` is the relay's single real endpoint, mounted
/// as a wildcard so any `/v1/*` path reaches the same handler (spec.md §6), plus `GET
/// /health` for liveness checks. `TraceLayer` logs every request/response pair, grounded on
/// the teacher's own `tower-http` usage in its example HTTP server plumbing.
pub fn build(state: RelayState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/{*path}", post(handler::handle))
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

async fn health() -> &'static str {
	"ok"
}
