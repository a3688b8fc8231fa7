use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, header};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::chat::GenericRequest;
use crate::error::{Error, Result};
use crate::limiter::PostHocPolicy;
use crate::relay::state::{RelayState, UpstreamTarget};
use crate::throttle::RESOURCE_EXHAUSTED_MARKER;
use crate::translate::{envelope, gemini, openai};

/// The single HTTP entry point, mounted under `/v1/*` (spec.md §4.6, §6). Orchestrates
/// `TG → CCM → AE/TB admission → translate → upstream call → post-hoc correction →
/// translate response → reply`, in the exact step order spec.md §4.6 lays out.
pub async fn handle(State(state): State<RelayState>, headers: HeaderMap, body: Bytes) -> Response {
	match dispatch(state, &headers, &body).await {
		Ok(response) => response,
		Err(err) => err.into_response(),
	}
}

async fn dispatch(state: RelayState, headers: &HeaderMap, body: &Bytes) -> Result<Response> {
	let req: GenericRequest = serde_json::from_slice(body).map_err(|err| Error::InvalidClientJson(err.to_string()))?;

	match &state.upstream {
		UpstreamTarget::Gemini { context_cache, throttle, base_url } => {
			handle_gemini(&state, headers, body.len(), &req, context_cache.as_deref(), throttle, base_url).await
		}
		UpstreamTarget::OpenAi { url, fallback_key } => handle_openai(&state, headers, body.len(), &req, url, fallback_key.as_deref()).await,
	}
}

async fn handle_gemini(
	state: &RelayState,
	headers: &HeaderMap,
	body_len: usize,
	req: &GenericRequest,
	context_cache: Option<&crate::cache::ContextCacheManager>,
	throttle: &crate::throttle::ThrottleGate,
	base_url: &str,
) -> Result<Response> {
	let api_key = resolve_credential(headers, None).ok_or(Error::MissingCredential)?;

	let mut wire = gemini::encode(req, &state.signatures);

	if let Some(ccm) = context_cache {
		ccm.apply(&req.model, &api_key, &mut wire).await;
	}

	throttle.pre_dispatch().await;

	let mut correction = None;
	if let Some(estimator) = &state.estimator {
		let (raw_estimate, estimated) = estimator.admit(body_len).await?;
		debug!(raw_estimate, estimated, "gemini admission granted");
		tokio::time::sleep(Duration::from_secs(1)).await;
		wire.generation_config = Some(json!({ "maxOutputTokens": 4000 }));
		correction = Some((raw_estimate, estimated));
	}

	let url = format!("{base_url}models/{}:generateContent?key={}", req.model, api_key);
	let payload = serde_json::to_value(&wire)?;
	let response = state.client.post_json(&url, &[], &payload).await?;

	if response.status.as_u16() != 200 {
		if response.status.as_u16() == 429 {
			let is_resource_exhausted = response.body.to_string().contains(RESOURCE_EXHAUSTED_MARKER);
			if is_resource_exhausted {
				throttle.activate().await;
				warn!("gemini resource-exhausted, throttle activated for 30m");
			}
			if state.estimator.is_some() {
				tokio::time::sleep(Duration::from_secs(61)).await;
			}
		}
		return Err(Error::UpstreamStatus { status: response.status.as_u16(), body: response.body });
	}

	let decoded = gemini::decode(&response.body, &state.signatures)?;

	if let (Some(estimator), Some((raw_estimate, estimated))) = (&state.estimator, correction) {
		let actual = decoded.usage.total_tokens as f64;
		estimator.correct(PostHocPolicy::Conservative, raw_estimate, estimated, actual).await;
	}

	info!(model = %req.model, stop_reason = decoded.stop_reason, "gemini request complete");
	Ok(json_response(envelope::build_response(&req.model, decoded.content, decoded.stop_reason, decoded.usage)))
}

async fn handle_openai(
	state: &RelayState,
	headers: &HeaderMap,
	body_len: usize,
	req: &GenericRequest,
	url: &str,
	fallback_key: Option<&str>,
) -> Result<Response> {
	let api_key = resolve_credential(headers, fallback_key).ok_or(Error::MissingCredential)?;

	let payload = openai::encode(req);

	let mut correction = None;
	if let Some(estimator) = &state.estimator {
		let (raw_estimate, estimated) = estimator.admit(body_len).await?;
		debug!(raw_estimate, estimated, "openai admission granted");
		correction = Some((raw_estimate, estimated));
	}

	let auth_header = [("Authorization".to_string(), format!("Bearer {api_key}"))];
	let response = state.client.post_json(url, &auth_header, &payload).await?;

	if response.status.as_u16() != 200 {
		return Err(Error::UpstreamStatus { status: response.status.as_u16(), body: response.body });
	}

	let decoded = openai::decode(&response.body)?;

	if let (Some(estimator), Some((raw_estimate, estimated))) = (&state.estimator, correction) {
		let actual = decoded.usage.total_tokens as f64;
		estimator.correct(PostHocPolicy::Symmetric, raw_estimate, estimated, actual).await;
	}

	info!(model = %req.model, stop_reason = decoded.stop_reason, "openai request complete");
	Ok(json_response(envelope::build_response(&req.model, decoded.content, decoded.stop_reason, decoded.usage)))
}

/// Precedence: `Authorization: Bearer <k>` → `x-api-key` → `fallback` (spec.md §4.6 step 2).
fn resolve_credential(headers: &HeaderMap, fallback: Option<&str>) -> Option<String> {
	if let Some(token) = headers
		.get(header::AUTHORIZATION)
		.and_then(|v| v.to_str().ok())
		.and_then(|v| v.strip_prefix("Bearer "))
	{
		return Some(token.to_string());
	}
	if let Some(key) = headers.get("x-api-key").and_then(|v| v.to_str().ok()) {
		return Some(key.to_string());
	}
	fallback.map(str::to_string)
}

fn json_response(body: Value) -> Response {
	(axum::http::StatusCode::OK, axum::Json(body)).into_response()
}
