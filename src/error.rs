//! Crate-wide error type.
//!
//! Follows the teacher's flat, `derive_more::From`-powered enum rather than a
//! `thiserror` derive tree: most variants carry just enough context to build
//! the HTTP disposition in `relay::handler`, and a handful of externals
//! (`reqwest`, `serde_json`) are folded in with `#[from]`.

use derive_more::From;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, From)]
pub enum Error {
	/// Client body is not valid JSON, or does not match the generic request shape.
	InvalidClientJson(String),

	/// No credential could be resolved for an OpenAI-compatible upstream.
	MissingCredential,

	/// A single request's estimated cost exceeds the token bucket capacity outright.
	RequestTooLargeForTpm,

	/// Upstream returned a non-200 status; body is forwarded verbatim by the caller.
	UpstreamStatus { status: u16, body: serde_json::Value },

	/// Upstream returned 200 but with no candidates/choices.
	UpstreamEmpty(&'static str),

	/// Upstream 200 body could not be parsed into the expected shape.
	UpstreamUnparseable(String),

	#[from]
	Json(serde_json::Error),

	#[from]
	Reqwest(reqwest::Error),

	#[from]
	Custom(String),
}

impl Error {
	pub fn custom(msg: impl std::fmt::Display) -> Self {
		Self::Custom(msg.to_string())
	}
}

impl From<&str> for Error {
	fn from(value: &str) -> Self {
		Self::Custom(value.to_string())
	}
}

impl core::fmt::Display for Error {
	fn fmt(&self, fmt: &mut core::fmt::Formatter) -> core::result::Result<(), core::fmt::Error> {
		write!(fmt, "{self:?}")
	}
}

impl std::error::Error for Error {}

/// Maps each variant to the exact HTTP disposition spec.md §7 calls for. `UpstreamStatus`
/// forwards the upstream body verbatim rather than wrapping it, matching "forward status and
/// body verbatim" (spec.md §4.6 step 8, §7).
impl axum::response::IntoResponse for Error {
	fn into_response(self) -> axum::response::Response {
		use axum::Json;
		use axum::http::StatusCode;
		use serde_json::json;

		let (status, body) = match self {
			Error::InvalidClientJson(msg) => (StatusCode::BAD_REQUEST, json!({ "error": format!("Invalid JSON: {msg}") })),
			Error::MissingCredential => (StatusCode::UNAUTHORIZED, json!({ "error": "missing credential" })),
			Error::RequestTooLargeForTpm => (StatusCode::TOO_MANY_REQUESTS, json!({ "error": "Request too large for TPM limit" })),
			Error::UpstreamStatus { status, body } => (StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY), body),
			Error::UpstreamEmpty(which) => (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": format!("upstream returned no {which}") })),
			Error::UpstreamUnparseable(body) => {
				(StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "upstream returned an unparseable response", "body": body }))
			}
			Error::Json(err) => (StatusCode::BAD_REQUEST, json!({ "error": err.to_string() })),
			Error::Reqwest(err) => (StatusCode::BAD_GATEWAY, json!({ "error": err.to_string() })),
			Error::Custom(msg) => (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": msg })),
		};

		(status, Json(body)).into_response()
	}
}
