//! Thin outbound HTTP client (spec.md §6.1). One shared `reqwest::Client` per process, an
//! optional HTTP/HTTPS proxy, and a 120s per-request timeout — grounded on the teacher's
//! `WebClient` (`do_post`/`new_req_builder`/`WebResponse{status, body}`), generalized with a
//! `do_delete` for the Context Cache Manager's cleanup calls and without the streaming half
//! (`do_post_stream`/`EventSource`) this relay has no use for (spec.md Non-goals).

use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::Value;

use crate::error::Result;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct UpstreamClient {
	reqwest_client: reqwest::Client,
}

impl UpstreamClient {
	/// Builds the shared client. `proxy` is honored as the transport proxy for every
	/// outbound call when set (spec.md §6).
	pub fn new(proxy: Option<&str>) -> Result<Self> {
		let mut builder = reqwest::Client::builder();
		if let Some(proxy_url) = proxy {
			builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
		}
		let reqwest_client = builder.build()?;
		Ok(Self { reqwest_client })
	}

	pub async fn post_json(&self, url: &str, headers: &[(String, String)], body: &Value) -> Result<WebResponse> {
		let reqwest_res = self.new_req_builder(Method::POST, url, headers).json(body).send().await?;
		WebResponse::from_reqwest_response(reqwest_res).await
	}

	pub async fn delete(&self, url: &str, headers: &[(String, String)]) -> Result<WebResponse> {
		let reqwest_res = self.new_req_builder(Method::DELETE, url, headers).send().await?;
		WebResponse::from_reqwest_response(reqwest_res).await
	}

	fn new_req_builder(&self, method: Method, url: &str, headers: &[(String, String)]) -> RequestBuilder {
		let mut builder = self.reqwest_client.request(method, url).timeout(REQUEST_TIMEOUT);
		for (k, v) in headers {
			builder = builder.header(k, v);
		}
		builder
	}
}

/// An upstream HTTP response, body always normalized to JSON. Gemini and OpenAI-compatible
/// upstreams both return `application/json` on every path this relay exercises (success and
/// error alike); a response whose content-type or body isn't actually JSON is carried as a
/// JSON string rather than rejected outright, so `relay::handler` can still forward a non-200
/// body verbatim (spec.md §4.6 step 8) instead of losing it to a transport-layer error.
#[derive(Debug)]
pub struct WebResponse {
	pub status: StatusCode,
	pub body: Value,
}

impl WebResponse {
	async fn from_reqwest_response(res: reqwest::Response) -> Result<WebResponse> {
		let status = res.status();
		let text = res.text().await?;
		let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
		Ok(WebResponse { status, body })
	}
}
