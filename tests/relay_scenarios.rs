//! End-to-end scenarios against a real bound relay, stubbing the upstream with `wiremock`
//! (spec.md §8 scenarios S1-S6). Each test binds the relay to an ephemeral port, points its
//! `UpstreamTarget` at a `wiremock::MockServer`, and drives it with a plain `reqwest` client —
//! the same shape of test the teacher's own `tests/mock_tests.rs` runs its adapters through.

use std::sync::Arc;

use anthropic_relay::cache::{ContextCacheManager, SignatureCache};
use anthropic_relay::relay::{RelayState, UpstreamTarget};
use anthropic_relay::throttle::ThrottleGate;
use anthropic_relay::webc::UpstreamClient;
use serde_json::{Value, json};
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn spawn_relay(state: RelayState) -> String {
	let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind ephemeral port");
	let addr = listener.local_addr().expect("local addr");
	let app = anthropic_relay::relay::build(state);
	tokio::spawn(async move {
		axum::serve(listener, app).await.expect("serve");
	});
	format!("http://{addr}")
}

fn gemini_state(mock_uri: &str, context_cache: Option<Arc<ContextCacheManager>>) -> RelayState {
	RelayState {
		upstream: UpstreamTarget::Gemini {
			context_cache,
			throttle: Arc::new(ThrottleGate::new()),
			base_url: format!("{mock_uri}/"),
		},
		client: UpstreamClient::new(None).expect("client"),
		signatures: Arc::new(SignatureCache::new()),
		estimator: None,
	}
}

async fn last_request_body(mock_server: &MockServer, path_suffix: &str) -> Value {
	let requests = mock_server.received_requests().await.expect("recording enabled");
	let request = requests
		.iter()
		.rev()
		.find(|r| r.url.path().ends_with(path_suffix))
		.unwrap_or_else(|| panic!("no recorded request ending in {path_suffix}"));
	serde_json::from_slice(&request.body).expect("request body is JSON")
}

#[tokio::test]
async fn s1_plain_text_round_trip() {
	let mock_server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path_regex(r".*:generateContent$"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"candidates": [{ "content": { "parts": [{ "text": "hello" }] } }],
			"usageMetadata": { "promptTokenCount": 5, "candidatesTokenCount": 1, "totalTokenCount": 6 }
		})))
		.mount(&mock_server)
		.await;

	let base = spawn_relay(gemini_state(&mock_server.uri(), None)).await;

	let response = reqwest::Client::new()
		.post(format!("{base}/v1/messages"))
		.header("x-api-key", "test-key")
		.json(&json!({
			"model": "gemini-3-flash-preview",
			"system": "S",
			"messages": [{ "role": "user", "content": "hi" }]
		}))
		.send()
		.await
		.expect("request succeeds");

	assert_eq!(response.status(), 200);
	let body: Value = response.json().await.expect("json body");
	assert_eq!(body["type"], "message");
	assert_eq!(body["role"], "assistant");
	assert_eq!(body["stop_reason"], "end_turn");
	assert_eq!(body["content"][0]["type"], "text");
	assert_eq!(body["content"][0]["text"], "hello");
	assert_eq!(body["usage"]["input_tokens"], 5);
	assert_eq!(body["usage"]["output_tokens"], 1);

	let sent = last_request_body(&mock_server, ":generateContent").await;
	assert_eq!(sent["systemInstruction"], json!({ "parts": [{ "text": "S" }] }));
	assert_eq!(sent["contents"], json!([{ "role": "user", "parts": [{ "text": "hi" }] }]));
}

#[tokio::test]
async fn s2_tool_round_trip_reattaches_signature_and_resolves_name() {
	let mock_server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path_regex(r".*:generateContent$"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"candidates": [{ "content": { "parts": [
				{ "functionCall": { "name": "bash", "args": { "cmd": "ls" } }, "thoughtSignature": "SIG" }
			] } }]
		})))
		.mount(&mock_server)
		.await;

	let base = spawn_relay(gemini_state(&mock_server.uri(), None)).await;
	let client = reqwest::Client::new();

	// Turn 1: plain user message, relay surfaces the tool_use with its signature.
	let turn1 = client
		.post(format!("{base}/v1/messages"))
		.header("x-api-key", "test-key")
		.json(&json!({ "model": "gemini-3-flash-preview", "messages": [{ "role": "user", "content": "ls please" }] }))
		.send()
		.await
		.expect("turn 1 succeeds")
		.json::<Value>()
		.await
		.expect("turn 1 json");
	assert_eq!(turn1["stop_reason"], "tool_use");
	let tool_use_id = turn1["content"][0]["id"].as_str().expect("tool_use id").to_string();
	assert_eq!(turn1["content"][0]["signature"], "SIG");

	// Turn 2: client echoes the tool_use without its signature, plus the tool_result.
	let turn2_request = json!({
		"model": "gemini-3-flash-preview",
		"messages": [
			{ "role": "user", "content": "ls please" },
			{ "role": "assistant", "content": [{ "type": "tool_use", "id": tool_use_id, "name": "bash", "input": {"cmd": "ls"} }] },
			{ "role": "user", "content": [{ "type": "tool_result", "tool_use_id": tool_use_id, "content": "file1\nfile2" }] },
		]
	});
	client
		.post(format!("{base}/v1/messages"))
		.header("x-api-key", "test-key")
		.json(&turn2_request)
		.send()
		.await
		.expect("turn 2 succeeds");

	let sent = last_request_body(&mock_server, ":generateContent").await;
	let contents = sent["contents"].as_array().expect("contents array");
	assert_eq!(contents.len(), 3);
	assert_eq!(contents[0]["role"], "user");
	assert_eq!(contents[0]["parts"][0]["text"], "ls please");
	assert_eq!(contents[1]["role"], "model");
	assert_eq!(contents[1]["parts"][0]["thoughtSignature"], "SIG");
	assert_eq!(contents[2]["role"], "user");
	assert_eq!(contents[2]["parts"][0]["functionResponse"]["name"], "bash");
	assert_eq!(contents[2]["parts"][0]["functionResponse"]["response"], json!({ "result": "file1\nfile2" }));
}

#[tokio::test]
async fn s3_leading_model_turn_gets_continue_prefix() {
	let mock_server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path_regex(r".*:generateContent$"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"candidates": [{ "content": { "parts": [{ "text": "ok" }] } }]
		})))
		.mount(&mock_server)
		.await;

	let base = spawn_relay(gemini_state(&mock_server.uri(), None)).await;
	reqwest::Client::new()
		.post(format!("{base}/v1/messages"))
		.header("x-api-key", "test-key")
		.json(&json!({ "model": "gemini-3-flash-preview", "messages": [{ "role": "assistant", "content": "resuming" }] }))
		.send()
		.await
		.expect("request succeeds");

	let sent = last_request_body(&mock_server, ":generateContent").await;
	let contents = sent["contents"].as_array().expect("contents array");
	assert_eq!(contents.len(), 2);
	assert_eq!(contents[0]["role"], "user");
	assert_eq!(contents[0]["parts"][0]["text"], "continue");
	assert_eq!(contents[1]["role"], "model");
	assert_eq!(contents[1]["parts"][0]["text"], "resuming");
}

#[tokio::test]
async fn s4_adjacent_user_turns_merge() {
	let mock_server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path_regex(r".*:generateContent$"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"candidates": [{ "content": { "parts": [{ "text": "ok" }] } }]
		})))
		.mount(&mock_server)
		.await;

	let base = spawn_relay(gemini_state(&mock_server.uri(), None)).await;
	reqwest::Client::new()
		.post(format!("{base}/v1/messages"))
		.header("x-api-key", "test-key")
		.json(&json!({
			"model": "gemini-3-flash-preview",
			"messages": [{ "role": "user", "content": "a" }, { "role": "user", "content": "b" }]
		}))
		.send()
		.await
		.expect("request succeeds");

	let sent = last_request_body(&mock_server, ":generateContent").await;
	let contents = sent["contents"].as_array().expect("contents array");
	assert_eq!(contents.len(), 1);
	assert_eq!(contents[0]["parts"][0]["text"], "a");
	assert_eq!(contents[0]["parts"][1]["text"], "b");
}

#[tokio::test]
async fn s5_malformed_function_call_recovers_as_tool_use() {
	let mock_server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path_regex(r".*:generateContent$"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"candidates": [{
				"finishReason": "MALFORMED_FUNCTION_CALL",
				"finishMessage": "Malformed function call: call:web_search({\"q\":\"weather\"})",
				"content": { "parts": [] }
			}]
		})))
		.mount(&mock_server)
		.await;

	let base = spawn_relay(gemini_state(&mock_server.uri(), None)).await;
	let response = reqwest::Client::new()
		.post(format!("{base}/v1/messages"))
		.header("x-api-key", "test-key")
		.json(&json!({ "model": "gemini-3-flash-preview", "messages": [{ "role": "user", "content": "weather?" }] }))
		.send()
		.await
		.expect("request succeeds")
		.json::<Value>()
		.await
		.expect("json body");

	assert_eq!(response["stop_reason"], "tool_use");
	assert_eq!(response["content"][0]["type"], "tool_use");
	assert_eq!(response["content"][0]["name"], "web_search");
	assert_eq!(response["content"][0]["input"], json!({ "q": "weather" }));
}

#[tokio::test]
async fn s6_context_cache_incremental_hit() {
	let mock_server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path_regex(r".*/cachedContents$"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "cachedContents/abc123" })))
		.mount(&mock_server)
		.await;
	Mock::given(method("POST"))
		.and(path_regex(r".*:generateContent$"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"candidates": [{ "content": { "parts": [{ "text": "ok" }] } }]
		})))
		.mount(&mock_server)
		.await;

	let context_cache = Arc::new(ContextCacheManager::new(UpstreamClient::new(None).expect("client"), format!("{}/", mock_server.uri())));
	let base = spawn_relay(gemini_state(&mock_server.uri(), Some(context_cache))).await;
	let client = reqwest::Client::new();

	let conversation = |extra: Option<&str>| {
		let mut messages = vec![
			json!({ "role": "user", "content": "m1" }),
			json!({ "role": "assistant", "content": "m2" }),
			json!({ "role": "user", "content": "m3" }),
		];
		if let Some(text) = extra {
			messages.push(json!({ "role": "user", "content": text }));
		}
		json!({ "model": "gemini-3-flash-preview", "system": "S", "messages": messages })
	};

	// First call: 3-message conversation, no existing cache entry, creates a handle over
	// the first two messages and sends only the third live.
	client
		.post(format!("{base}/v1/messages"))
		.header("x-api-key", "test-key")
		.json(&conversation(None))
		.send()
		.await
		.expect("first call succeeds");

	let create_request = last_request_body(&mock_server, "/cachedContents").await;
	assert_eq!(create_request["contents"].as_array().expect("contents").len(), 2);

	// Second call: same first two messages, one new trailing message. Should hit the cache
	// and send only the delta.
	client
		.post(format!("{base}/v1/messages"))
		.header("x-api-key", "test-key")
		.json(&conversation(Some("m4")))
		.send()
		.await
		.expect("second call succeeds");

	let sent = last_request_body(&mock_server, ":generateContent").await;
	assert_eq!(sent["cachedContent"], "cachedContents/abc123");
	assert!(sent.get("systemInstruction").is_none());
	let contents = sent["contents"].as_array().expect("contents array");
	// `m3` and `m4` are adjacent `user` turns, so `merge_adjacent` collapses them into one
	// turn with two parts (same as `s4_adjacent_user_turns_merge`) before the cache delta
	// is computed.
	assert_eq!(contents.len(), 1);
	assert_eq!(contents[0]["parts"][0]["text"], "m3");
	assert_eq!(contents[0]["parts"][1]["text"], "m4");
}

#[tokio::test]
async fn missing_credential_on_openai_path_returns_401_without_upstream_call() {
	let mock_server = MockServer::start().await;
	Mock::given(method("POST"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
		.mount(&mock_server)
		.await;

	let state = RelayState {
		upstream: UpstreamTarget::OpenAi { url: format!("{}/v1/chat/completions", mock_server.uri()), fallback_key: None },
		client: UpstreamClient::new(None).expect("client"),
		signatures: Arc::new(SignatureCache::new()),
		estimator: None,
	};
	let base = spawn_relay(state).await;

	let response = reqwest::Client::new()
		.post(format!("{base}/v1/messages"))
		.json(&json!({ "model": "gpt-4o-mini", "messages": [{ "role": "user", "content": "hi" }] }))
		.send()
		.await
		.expect("request succeeds");

	assert_eq!(response.status(), 401);
	assert!(mock_server.received_requests().await.expect("recording enabled").is_empty());
}

#[tokio::test]
async fn upstream_error_status_is_forwarded_verbatim() {
	let mock_server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path_regex(r".*:generateContent$"))
		.respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": { "message": "bad request" } })))
		.mount(&mock_server)
		.await;

	let base = spawn_relay(gemini_state(&mock_server.uri(), None)).await;
	let response = reqwest::Client::new()
		.post(format!("{base}/v1/messages"))
		.header("x-api-key", "test-key")
		.json(&json!({ "model": "gemini-3-flash-preview", "messages": [{ "role": "user", "content": "hi" }] }))
		.send()
		.await
		.expect("request succeeds");

	assert_eq!(response.status(), 400);
	let body: Value = response.json().await.expect("json body");
	assert_eq!(body["error"]["message"], "bad request");
}

#[tokio::test]
async fn openai_plain_text_round_trip() {
	let mock_server = MockServer::start().await;
	Mock::given(method("POST"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"choices": [{ "message": { "role": "assistant", "content": "hello there" } }],
			"usage": { "prompt_tokens": 4, "completion_tokens": 2, "total_tokens": 6 }
		})))
		.mount(&mock_server)
		.await;

	let state = RelayState {
		upstream: UpstreamTarget::OpenAi { url: format!("{}/v1/chat/completions", mock_server.uri()), fallback_key: None },
		client: UpstreamClient::new(None).expect("client"),
		signatures: Arc::new(SignatureCache::new()),
		estimator: None,
	};
	let base = spawn_relay(state).await;

	let response = reqwest::Client::new()
		.post(format!("{base}/v1/messages"))
		.header("Authorization", "Bearer test-key")
		.json(&json!({ "model": "gpt-4o-mini", "messages": [{ "role": "user", "content": "hi" }] }))
		.send()
		.await
		.expect("request succeeds");

	assert_eq!(response.status(), 200);
	let body: Value = response.json().await.expect("json body");
	assert_eq!(body["content"][0]["text"], "hello there");
	assert_eq!(body["usage"]["input_tokens"], 4);
	assert_eq!(body["usage"]["output_tokens"], 2);

	let requests = mock_server.received_requests().await.expect("recording enabled");
	let request = requests.last().expect("at least one request");
	assert_eq!(request.headers.get("authorization").expect("auth header").to_str().unwrap(), "Bearer test-key");
}
