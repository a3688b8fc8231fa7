use std::sync::Arc;

use anthropic_relay::cache::{ContextCacheManager, SignatureCache};
use anthropic_relay::config::{CliArgs, RelayConfig, Upstream, BIND_ADDR};
use anthropic_relay::limiter::AdaptiveEstimator;
use anthropic_relay::relay::{self, RelayState, UpstreamTarget, GEMINI_BASE_URL};
use anthropic_relay::throttle::ThrottleGate;
use anthropic_relay::webc::UpstreamClient;
use clap::Parser;

#[tokio::main]
async fn main() -> anthropic_relay::Result<()> {
	let args = CliArgs::parse();
	let config = RelayConfig::from_cli(args)?;

	let filter = if config.debug { "debug" } else { "info" };
	tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
		.init();

	let client = UpstreamClient::new(config.proxy.as_deref())?;
	let estimator = config.tpm.map(|tpm| Arc::new(AdaptiveEstimator::new(tpm)));

	let upstream = match &config.upstream {
		Upstream::Gemini { cache } => {
			let context_cache = cache.then(|| Arc::new(ContextCacheManager::new(client.clone(), GEMINI_BASE_URL.to_string())));
			UpstreamTarget::Gemini { context_cache, throttle: Arc::new(ThrottleGate::new()), base_url: GEMINI_BASE_URL.to_string() }
		}
		Upstream::OpenAi { url, key } => UpstreamTarget::OpenAi { url: url.clone(), fallback_key: key.clone() },
	};

	let state = RelayState { upstream: upstream.clone(), client, signatures: Arc::new(SignatureCache::new()), estimator };

	let listener = tokio::net::TcpListener::bind(BIND_ADDR).await.map_err(|err| anthropic_relay::Error::custom(err))?;
	tracing::info!(addr = BIND_ADDR, "anthropic-relay listening");

	axum::serve(listener, relay::build(state))
		.with_graceful_shutdown(relay::shutdown_signal(upstream))
		.await
		.map_err(|err| anthropic_relay::Error::custom(err))?;

	Ok(())
}
