use clap::{Parser, Subcommand};

/// `anthropic-relay` — local HTTP relay translating an Anthropic-style chat API to a Gemini
/// or OpenAI-compatible upstream (spec.md §6).
#[derive(Parser, Debug)]
#[command(name = "anthropic-relay", version, about = "Anthropic-to-Gemini/OpenAI relay", long_about = None)]
pub struct CliArgs {
	#[command(subcommand)]
	pub upstream: UpstreamArgs,
}

#[derive(Subcommand, Debug)]
pub enum UpstreamArgs {
	/// Target Google Gemini's `generateContent` REST API.
	Gemini(GeminiArgs),
	/// Target any OpenAI-compatible Chat Completions API.
	Openai(OpenAiArgs),
}

#[derive(clap::Args, Debug)]
pub struct GeminiArgs {
	/// Raise the tracing filter from `info` to `debug`.
	#[arg(long)]
	pub debug: bool,

	/// HTTP/HTTPS proxy for outbound calls to the upstream.
	#[arg(long)]
	pub proxy: Option<String>,

	/// TPM limiter capacity, e.g. `0.9M`, `900,000`, `2000000`.
	#[arg(long)]
	pub tpm: Option<String>,

	/// Enable the Gemini explicit context cache.
	#[arg(long)]
	pub cache: bool,
}

#[derive(clap::Args, Debug)]
pub struct OpenAiArgs {
	/// Raise the tracing filter from `info` to `debug`.
	#[arg(long)]
	pub debug: bool,

	/// HTTP/HTTPS proxy for outbound calls to the upstream.
	#[arg(long)]
	pub proxy: Option<String>,

	/// TPM limiter capacity, e.g. `0.9M`, `900,000`, `2000000`.
	#[arg(long)]
	pub tpm: Option<String>,

	/// The OpenAI-compatible Chat Completions endpoint. Required (clap enforces this,
	/// matching spec.md §6's "non-zero on fatal flag-parse error" for a missing `--url`).
	#[arg(long)]
	pub url: String,

	/// Fallback credential used when the client supplies neither `Authorization` nor
	/// `x-api-key`.
	#[arg(long)]
	pub key: Option<String>,
}
