//! CLI parsing and the resolved relay configuration (spec.md §6 CLI surface). The two
//! upstream "build flavors" the source duplicated as separate binaries are unified here as
//! clap subcommands on one binary, grounded on `ConaryLabs-Mira`'s `backend/src/cli/args.rs`
//! derive style.

mod cli;

pub use cli::{CliArgs, GeminiArgs, OpenAiArgs, UpstreamArgs};

use crate::error::{Error, Result};

/// The resolved upstream target and its path-specific settings.
#[derive(Debug, Clone)]
pub enum Upstream {
	/// `cache`: whether the Context Cache Manager is enabled (`--cache`).
	Gemini { cache: bool },
	/// `url`: the configured OpenAI-compatible endpoint. `key`: an optional fallback
	/// credential used when the client supplies none (spec.md §6 `--key`).
	OpenAi { url: String, key: Option<String> },
}

/// Fully parsed, validated relay configuration (spec.md §3.2 of `SPEC_FULL.md`).
#[derive(Debug, Clone)]
pub struct RelayConfig {
	pub debug: bool,
	pub proxy: Option<String>,
	pub tpm: Option<f64>,
	pub upstream: Upstream,
}

/// Fixed per spec.md §6 — not flag-configurable, matching the source.
pub const BIND_ADDR: &str = "127.0.0.1:6300";

impl RelayConfig {
	pub fn from_cli(args: CliArgs) -> Result<Self> {
		match args.upstream {
			UpstreamArgs::Gemini(g) => Ok(Self {
				debug: g.debug,
				proxy: g.proxy,
				tpm: g.tpm.as_deref().map(parse_tpm).transpose()?,
				upstream: Upstream::Gemini { cache: g.cache },
			}),
			UpstreamArgs::Openai(o) => Ok(Self {
				debug: o.debug,
				proxy: o.proxy,
				tpm: o.tpm.as_deref().map(parse_tpm).transpose()?,
				upstream: Upstream::OpenAi { url: o.url, key: o.key },
			}),
		}
	}
}

/// Parses the `--tpm <spec>` grammar (spec.md §6): strip whitespace and commas; a trailing
/// `M`/`m` multiplies the leading float by 1,000,000; otherwise parse as a plain float.
pub fn parse_tpm(spec: &str) -> Result<f64> {
	let stripped: String = spec.chars().filter(|c| !c.is_whitespace() && *c != ',').collect();
	let (number_part, multiplier) = match stripped.strip_suffix(['M', 'm']) {
		Some(rest) => (rest, 1_000_000.0),
		None => (stripped.as_str(), 1.0),
	};
	let value: f64 = number_part
		.parse()
		.map_err(|_| Error::custom(format!("unparseable --tpm value: {spec:?}")))?;
	Ok(value * multiplier)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_plain_float() {
		assert_eq!(parse_tpm("2000000").unwrap(), 2_000_000.0);
	}

	#[test]
	fn parses_m_suffix() {
		assert_eq!(parse_tpm("0.9M").unwrap(), 900_000.0);
	}

	#[test]
	fn strips_commas_and_whitespace() {
		assert_eq!(parse_tpm("900,000").unwrap(), 900_000.0);
		assert_eq!(parse_tpm(" 5000,000 ").unwrap(), 5_000_000.0);
	}

	#[test]
	fn rejects_garbage() {
		assert!(parse_tpm("not-a-number").is_err());
	}
}
