//! `anthropic_relay` — a local HTTP relay translating an Anthropic-style chat API
//! (`/v1/messages`) to either Google Gemini's `generateContent` REST API or any
//! OpenAI-compatible Chat Completions API.
//!
//! The binary (`src/main.rs`) is a thin CLI/bootstrap layer; everything reusable and
//! independently testable lives here, the way the teacher crate exposes its adapters as a
//! library underneath a thin example/CLI layer.

// region:    --- Modules

pub mod cache;
pub mod chat;
pub mod config;
pub mod error;
pub mod limiter;
pub mod relay;
pub mod throttle;
pub mod translate;
pub mod webc;

pub use error::{Error, Result};

// endregion: --- Modules
