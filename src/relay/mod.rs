//! The HTTP relay: request handling (spec.md §4.6), routing, and graceful shutdown.

mod handler;
mod router;
mod shutdown;
mod state;

pub use router::build;
pub use shutdown::signal as shutdown_signal;
pub use state::{GEMINI_BASE_URL, RelayState, UpstreamTarget};
