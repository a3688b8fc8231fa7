//! Client ⇄ Gemini wire translation (spec.md §4.1.1, §4.1.3): role/turn repair,
//! function-call correlation, thought-signature carriage, malformed-call recovery.

mod decode;
mod encode;
pub mod wire;

pub use decode::{DecodedResponse, decode};
pub use encode::{SKIP_THOUGHT_SIGNATURE, encode};
