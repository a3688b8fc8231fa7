//! The Message Graph Translator (spec.md §4.1) — bidirectional mapping between the generic
//! client content-block model (`crate::chat`) and each upstream's native wire shape.

pub mod envelope;
pub mod gemini;
pub mod openai;
