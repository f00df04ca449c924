//! # paramind-inference
//!
//! LLM inference backends and enrichment services for paramind.
//!
//! This crate provides:
//! - The Ollama HTTP backend implementing the embedding and generation seams
//! - LLM-backed summarization and PARA classification services
//! - A deterministic mock backend for tests (feature `mock`)

pub mod classify;
pub mod ollama;
pub mod summarize;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use classify::LlmClassifier;
pub use ollama::OllamaBackend;
pub use summarize::LlmSummarizer;

// Re-export the seams this crate implements
pub use paramind_core::{Classifier, EmbeddingBackend, GenerationBackend, Summarizer};
