//! # paramind-core
//!
//! Core types, traits, and abstractions for the paramind capture system.
//!
//! This crate provides the foundational data structures and trait definitions
//! that the other paramind crates depend on.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod source_url;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use source_url::{content_hash, normalize_source_url};
pub use traits::*;

// Vector type shared with pgvector
pub use pgvector::Vector;
